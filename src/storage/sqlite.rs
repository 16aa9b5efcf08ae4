//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::extract::TagBundle;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PageRecord, PageVisit, SiteRecord};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// How long a session waits on another session's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite storage backend
///
/// Each instance owns one connection. Workers open their own instance on the
/// same database file; WAL mode lets them write independently.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path` and returns a new session
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn upsert_site(&mut self, base_url: &str, name: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let id = self.conn.query_row(
            "INSERT INTO sites (base_url, name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(base_url) DO UPDATE SET name = excluded.name
             RETURNING id",
            params![base_url, name, now],
            |row| row.get(0),
        )?;
        tracing::debug!("Site saved - ID: {}, base URL: {}", id, base_url);
        Ok(id)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.conn
            .query_row(
                "SELECT id, base_url, name, created_at FROM sites WHERE id = ?1",
                params![site_id],
                site_from_row,
            )
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn find_site(&self, base_url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                "SELECT id, base_url, name, created_at FROM sites WHERE base_url = ?1",
                params![base_url],
                site_from_row,
            )
            .optional()?;

        Ok(site)
    }

    fn count_sites(&self) -> StorageResult<u64> {
        count(&self.conn, "SELECT COUNT(*) FROM sites")
    }

    // ===== Link Management =====

    fn insert_link_if_absent(&mut self, url: &str, site_id: i64) -> StorageResult<()> {
        insert_link(&self.conn, url, site_id)
    }

    fn list_links(&self, site_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM links WHERE site_id = ?1 ORDER BY id")?;

        let links = stmt
            .query_map(params![site_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        tracing::debug!("Retrieved {} links for site {}", links.len(), site_id);
        Ok(links)
    }

    fn count_links(&self) -> StorageResult<u64> {
        count(&self.conn, "SELECT COUNT(*) FROM links")
    }

    // ===== Page Management =====

    fn upsert_page(
        &mut self,
        name: &str,
        url: &str,
        title: Option<&str>,
        site_id: i64,
    ) -> StorageResult<i64> {
        upsert_page(&self.conn, name, url, title, site_id)
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                "SELECT id, name, url, title, site_id FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok(PageRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        url: row.get(2)?,
                        title: row.get(3)?,
                        site_id: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(page)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        count(&self.conn, "SELECT COUNT(*) FROM pages")
    }

    // ===== Tag Bundles =====

    fn insert_tag_bundle(&mut self, page_id: i64, bundle: &TagBundle) -> StorageResult<()> {
        insert_tag_bundle(&self.conn, page_id, bundle)
    }

    fn get_tag_bundle(&self, page_id: i64) -> StorageResult<Option<TagBundle>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM tag_bundles WHERE page_id = ?1",
                params![page_id],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|json| {
                TagBundle::from_json(&json).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }

    fn count_tag_bundles(&self) -> StorageResult<u64> {
        count(&self.conn, "SELECT COUNT(*) FROM tag_bundles")
    }

    // ===== Page Visits =====

    fn persist_visit(&mut self, visit: &PageVisit<'_>) -> StorageResult<i64> {
        // Immediate: take the write lock up front so the busy timeout applies
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        insert_link(&tx, visit.url, visit.site_id)?;
        let page_id = upsert_page(&tx, visit.name, visit.url, visit.title, visit.site_id)?;
        insert_tag_bundle(&tx, page_id, visit.bundle)?;

        tx.commit()?;
        Ok(page_id)
    }
}

fn site_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SiteRecord> {
    Ok(SiteRecord {
        id: row.get(0)?,
        base_url: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn count(conn: &Connection, sql: &str) -> StorageResult<u64> {
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count as u64)
}

fn insert_link(conn: &Connection, url: &str, site_id: i64) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO links (url, site_id) VALUES (?1, ?2) ON CONFLICT(url) DO NOTHING",
        params![url, site_id],
    )?;
    Ok(())
}

fn upsert_page(
    conn: &Connection,
    name: &str,
    url: &str,
    title: Option<&str>,
    site_id: i64,
) -> StorageResult<i64> {
    let id = conn.query_row(
        "INSERT INTO pages (name, url, title, site_id) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(url) DO UPDATE SET title = excluded.title, site_id = excluded.site_id
         RETURNING id",
        params![name, url, title, site_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn insert_tag_bundle(conn: &Connection, page_id: i64, bundle: &TagBundle) -> StorageResult<()> {
    let payload = bundle
        .to_json()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO tag_bundles (page_id, payload, created_at) VALUES (?1, ?2, ?3)",
        params![page_id, payload, now],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(format!(
                "page {} already has a tag bundle",
                page_id
            ))
        }
        other => StorageError::Sqlite(other),
    })?;

    Ok(())
}
