//! URL handling module for Site-Scraper
//!
//! This module decides which URLs belong to a crawl (scope and asset
//! filtering), canonicalizes admitted URLs, and derives the names stored
//! alongside sites and pages.

mod classify;
mod naming;
mod normalize;

// Re-export main functions
pub use classify::{in_scope, is_admittable, is_asset, ASSET_EXTENSIONS};
pub use naming::{page_name, site_name, site_root};
pub use normalize::canonicalize;
