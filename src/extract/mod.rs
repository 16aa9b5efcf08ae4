//! Structured tag extraction
//!
//! Tags are a closed set grouped into three categories, each with its own record
//! shape:
//!
//! | Category | Tags | Record |
//! |----------|------|--------|
//! | text | `h1`..`h6`, `p`, `th`, `td`, `li`, `span`, `div` | trimmed text |
//! | link | `a` | `{text, href}` |
//! | media | `img`, `audio`, `video` | `{src, alt}` |

mod html;

pub use html::{HtmlTagExtractor, TagExtractor};

use crate::{ConfigError, ExtractionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A tag the extractor knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    P,
    Th,
    Td,
    Li,
    Span,
    Div,
    A,
    Img,
    Audio,
    Video,
}

/// How a tag's content is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    Text,
    Link,
    Media,
}

impl Tag {
    /// Every supported tag
    pub const ALL: [Tag; 16] = [
        Tag::H1,
        Tag::H2,
        Tag::H3,
        Tag::H4,
        Tag::H5,
        Tag::H6,
        Tag::P,
        Tag::Th,
        Tag::Td,
        Tag::Li,
        Tag::Span,
        Tag::Div,
        Tag::A,
        Tag::Img,
        Tag::Audio,
        Tag::Video,
    ];

    /// Tags extracted when none are configured
    pub const DEFAULTS: [Tag; 7] = [
        Tag::H1,
        Tag::H2,
        Tag::P,
        Tag::A,
        Tag::Img,
        Tag::Span,
        Tag::Div,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::P => "p",
            Self::Th => "th",
            Self::Td => "td",
            Self::Li => "li",
            Self::Span => "span",
            Self::Div => "div",
            Self::A => "a",
            Self::Img => "img",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    pub fn category(&self) -> TagCategory {
        match self {
            Self::A => TagCategory::Link,
            Self::Img | Self::Audio | Self::Video => TagCategory::Media,
            _ => TagCategory::Text,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == name)
            .ok_or_else(|| ConfigError::UnsupportedTag(s.to_string()))
    }
}

/// One extracted element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagRecord {
    Text(Option<String>),
    Link {
        text: Option<String>,
        href: Option<String>,
    },
    Media {
        src: Option<String>,
        alt: Option<String>,
    },
}

#[derive(Deserialize)]
struct LinkFields {
    text: Option<String>,
    href: Option<String>,
}

#[derive(Deserialize)]
struct MediaFields {
    src: Option<String>,
    alt: Option<String>,
}

impl TagRecord {
    /// Decodes a stored record; the shape is chosen by the tag's category
    fn from_value(tag: Tag, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match tag.category() {
            TagCategory::Text => TagRecord::Text(serde_json::from_value(value)?),
            TagCategory::Link => {
                let LinkFields { text, href } = serde_json::from_value(value)?;
                TagRecord::Link { text, href }
            }
            TagCategory::Media => {
                let MediaFields { src, alt } = serde_json::from_value(value)?;
                TagRecord::Media { src, alt }
            }
        })
    }
}

/// Everything extracted from one page, keyed by tag
///
/// Records keep document order. A requested tag that is absent from the page
/// maps to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagBundle {
    records: BTreeMap<Tag, Vec<TagRecord>>,
}

impl TagBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag, records: Vec<TagRecord>) {
        self.records.insert(tag, records);
    }

    pub fn get(&self, tag: Tag) -> Option<&[TagRecord]> {
        self.records.get(&tag).map(Vec::as_slice)
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.records.keys().copied()
    }

    /// Total number of records across all tags
    pub fn element_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ExtractionError> {
        Ok(serde_json::to_string(&self.records)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ExtractionError> {
        let raw: BTreeMap<String, Vec<serde_json::Value>> = serde_json::from_str(json)?;
        let mut bundle = TagBundle::new();
        for (name, values) in raw {
            let tag: Tag = name
                .parse()
                .map_err(|_| ExtractionError::UnknownTag(name.clone()))?;
            let records = values
                .into_iter()
                .map(|value| TagRecord::from_value(tag, value))
                .collect::<Result<Vec<_>, _>>()?;
            bundle.insert(tag, records);
        }
        Ok(bundle)
    }
}
