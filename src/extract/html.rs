//! Tag extraction over rendered HTML

use crate::crawler::RenderedPage;
use crate::extract::{Tag, TagBundle, TagCategory, TagRecord};
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};

/// Turns a rendered page into a tag bundle
///
/// Implementations never fail the whole page: a tag that cannot be read is
/// reported and recorded as an empty list.
pub trait TagExtractor: Send + Sync {
    fn extract(&self, page: &RenderedPage, tags: &[Tag]) -> TagBundle;
}

/// Extracts tags from the page's HTML with CSS selectors
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTagExtractor;

impl HtmlTagExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Reads every element of one tag, in document order
    fn extract_tag(document: &Html, tag: Tag) -> Result<Vec<TagRecord>, ExtractionError> {
        let selector = Selector::parse(tag.as_str()).map_err(|e| ExtractionError::Selector {
            tag: tag.to_string(),
            message: e.to_string(),
        })?;

        let records = document
            .select(&selector)
            .map(|element| match tag.category() {
                TagCategory::Text => TagRecord::Text(element_text(&element)),
                TagCategory::Link => TagRecord::Link {
                    text: element_text(&element),
                    href: attribute(&element, "href"),
                },
                TagCategory::Media => TagRecord::Media {
                    src: attribute(&element, "src"),
                    alt: attribute(&element, "alt"),
                },
            })
            .collect();

        Ok(records)
    }
}

impl TagExtractor for HtmlTagExtractor {
    fn extract(&self, page: &RenderedPage, tags: &[Tag]) -> TagBundle {
        let document = Html::parse_document(&page.html);
        let mut bundle = TagBundle::new();

        for &tag in tags {
            let records = match Self::extract_tag(&document, tag) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Extraction failed on {} for <{}>: {}", page.url, tag, e);
                    Vec::new()
                }
            };
            tracing::debug!("Extracted {} <{}> tags from {}", records.len(), tag, page.url);
            bundle.insert(tag, records);
        }

        bundle
    }
}

/// Trimmed text content, `None` when blank
fn element_text(element: &ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn attribute(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element.value().attr(name).map(str::to_string)
}
