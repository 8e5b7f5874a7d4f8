//! Result extraction
//!
//! Uses the scraper crate to walk the parsed document, either collecting
//! every visible text string or the elements matching a CSS selector.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ScrapeError;
use crate::request::{Attribute, ScrapeResult, Selection, TEXT_ATTRIBUTE};

/// Maximum snippet length, in characters
pub const SNIPPET_LEN: usize = 100;

/// Selector used when BySelector mode arrives without one
pub const DEFAULT_SELECTOR: &str = "body *";

/// Elements whose text, at any depth, is not page text
const NON_VISIBLE: [&str; 5] = ["script", "style", "template", "rt", "rp"];

/// Parse `html` and extract results from it
pub fn extract_html(
    html: &str,
    selection: &Selection,
    attribute: &Attribute,
) -> Result<Vec<ScrapeResult>, ScrapeError> {
    let document = Html::parse_document(html);
    extract(&document, selection, attribute)
}

/// Extract results from an already parsed document
pub fn extract(
    document: &Html,
    selection: &Selection,
    attribute: &Attribute,
) -> Result<Vec<ScrapeResult>, ScrapeError> {
    let results = match selection {
        Selection::SelectAll => extract_all_text(document),
        Selection::BySelector(selector) => extract_selected(document, selector, attribute)?,
    };
    debug!(count = results.len(), "extracted");
    Ok(results)
}

/// Truncate already trimmed text to the snippet length
pub fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LEN).collect()
}

fn extract_all_text(document: &Html) -> Vec<ScrapeResult> {
    visible_strings(document)
        .enumerate()
        .map(|(i, text)| ScrapeResult {
            index: i + 1,
            value: text.to_string(),
            attribute: TEXT_ATTRIBUTE.to_string(),
            snippet: snippet(text),
        })
        .collect()
}

/// Trimmed, non-empty text nodes in document order
fn visible_strings(document: &Html) -> impl Iterator<Item = &str> {
    document.root_element().descendants().filter_map(|node| {
        let text = node.value().as_text()?;

        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| NON_VISIBLE.contains(&ancestor.value().name()));
        if hidden {
            return None;
        }

        let trimmed = text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

fn extract_selected(
    document: &Html,
    selector_str: &str,
    attribute: &Attribute,
) -> Result<Vec<ScrapeResult>, ScrapeError> {
    let selector_str = match selector_str.trim() {
        "" => DEFAULT_SELECTOR,
        s => s,
    };

    let selector = Selector::parse(selector_str).map_err(|e| ScrapeError::Selector {
        selector: selector_str.to_string(),
        reason: e.to_string(),
    })?;

    let results = document
        .select(&selector)
        .enumerate()
        .map(|(i, element)| {
            let text = element_text(element);
            let value = match attribute {
                Attribute::Text => text.clone(),
                Attribute::Named(name) => element.value().attr(name).unwrap_or_default().to_string(),
            };

            ScrapeResult {
                index: i + 1,
                value,
                attribute: attribute.as_str().to_string(),
                snippet: snippet(&text),
            }
        })
        .collect();

    Ok(results)
}

fn element_text(element: ElementRef<'_>) -> String {
    let text = element.text().collect::<String>();
    text.trim().to_string()
}
