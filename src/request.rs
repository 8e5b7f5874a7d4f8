//! Request and result types
//!
//! A [`ScrapeRequest`] is built once, validated by whoever builds it, and then
//! handed to the pipeline by value. Results are created fresh per run and
//! never mutated afterwards.

use serde::{Serialize, Serializer};

use crate::error::{ScrapeError, ValidationError};

/// Attribute name reported for text content
pub const TEXT_ATTRIBUTE: &str = "text";

/// How elements are chosen from the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every non-empty visible text string, in document order
    SelectAll,
    /// Elements matching a CSS selector, in match order
    BySelector(String),
}

/// What value is read from each matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// Trimmed text content
    Text,
    /// Value of the named attribute, empty when absent
    Named(String),
}

impl Attribute {
    pub fn parse(choice: &str) -> Self {
        let choice = choice.trim();
        if choice.is_empty() || choice == TEXT_ATTRIBUTE {
            Attribute::Text
        } else {
            Attribute::Named(choice.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Attribute::Text => TEXT_ATTRIBUTE,
            Attribute::Named(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    url: String,
    selection: Selection,
    attribute: Attribute,
}

impl ScrapeRequest {
    /// Validate raw form input and build a request.
    ///
    /// Fields are trimmed first. `selector` is ignored when `full_page` is set,
    /// and required otherwise.
    pub fn new(
        url: &str,
        selector: Option<&str>,
        attribute: &str,
        full_page: bool,
    ) -> Result<Self, ValidationError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingUrl);
        }

        let parsed = url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ValidationError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }

        let selection = if full_page {
            Selection::SelectAll
        } else {
            match selector.map(str::trim).filter(|s| !s.is_empty()) {
                Some(s) => Selection::BySelector(s.to_string()),
                None => return Err(ValidationError::MissingSelector),
            }
        };

        Ok(Self::unchecked(url, selection, Attribute::parse(attribute)))
    }

    /// Build a request as-is. Nothing is validated.
    pub fn unchecked(url: impl Into<String>, selection: Selection, attribute: Attribute) -> Self {
        Self {
            url: url.into(),
            selection,
            attribute,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }
}

/// One extracted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    /// 1-based position in traversal order
    pub index: usize,
    pub value: String,
    /// Attribute name used, or `"text"`
    pub attribute: String,
    /// Trimmed text of the source node, at most 100 characters
    pub snippet: String,
}

/// The single message a scrape delivers through its channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Outcome {
    Success(Vec<ScrapeResult>),
    Failure(#[serde(serialize_with = "error_message")] ScrapeError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<Vec<ScrapeResult>, ScrapeError> {
        self.into()
    }
}

impl From<Result<Vec<ScrapeResult>, ScrapeError>> for Outcome {
    fn from(result: Result<Vec<ScrapeResult>, ScrapeError>) -> Self {
        match result {
            Ok(results) => Outcome::Success(results),
            Err(e) => Outcome::Failure(e),
        }
    }
}

impl From<Outcome> for Result<Vec<ScrapeResult>, ScrapeError> {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(results) => Ok(results),
            Outcome::Failure(e) => Err(e),
        }
    }
}

fn error_message<S: Serializer>(err: &ScrapeError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}
