//! Fetch then extract

use tracing::{debug, instrument};

use crate::error::ScrapeError;
use crate::extract::extract_html;
use crate::fetch::{Fetch, HttpFetcher};
use crate::request::{ScrapeRequest, ScrapeResult};

/// Runs one request end to end on the calling thread
pub struct Pipeline<F = HttpFetcher> {
    fetcher: F,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch the request's URL and extract from the body.
    ///
    /// Extraction only runs on a successful fetch. Errors from either stage
    /// come back unchanged.
    #[instrument(skip_all, fields(url = request.url()))]
    pub fn run(&self, request: &ScrapeRequest) -> Result<Vec<ScrapeResult>, ScrapeError> {
        let html = self.fetcher.fetch(request.url())?;
        debug!(bytes = html.len(), "document received");
        extract_html(&html, request.selection(), request.attribute())
    }
}

impl Default for Pipeline<HttpFetcher> {
    fn default() -> Self {
        Self::new(HttpFetcher::default())
    }
}
