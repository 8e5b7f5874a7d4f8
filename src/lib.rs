//! Page scraper core
//!
//! Fetches one HTML document and extracts data from it without blocking the
//! caller's thread:
//! - Fetcher: blocking HTTP GET via ureq
//! - Extractor: CSS selectors or all visible text via scraper
//! - Pipeline: fetch then extract
//! - AsyncRunner: one worker thread and one channel per scrape
//! - Poller / ControlLoop: fixed-interval, non-blocking checks from the control thread

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod poller;
pub mod request;
pub mod runner;

pub use config::FetchConfig;
pub use error::{NetworkError, ScrapeError, ValidationError};
pub use extract::{extract, extract_html};
pub use fetch::{Fetch, HttpFetcher};
pub use pipeline::Pipeline;
pub use poller::{ControlLoop, PollStatus, Poller};
pub use request::{Attribute, Outcome, ScrapeRequest, ScrapeResult, Selection};
pub use runner::{AsyncRunner, ScrapeHandle};

/// Validate shell input and start a scrape on `runner`.
///
/// The handle yields the outcome through [`ScrapeHandle::try_take`].
pub fn start_scrape<F: Fetch + 'static>(
    runner: &AsyncRunner<F>,
    url: &str,
    selector: Option<&str>,
    attribute: &str,
    full_page: bool,
) -> Result<ScrapeHandle, ValidationError> {
    let request = ScrapeRequest::new(url, selector, attribute, full_page)?;
    Ok(runner.start(request))
}
