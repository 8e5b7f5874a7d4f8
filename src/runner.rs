//! Background execution
//!
//! Every `start` spawns one worker thread and opens one channel. The worker
//! sends exactly one [`Outcome`]; the caller keeps the receiving end in a
//! [`ScrapeHandle`] and checks it without blocking.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::fetch::{Fetch, HttpFetcher};
use crate::pipeline::Pipeline;
use crate::request::{Outcome, ScrapeRequest};

/// Starts scrapes off the calling thread
pub struct AsyncRunner<F = HttpFetcher> {
    pipeline: Arc<Pipeline<F>>,
    next_id: AtomicU64,
}

impl<F: Fetch + 'static> AsyncRunner<F> {
    pub fn new(pipeline: Pipeline<F>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start a scrape and return at once.
    ///
    /// The returned handle receives exactly one outcome. Dropping the handle
    /// abandons interest; the worker still runs to completion or timeout.
    pub fn start(&self, request: ScrapeRequest) -> ScrapeHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel();

        let worker_tx = tx.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let spawned = thread::Builder::new()
            .name(format!("page-scrape-worker-{id}"))
            .spawn(move || {
                debug!(id, url = request.url(), "worker started");
                let outcome = run_guarded(&pipeline, &request);
                debug!(id, success = outcome.is_success(), "worker finished");
                // The receiver is gone only if the caller abandoned the scrape.
                let _ = worker_tx.send(outcome);
            });

        if let Err(e) = spawned {
            warn!(id, "failed to spawn worker: {e}");
            let _ = tx.send(Outcome::Failure(ScrapeError::Worker(format!(
                "failed to spawn worker: {e}"
            ))));
        }

        ScrapeHandle::new(id, rx)
    }
}

impl Default for AsyncRunner<HttpFetcher> {
    fn default() -> Self {
        Self::new(Pipeline::default())
    }
}

fn run_guarded<F: Fetch>(pipeline: &Pipeline<F>, request: &ScrapeRequest) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(request))) {
        Ok(result) => result.into(),
        Err(payload) => Outcome::Failure(ScrapeError::Worker(format!(
            "worker panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Receiving side of one scrape
#[derive(Debug)]
pub struct ScrapeHandle {
    id: u64,
    rx: Receiver<Outcome>,
    delivered: bool,
}

impl ScrapeHandle {
    fn new(id: u64, rx: Receiver<Outcome>) -> Self {
        Self {
            id,
            rx,
            delivered: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the outcome has already been taken
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Take the outcome if it has arrived. Never blocks.
    ///
    /// Yields `Some` exactly once per handle.
    pub fn try_take(&mut self) -> Option<Outcome> {
        if self.delivered {
            return None;
        }

        match self.rx.try_recv() {
            Ok(outcome) => {
                self.delivered = true;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.delivered = true;
                Some(Outcome::Failure(ScrapeError::Worker(
                    "worker exited without delivering an outcome".to_string(),
                )))
            }
        }
    }
}
