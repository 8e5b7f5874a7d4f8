//! Document fetching
//!
//! One blocking GET per call with a whole-request timeout. Redirects are
//! followed by the agent; only the final response status is checked. Bodies
//! are decoded using the charset the response declares.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::FetchConfig;
use crate::error::NetworkError;

/// Source of raw documents for the pipeline
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, NetworkError>;
}

/// Fetcher backed by a `ureq` agent
pub struct HttpFetcher {
    agent: ureq::Agent,
    headers: BTreeMap<String, String>,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        // Status codes are checked by hand so a 404 is a typed error, not a transport one.
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(config.timeout()))
                .user_agent(config.user_agent.as_str())
                .max_redirects(config.max_redirects)
                .http_status_as_error(false)
                .build(),
        );

        Self {
            agent,
            headers: config.headers.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, NetworkError> {
        let mut request = self.agent.get(url);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.call().map_err(|e| NetworkError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "fetched");
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut body = response.into_body();
        let text = body
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_string()
            .map_err(|e| NetworkError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(text)
    }
}
