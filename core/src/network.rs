use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::{Result, VodError};
use crate::CoreConfig;

/// Plain-text GET, the only kind of request this plugin makes.
pub trait HttpFetch {
    fn get_text(&self, url: &str) -> Result<String>;
}

/// reqwest client with the upstream User-Agent and an explicit timeout.
///
/// Owns a current-thread runtime so callers stay synchronous; do not call it
/// from inside another tokio runtime.
pub struct HttpClient {
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpClient {
    pub fn new(cfg: &CoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.timeout_secs.min(10)))
            .build()
            .map_err(|e| VodError::network(&cfg.api_base, format!("could not build HTTP client: {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(Self { client, runtime })
    }

    async fn execute_request(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| request_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(VodError::Http { url: url.to_string(), status: status.as_u16() });
        }
        response.text().await.map_err(|e| request_error(url, e))
    }
}

impl HttpFetch for HttpClient {
    fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        self.runtime.block_on(self.execute_request(url))
    }
}

fn request_error(url: &str, e: reqwest::Error) -> VodError {
    if e.is_timeout() {
        VodError::network(url, "timed out")
    } else {
        VodError::network(url, e.to_string())
    }
}
