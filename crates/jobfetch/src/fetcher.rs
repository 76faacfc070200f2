//! Per-request execution.
//!
//! A [`JobFetcher`] resolves one job index to an optional identifier. The
//! dispatcher only depends on this trait, which keeps the HTTP transport
//! swappable in tests.

use crate::{RequestFailure, Result};
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// The JSON body exchanged with the job endpoint: `{"jobId": <string|null>}`.
///
/// `jobId` may be missing or `null`; both are treated as a miss.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "jobId", default)]
    pub job_id: Option<String>,
}

/// Resolves a single job index to its identifier.
///
/// Implementations must be cheap to share across workers; the dispatcher
/// wraps them in an [`Arc`](std::sync::Arc) and calls `fetch` concurrently
/// from every worker.
pub trait JobFetcher: Send + Sync + 'static {
    /// Fetches the identifier for `index`.
    ///
    /// Returns `Ok(None)` for a miss, i.e. a well-formed response without a
    /// usable identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestFailure`] when the request times out, cannot
    /// connect, answers with a non-2xx status, or returns a malformed body.
    fn fetch(
        &self,
        index: usize,
    ) -> impl Future<Output = core::result::Result<Option<String>, RequestFailure>> + Send;
}

/// Builds the endpoint base URL from its parts, e.g.
/// `http://127.0.0.1:8000/getjobdetails`.
pub fn endpoint_url(host: &str, port: u16, resource_path: &str) -> String {
    let resource = resource_path.trim_matches('/');
    if resource.is_empty() {
        format!("http://{host}:{port}")
    } else {
        format!("http://{host}:{port}/{resource}")
    }
}

/// [`JobFetcher`] backed by a shared [`reqwest::Client`].
///
/// Each call issues `GET <base_url>/<index>` with the per-request timeout
/// applied independently.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`Error::PoolSetup`](crate::Error::PoolSetup) if the
    /// underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::Error::PoolSetup {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url_for(&self, index: usize) -> String {
        format!("{}/{index}", self.base_url)
    }
}

impl JobFetcher for HttpFetcher {
    async fn fetch(&self, index: usize) -> core::result::Result<Option<String>, RequestFailure> {
        let response = self
            .client
            .get(self.url_for(index))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let record: JobRecord = response.json().await?;
        Ok(record.job_id)
    }
}
