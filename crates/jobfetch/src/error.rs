//! Error types for the batch dispatcher.
//!
//! This module defines the central [`Error`] enum, which captures the fatal
//! conditions that abort a run, and [`RequestFailure`], which describes why a
//! single job index could not be harvested. Request failures never abort a
//! unit or a run; they are absorbed by the dispatcher and only show up as a
//! shorter result set.
//!
//! ## Error Cases
//! - `InvalidPartition`: The configuration yields no usable worker count.
//! - `ChannelError`: The worker pool could not accept or report work.
//! - `PoolSetup`: The worker pool or HTTP client could not be created.
//! - `Persistence`: The output document could not be written.
//! - `Serialization`: The output document could not be encoded.
//! - `Dataset`: A dataset file could not be read, parsed or written.

use std::path::PathBuf;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for fatal dispatcher conditions.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The requested partition is not possible (e.g. zero workers).
    #[error("Invalid partition: {reason}")]
    InvalidPartition { reason: String },

    /// Internal channel send/receive failure between the dispatcher and its
    /// workers.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The worker pool or its shared HTTP client could not be created.
    #[error("Pool setup failed: {reason}")]
    PoolSetup { reason: String },

    /// Writing the output document failed.
    #[error("Failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding a JSON document failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A dataset file was unreadable or malformed.
    #[error("Dataset error ({}): {reason}", path.display())]
    Dataset { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn invalid_partition(reason: impl Into<String>) -> Self {
        Self::InvalidPartition {
            reason: reason.into(),
        }
    }
}

/// Why a single job index produced no identifier.
///
/// A miss (a well-formed response without a usable `jobId`) is *not* a
/// failure and is reported as `Ok(None)` by the fetcher instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// The request did not complete within the per-request timeout.
    #[error("request timed out")]
    Timeout,

    /// The endpoint could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The endpoint answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The response body was not a valid job record.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The run was cancelled before or while this index was in flight.
    #[error("cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for RequestFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
