#![doc = include_str!("../README.md")]

mod dataset;
mod dispatch;
mod error;
mod fetcher;
mod output;
mod partition;
mod plan;
pub mod pool;
mod validate;

pub use crate::dataset::*;
pub use crate::dispatch::*;
pub use crate::error::*;
pub use crate::fetcher::*;
pub use crate::output::{OutputDocument, write_output};
pub use crate::partition::*;
pub use crate::plan::*;
pub use crate::validate::*;
// Re-exported so callers can cancel a run without depending on `tokio-util`.
pub use tokio_util::sync::CancellationToken;
