//! Worker pool used by the dispatcher.
//!
//! - [`manager`] - the pool itself (`WorkerPool`): spawning, round-robin
//!   dispatch and shutdown.
//! - [`worker`] - the per-worker receive loop.
//! - [`request`] - messages exchanged with workers.

pub mod manager;
pub mod request;
pub mod worker;

pub use manager::WorkerPool;
pub use request::WorkRequest;
