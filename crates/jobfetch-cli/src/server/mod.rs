//! Demo job server.
//!
//! Answers `GET /<resource_path>/<key>` with `{"jobId": <uuid-or-null>}`
//! after an artificial delay. The dataset is loaded once at startup and
//! handed to every request through axum state; nothing is mutated while the
//! server runs.

pub mod handler;

use crate::config::{DelayRange, ServeConfig};
use axum::{Router, routing::get};
use handler::get_job;
use jobfetch::JobDataset;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<JobDataset>,
    pub delay: DelayRange,
}

impl AppState {
    pub fn new(dataset: JobDataset, delay: DelayRange) -> Self {
        Self {
            dataset: Arc::new(dataset),
            delay,
        }
    }
}

/// Builds the router serving jobs under `resource_path`.
pub fn router(state: AppState, resource_path: &str) -> Router {
    let resource = resource_path.trim_matches('/');
    let route = if resource.is_empty() {
        "/{key}".to_string()
    } else {
        format!("/{resource}/{{key}}")
    };

    Router::new().route(&route, get(get_job)).with_state(state)
}

/// Loads (or generates) the dataset and serves it until `shutdown`
/// resolves.
pub async fn serve(
    config: ServeConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let dataset = JobDataset::load_or_generate(&config.input_file, config.max_jobs).await?;
    tracing::info!(
        "Loaded {} jobs from {}",
        dataset.len(),
        config.input_file.display()
    );

    let app = router(AppState::new(dataset, config.delay), &config.resource_path);
    let listener = TcpListener::bind(&config.addr).await?;

    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting job server on {} with full config: {:#?}",
            config.addr,
            config
        );
    } else {
        tracing::info!("Starting job server on {}", config.addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Job server shut down successfully");
    Ok(())
}
