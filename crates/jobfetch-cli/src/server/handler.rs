use super::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use jobfetch::JobRecord;

/// Responds with the identifier stored under `key`, or `{"jobId": null}` if
/// the dataset has none, after sleeping for a random delay.
#[tracing::instrument(level = "debug", skip(state))]
pub async fn get_job(State(state): State<AppState>, Path(key): Path<String>) -> Json<JobRecord> {
    let delay = state.delay.sample();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    Json(JobRecord {
        job_id: state.dataset.lookup(&key).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DelayRange;
    use jobfetch::JobDataset;

    fn state() -> AppState {
        let dataset: JobDataset = [(0, "first".to_string()), (1, "second".to_string())]
            .into_iter()
            .collect();
        AppState::new(dataset, DelayRange::none())
    }

    #[tokio::test]
    async fn known_key_returns_identifier() {
        let Json(record) = get_job(State(state()), Path("1".to_string())).await;
        assert_eq!(record.job_id.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn unknown_key_returns_null() {
        let Json(record) = get_job(State(state()), Path("42".to_string())).await;
        assert_eq!(record.job_id, None);

        let body = serde_json::to_string(&record).unwrap();
        assert_eq!(body, r#"{"jobId":null}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn applies_artificial_delay() {
        let mut state = state();
        state.delay = DelayRange::new(2.0, 2.0).unwrap();

        let start = tokio::time::Instant::now();
        let _ = get_job(State(state), Path("0".to_string())).await;
        assert!(start.elapsed() >= core::time::Duration::from_secs(2));
    }
}
