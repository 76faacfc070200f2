//! Job dataset served by the demo endpoint.
//!
//! A dataset maps integer job keys to identifier strings and is stored as a
//! JSON object (`{"0": "<uuid>", "1": "<uuid>", ...}`). It is loaded once and
//! never mutated afterwards; servers share it behind an
//! [`Arc`](std::sync::Arc).

use crate::{Error, Result, output::to_pretty_json};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Immutable `job key -> identifier` lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDataset {
    entries: BTreeMap<u64, String>,
}

impl JobDataset {
    /// Generates `max_jobs` entries keyed `0..max_jobs`, each with a fresh
    /// random (v4) UUID.
    pub fn generate(max_jobs: u64) -> Self {
        let entries = (0..max_jobs)
            .map(|key| (key, Uuid::new_v4().to_string()))
            .collect();
        Self { entries }
    }

    /// Reads a dataset from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] if the file cannot be read or is not a JSON
    /// object of integer keys to strings.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| dataset_error(path, e))?;
        let entries = serde_json::from_slice(&raw).map_err(|e| dataset_error(path, e))?;
        Ok(Self { entries })
    }

    /// Writes the dataset as a JSON object indented with four spaces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] if the file cannot be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = to_pretty_json(&self.entries)?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| dataset_error(path, e))
    }

    /// Loads the dataset at `path`, generating and saving `max_jobs` entries
    /// first if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dataset`] on any I/O or format failure.
    pub async fn load_or_generate(path: impl AsRef<Path>, max_jobs: u64) -> Result<Self> {
        let path = path.as_ref();
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| dataset_error(path, e))?;

        if exists {
            return Self::load(path).await;
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Generating {max_jobs} jobs into {}", path.display());

        let dataset = Self::generate(max_jobs);
        dataset.save(path).await?;
        Ok(dataset)
    }

    /// Looks up the identifier for a raw key as it appears in a request path.
    ///
    /// Keys that are not non-negative integers never match.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let key: u64 = key.parse().ok()?;
        self.entries.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All identifiers, in key order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }
}

impl FromIterator<(u64, String)> for JobDataset {
    fn from_iter<I: IntoIterator<Item = (u64, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn dataset_error(path: &Path, err: impl core::fmt::Display) -> Error {
    Error::Dataset {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_identifiers_are_unique() {
        let dataset = JobDataset::generate(500);
        assert_eq!(dataset.len(), 500);
        let unique: HashSet<&str> = dataset.identifiers().collect();
        assert_eq!(unique.len(), 500);
    }

    #[test]
    fn lookup_by_path_key() {
        let dataset: JobDataset = [(0, "a".to_string()), (7, "b".to_string())]
            .into_iter()
            .collect();
        assert_eq!(dataset.lookup("7"), Some("b"));
        assert_eq!(dataset.lookup("1"), None);
        assert_eq!(dataset.lookup("-1"), None);
        assert_eq!(dataset.lookup("abc"), None);
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobDetails.json");

        let dataset = JobDataset::generate(12);
        dataset.save(&path).await.unwrap();
        assert_eq!(JobDataset::load(&path).await.unwrap(), dataset);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("{\n    \"0\": \""));
    }

    #[tokio::test]
    async fn load_or_generate_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let first = JobDataset::load_or_generate(&path, 5).await.unwrap();
        assert!(path.exists());

        // Second call reuses the file rather than regenerating.
        let second = JobDataset::load_or_generate(&path, 99).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_file_is_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"zero": "x"}"#).unwrap();

        assert!(matches!(
            JobDataset::load(&path).await,
            Err(Error::Dataset { .. })
        ));
    }
}
