//! Output-vs-dataset validation.
//!
//! Compares the identifiers in an [`OutputDocument`] with those in a
//! [`JobDataset`] as multisets: order is irrelevant, duplicates count.

use crate::{JobDataset, OutputDocument, Result};
use std::collections::HashMap;
use std::path::Path;

/// Differences between a harvested output and the source dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Identifiers in the dataset that the output lacks.
    pub missing: Vec<String>,
    /// Identifiers in the output that the dataset lacks (or extra copies).
    pub unexpected: Vec<String>,
}

impl ValidationReport {
    pub fn is_match(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Compares `output` against every identifier in `dataset`.
pub fn validate(output: &OutputDocument, dataset: &JobDataset) -> ValidationReport {
    let mut counts: HashMap<&str, isize> = HashMap::new();
    for id in dataset.identifiers() {
        *counts.entry(id).or_default() += 1;
    }
    for id in &output.jobs {
        *counts.entry(id.as_str()).or_default() -= 1;
    }

    let mut report = ValidationReport::default();
    for (id, count) in counts {
        let target = if count > 0 {
            &mut report.missing
        } else {
            &mut report.unexpected
        };
        target.extend(std::iter::repeat_n(id.to_string(), count.unsigned_abs()));
    }
    report.missing.sort_unstable();
    report.unexpected.sort_unstable();
    report
}

/// Loads both files and runs [`validate`].
///
/// # Errors
///
/// Returns an error if either file cannot be read or parsed.
pub async fn validate_files(
    output_path: impl AsRef<Path>,
    dataset_path: impl AsRef<Path>,
) -> Result<ValidationReport> {
    let output = OutputDocument::load(output_path).await?;
    let dataset = JobDataset::load(dataset_path).await?;
    Ok(validate(&output, &dataset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(ids: &[&str]) -> JobDataset {
        ids.iter()
            .enumerate()
            .map(|(k, id)| (k as u64, id.to_string()))
            .collect()
    }

    fn output(ids: &[&str]) -> OutputDocument {
        OutputDocument::new(ids.iter().map(ToString::to_string).collect::<Vec<_>>())
    }

    #[test]
    fn order_does_not_matter() {
        let report = validate(&output(&["c", "a", "b"]), &dataset(&["a", "b", "c"]));
        assert!(report.is_match());
    }

    #[test]
    fn reports_missing_and_unexpected() {
        let report = validate(&output(&["a", "z", "z"]), &dataset(&["a", "b"]));
        assert_eq!(report.missing, vec!["b"]);
        assert_eq!(report.unexpected, vec!["z", "z"]);
        assert!(!report.is_match());
    }

    #[tokio::test]
    async fn validates_files() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("output.json");
        let dataset_path = dir.path().join("jobs.json");

        let ds = JobDataset::generate(4);
        ds.save(&dataset_path).await.unwrap();
        let mut jobs: Vec<String> = ds.identifiers().map(String::from).collect();
        jobs.reverse();
        crate::write_output(&output_path, &jobs).await.unwrap();

        assert!(validate_files(&output_path, &dataset_path).await.unwrap().is_match());
    }
}
