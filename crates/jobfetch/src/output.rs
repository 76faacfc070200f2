//! The output document: `{"jobs": [<jobId>, ...]}`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::path::Path;

/// Serialized form of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDocument {
    #[serde(default)]
    pub jobs: Vec<String>,
}

impl OutputDocument {
    pub fn new(jobs: impl Into<Vec<String>>) -> Self {
        Self { jobs: jobs.into() }
    }

    /// Encodes the document as JSON indented with four spaces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>> {
        to_pretty_json(self)
    }

    /// Reads a document previously written by [`write_output`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] if the file cannot be read and
    /// [`Error::Serialization`] if it is not a valid document.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .map_err(|source| Error::Persistence {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Writes `jobs` as an [`OutputDocument`] to `path`, replacing any existing
/// file.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails and
/// [`Error::Persistence`] if the file cannot be written.
pub async fn write_output(path: impl AsRef<Path>, jobs: &[String]) -> Result<()> {
    let path = path.as_ref();
    let bytes = OutputDocument::new(jobs).to_pretty_json()?;

    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| Error::Persistence {
            path: path.to_path_buf(),
            source,
        })
}
