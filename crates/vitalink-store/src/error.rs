//! Store error types.

use thiserror::Error;

/// Errors raised by the file-backed stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure while reading or rewriting the backing file.
    #[error("Store I/O failed at {path}: {source}")]
    Io {
        /// The backing file involved
        path: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A line in the backing file or an entry could not be (de)serialized.
    #[error("Store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    /// The mutex guarding the store was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
