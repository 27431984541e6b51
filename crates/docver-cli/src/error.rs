//! Error types for the docver CLI

use docver_common::DocverError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or compiled
    #[error("Invalid versioning configuration '{path}': {source}")]
    Configuration {
        path: String,
        #[source]
        source: DocverError,
    },

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn configuration(path: &std::path::Path, source: DocverError) -> Self {
        CliError::Configuration {
            path: path.display().to_string(),
            source,
        }
    }
}
