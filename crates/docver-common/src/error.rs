//! Error types for docver

use thiserror::Error;
use uuid::Uuid;

use crate::types::{Transition, VersionState, VersioningOption};

/// Result type alias for docver operations
pub type Result<T> = std::result::Result<T, DocverError>;

/// Lifecycle states are optional on documents; the messages print `null`
/// for documents without one.
fn state_label(state: &Option<String>) -> &str {
    state.as_deref().unwrap_or("null")
}

/// Main error type for docver
#[derive(Error, Debug)]
pub enum DocverError {
    #[error(
        "Versioning option={option} is not allowed by the configuration for type={doc_type}/lifeCycleState={}",
        state_label(.lifecycle_state)
    )]
    VersioningRestricted {
        option: VersioningOption,
        doc_type: String,
        lifecycle_state: Option<String>,
    },

    #[error(
        "Versioning configuration restricts documents with type={doc_type}/lifeCycleState={} must be versioned for each updates",
        state_label(.lifecycle_state)
    )]
    VersioningRequired {
        doc_type: String,
        lifecycle_state: Option<String>,
    },

    #[error("Cannot {transition} document {document_id}: document is {state}")]
    VersioningState {
        transition: Transition,
        document_id: Uuid,
        state: VersionState,
    },

    #[error("Versioning option={0} cannot be used for an explicit check-in")]
    InvalidCheckInOption(VersioningOption),

    #[error("Invalid condition expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    #[error("Version not found: {0}")]
    VersionNotFound(Uuid),

    #[error("Proxy not found: {0}")]
    ProxyNotFound(Uuid),

    #[error("Version {version_id} is still referenced by proxy {proxy_id}")]
    VersionReferenced { version_id: Uuid, proxy_id: Uuid },

    #[error("Version {version_id} is the base version of checked-in document {document_id}")]
    VersionInUse { version_id: Uuid, document_id: Uuid },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocverError {
    pub fn config(message: impl Into<String>) -> Self {
        DocverError::Config(message.into())
    }

    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        DocverError::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Errors caused by the caller asking for something the configuration forbids
    pub fn is_restriction(&self) -> bool {
        matches!(
            self,
            DocverError::VersioningRestricted { .. } | DocverError::VersioningRequired { .. }
        )
    }
}
