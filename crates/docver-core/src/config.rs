//! Versioning configuration
//!
//! Contributions are declared in TOML:
//!
//! ```toml
//! [[policies]]
//! id = "notes-minor"
//! order = 10
//! increment = "MINOR"
//! filters = ["notes"]
//!
//! [[filters]]
//! id = "notes"
//! types = ["Note"]
//! condition = "currentDocument.dc.title != previousDocument.dc.title"
//!
//! [[restrictions]]
//! type = "File"
//! lifecycle_state = "approved"
//! options = ["MAJOR"]
//!
//! [orphan_removal]
//! types = ["File"]
//! ```

use anyhow::Context;
use docver_common::{DocverError, Result, VersioningOption};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::versioning::expression::Condition;
use crate::versioning::policy::InitialState;
use crate::versioning::restriction::ANY;

/// Environment variable naming the configuration file read by [`VersioningConfig::load`]
pub const CONFIG_PATH_ENV: &str = "DOCVER_VERSIONING_CONFIG";

fn any() -> String {
    ANY.to_string()
}

/// All versioning contributions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    pub policies: Vec<PolicyConfig>,
    pub filters: Vec<FilterConfig>,
    pub restrictions: Vec<RestrictionConfig>,
    pub orphan_removal: OrphanRemovalConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub id: String,
    pub order: i32,
    pub before_update: bool,
    pub increment: Option<VersioningOption>,
    pub initial_state: Option<InitialState>,
    /// Filter ids, all of which must match
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub id: String,
    pub types: Vec<String>,
    pub facets: Vec<String>,
    pub schemas: Vec<String>,
    pub condition: Option<String>,
    /// Name of a filter registered in code instead of declarative criteria
    pub custom: Option<String>,
}

impl FilterConfig {
    fn is_declarative(&self) -> bool {
        !self.types.is_empty()
            || !self.facets.is_empty()
            || !self.schemas.is_empty()
            || self.condition.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictionConfig {
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default = "any")]
    pub lifecycle_state: String,
    #[serde(default)]
    pub options: Vec<VersioningOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrphanRemovalConfig {
    /// Only purge orphan versions of these types; every type when empty
    pub types: Vec<String>,
}

impl VersioningConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from the file named by `DOCVER_VERSIONING_CONFIG`, if any
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let config = Self::from_file(&path)
                    .with_context(|| format!("Failed to load versioning configuration from {path}"))?;
                info!(path = %path, "Loaded versioning configuration");
                config
            },
            _ => Self::default(),
        };

        config.validate().context("Invalid versioning configuration")?;
        Ok(config)
    }

    /// Reject inconsistent contributions
    pub fn validate(&self) -> Result<()> {
        let mut filter_ids = HashSet::new();
        for filter in &self.filters {
            if filter.id.trim().is_empty() {
                return Err(DocverError::config("Filter id cannot be empty"));
            }
            if !filter_ids.insert(filter.id.as_str()) {
                return Err(DocverError::config(format!("Duplicate filter id '{}'", filter.id)));
            }
            match (&filter.custom, filter.is_declarative()) {
                (Some(_), true) => {
                    return Err(DocverError::config(format!(
                        "Filter '{}' cannot combine a custom filter with declarative criteria",
                        filter.id
                    )));
                },
                (None, false) => {
                    return Err(DocverError::config(format!(
                        "Filter '{}' has no criteria",
                        filter.id
                    )));
                },
                _ => {},
            }
            if let Some(condition) = &filter.condition {
                Condition::parse(condition)?;
            }
        }

        let mut policy_ids = HashSet::new();
        for policy in &self.policies {
            if policy.id.trim().is_empty() {
                return Err(DocverError::config("Policy id cannot be empty"));
            }
            if !policy_ids.insert(policy.id.as_str()) {
                return Err(DocverError::config(format!("Duplicate policy id '{}'", policy.id)));
            }
            if let Some(unknown) = policy.filters.iter().find(|id| !filter_ids.contains(id.as_str())) {
                return Err(DocverError::config(format!(
                    "Policy '{}' references unknown filter '{}'",
                    policy.id, unknown
                )));
            }
            if policy.increment.is_none() && policy.initial_state.is_none() {
                warn!(policy = %policy.id, "Policy has neither an increment nor an initial state");
            }
        }

        for restriction in &self.restrictions {
            if restriction.doc_type.trim().is_empty() {
                return Err(DocverError::config("Restriction type cannot be empty"));
            }
        }

        Ok(())
    }
}
