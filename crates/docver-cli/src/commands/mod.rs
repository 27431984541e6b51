//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod label;
pub mod options;
pub mod validate;

use docver_core::config::VersioningConfig;
use docver_core::versioning::{CustomFilters, VersioningService};
use std::path::Path;

use crate::error::{CliError, Result};

/// Load and compile a configuration file. The CLI registers no custom
/// filters, so configurations referencing one are rejected.
pub(crate) fn compile(path: &Path) -> Result<(VersioningConfig, VersioningService)> {
    let config = VersioningConfig::from_file(path).map_err(|e| CliError::configuration(path, e))?;
    let service = VersioningService::from_config(&config, &CustomFilters::new())
        .map_err(|e| CliError::configuration(path, e))?;
    Ok((config, service))
}
