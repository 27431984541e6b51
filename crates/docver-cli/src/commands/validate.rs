//! `docver validate` command implementation

use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Compile the configuration and print a summary
pub fn run(file: &Path) -> Result<()> {
    let (config, service) = super::compile(file)?;
    info!(path = %file.display(), "Configuration compiled");

    println!("Configuration OK: {}", file.display());
    println!("  Policies:     {}", service.policies().len());
    println!("  Filters:      {}", config.filters.len());
    println!("  Restrictions: {}", service.restrictions().rules().len());
    if config.orphan_removal.types.is_empty() {
        println!("  Orphan removal: all types");
    } else {
        println!("  Orphan removal: {}", config.orphan_removal.types.join(", "));
    }
    Ok(())
}
