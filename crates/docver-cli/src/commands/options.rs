//! `docver options` command implementation

use docver_common::VersioningOption;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;

/// Print the options allowed for a document type and lifecycle state
pub fn run(config: &Path, doc_type: &str, state: Option<&str>, json: bool) -> Result<()> {
    let (_, service) = super::compile(config)?;
    let options = service.restrictions().allowed_options(doc_type, state);
    println!("{}", render(&options, json)?);
    Ok(())
}

fn render(options: &BTreeSet<VersioningOption>, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(options)?);
    }
    if options.is_empty() {
        return Ok("(none)".to_string());
    }
    Ok(options
        .iter()
        .map(VersioningOption::as_str)
        .collect::<Vec<_>>()
        .join(" "))
}
