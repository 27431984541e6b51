//! `docver label` command implementation

use docver_core::versioning::format_version_label;

use crate::error::Result;

pub fn run(major: u64, minor: u64, checked_out: bool) -> Result<()> {
    println!("{}", format_version_label(major, minor, checked_out));
    Ok(())
}
