//! Version label formatting

/// Label of the untouched initial state; it never carries the `+` suffix
const ZERO_LABEL: &str = "0.0";

/// Display label for a version state.
///
/// `"{major}.{minor}"`, with a trailing `+` while the document is checked out
/// and has moved past `0.0`.
///
/// # Examples
/// ```
/// use docver_core::versioning::format_version_label;
///
/// assert_eq!(format_version_label(1, 2, false), "1.2");
/// assert_eq!(format_version_label(1, 2, true), "1.2+");
/// assert_eq!(format_version_label(0, 0, true), "0.0");
/// ```
pub fn format_version_label(major: u64, minor: u64, checked_out: bool) -> String {
    let label = format!("{}.{}", major, minor);
    if checked_out && label != ZERO_LABEL {
        label + "+"
    } else {
        label
    }
}
