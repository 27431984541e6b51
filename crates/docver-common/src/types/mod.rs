//! Common types used across docver

use serde::{Deserialize, Serialize};

// ============================================================================
// Versioning Option
// ============================================================================

/// Kind of version bump requested for a save or a check-in.
///
/// Options are ordered by "strength": `None < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersioningOption {
    /// Plain save, no version is created
    None,
    /// Increment the minor number
    Minor,
    /// Increment the major number and reset the minor number
    Major,
}

impl VersioningOption {
    /// All options, in increasing order
    pub const ALL: [VersioningOption; 3] = [
        VersioningOption::None,
        VersioningOption::Minor,
        VersioningOption::Major,
    ];

    /// Configuration / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VersioningOption::None => "NONE",
            VersioningOption::Minor => "MINOR",
            VersioningOption::Major => "MAJOR",
        }
    }

    /// Whether this option creates a version
    pub fn is_bump(&self) -> bool {
        !matches!(self, VersioningOption::None)
    }
}

impl std::fmt::Display for VersioningOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VersioningOption {
    type Err = crate::DocverError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NONE" => Ok(VersioningOption::None),
            "MINOR" => Ok(VersioningOption::Minor),
            "MAJOR" => Ok(VersioningOption::Major),
            _ => Err(crate::DocverError::Config(format!(
                "Invalid versioning option: {}",
                s
            ))),
        }
    }
}

// ============================================================================
// Version State
// ============================================================================

/// Version numbers and checkout flag of a live document.
///
/// A freshly created document is `(0, 0, checked_out = true)`. Check-in bumps
/// the numbers and clears the flag, check-out only sets the flag again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionState {
    pub major: u64,
    pub minor: u64,
    pub checked_out: bool,
}

impl VersionState {
    pub fn new(major: u64, minor: u64, checked_out: bool) -> Self {
        Self {
            major,
            minor,
            checked_out,
        }
    }

    /// State of a document that was just created
    pub fn initial(major: u64, minor: u64) -> Self {
        Self::new(major, minor, true)
    }

    /// Numbers after applying `option`, checkout flag unchanged. Numbers
    /// saturate at `u64::MAX`.
    pub fn bumped(&self, option: VersioningOption) -> Self {
        match option {
            VersioningOption::Major => Self::new(self.major.saturating_add(1), 0, self.checked_out),
            VersioningOption::Minor => {
                Self::new(self.major, self.minor.saturating_add(1), self.checked_out)
            },
            VersioningOption::None => *self,
        }
    }

    /// Same numbers with another checkout flag
    pub fn with_checked_out(&self, checked_out: bool) -> Self {
        Self::new(self.major, self.minor, checked_out)
    }

    pub fn numbers(&self) -> (u64, u64) {
        (self.major, self.minor)
    }
}

impl Default for VersionState {
    fn default() -> Self {
        Self::initial(0, 0)
    }
}

impl std::fmt::Display for VersionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = if self.checked_out {
            "checked out"
        } else {
            "checked in"
        };
        write!(f, "{}.{} ({})", self.major, self.minor, flag)
    }
}

// ============================================================================
// Transitions
// ============================================================================

/// Versioning transitions of a live document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    CheckIn,
    CheckOut,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::CheckIn => write!(f, "check in"),
            Transition::CheckOut => write!(f, "check out"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_option_from_str() {
        assert_eq!("none".parse::<VersioningOption>().unwrap(), VersioningOption::None);
        assert_eq!("Minor".parse::<VersioningOption>().unwrap(), VersioningOption::Minor);
        assert_eq!("MAJOR".parse::<VersioningOption>().unwrap(), VersioningOption::Major);
        assert!("patch".parse::<VersioningOption>().is_err());
    }

    #[test]
    fn test_option_serde_uppercase() {
        let json = serde_json::to_string(&VersioningOption::Minor).unwrap();
        assert_eq!(json, "\"MINOR\"");
        let parsed: VersioningOption = serde_json::from_str("\"MAJOR\"").unwrap();
        assert_eq!(parsed, VersioningOption::Major);
    }

    #[test]
    fn test_option_ordering() {
        assert!(VersioningOption::None < VersioningOption::Minor);
        assert!(VersioningOption::Minor < VersioningOption::Major);
        assert!(!VersioningOption::None.is_bump());
        assert!(VersioningOption::Major.is_bump());
    }

    #[test]
    fn test_state_bump() {
        let state = VersionState::new(1, 5, true);
        assert_eq!(state.bumped(VersioningOption::Major), VersionState::new(2, 0, true));
        assert_eq!(state.bumped(VersioningOption::Minor), VersionState::new(1, 6, true));
        assert_eq!(state.bumped(VersioningOption::None), state);
    }

    #[test]
    fn test_state_bump_saturates() {
        let state = VersionState::new(u64::MAX, u64::MAX, true);
        assert_eq!(state.bumped(VersioningOption::Major), VersionState::new(u64::MAX, 0, true));
        assert_eq!(state.bumped(VersioningOption::Minor), state);
    }

    #[test]
    fn test_state_default_is_checked_out_zero() {
        assert_eq!(VersionState::default(), VersionState::new(0, 0, true));
    }

    proptest! {
        #[test]
        fn bump_never_decreases(major in 0u64..10_000, minor in 0u64..10_000, major_bump in any::<bool>()) {
            let option = if major_bump { VersioningOption::Major } else { VersioningOption::Minor };
            let state = VersionState::new(major, minor, true);
            let next = state.bumped(option);
            prop_assert!(next.numbers() > state.numbers());
        }
    }
}
