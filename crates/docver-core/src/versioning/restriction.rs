//! Versioning restrictions
//!
//! A restriction rule limits the options a save may use for documents of a
//! given type in a given lifecycle state. Rules are scanned in contribution
//! order and the **last** matching rule wins, so a later, more specific
//! contribution can reopen what an earlier broad rule closed.

use docver_common::{DocverError, Result, VersioningOption};
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::RestrictionConfig;
use crate::document::Document;

/// Wildcard accepted for both document types and lifecycle states
pub const ANY: &str = "*";

/// Name matcher with a wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Any,
    Exact(String),
}

impl Matcher {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            ANY => Matcher::Any,
            other => Matcher::Exact(other.to_string()),
        }
    }

    /// `None` (no lifecycle state) only matches the wildcard
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Exact(expected) => value == Some(expected.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionRule {
    pub doc_type: Matcher,
    pub lifecycle_state: Matcher,
    pub options: BTreeSet<VersioningOption>,
}

impl RestrictionRule {
    pub fn new(doc_type: &str, lifecycle_state: &str, options: &[VersioningOption]) -> Self {
        Self {
            doc_type: Matcher::parse(doc_type),
            lifecycle_state: Matcher::parse(lifecycle_state),
            options: options.iter().copied().collect(),
        }
    }

    fn matches(&self, doc_type: &str, lifecycle_state: Option<&str>) -> bool {
        self.doc_type.matches(Some(doc_type)) && self.lifecycle_state.matches(lifecycle_state)
    }
}

impl From<&RestrictionConfig> for RestrictionRule {
    fn from(config: &RestrictionConfig) -> Self {
        Self::new(&config.doc_type, &config.lifecycle_state, &config.options)
    }
}

/// Ordered restriction rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersioningRestrictions {
    rules: Vec<RestrictionRule>,
}

impl VersioningRestrictions {
    pub fn new(rules: Vec<RestrictionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RestrictionRule] {
        &self.rules
    }

    /// Options allowed for a type/lifecycle pair; every option when no rule matches
    pub fn allowed_options(
        &self,
        doc_type: &str,
        lifecycle_state: Option<&str>,
    ) -> BTreeSet<VersioningOption> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(doc_type, lifecycle_state))
            .map(|rule| rule.options.clone())
            .unwrap_or_else(|| VersioningOption::ALL.into_iter().collect())
    }

    /// Options a save of `doc` may use. Non-versionable documents only get NONE.
    pub fn save_options(&self, doc: &Document) -> BTreeSet<VersioningOption> {
        if !doc.is_versionable() {
            return BTreeSet::from([VersioningOption::None]);
        }
        self.allowed_options(&doc.doc_type, doc.lifecycle_state.as_deref())
    }

    /// Fail unless `option` is allowed for `doc`
    pub fn check(&self, doc: &Document, option: VersioningOption) -> Result<()> {
        if self.save_options(doc).contains(&option) {
            return Ok(());
        }
        debug!(
            document_id = %doc.id,
            doc_type = %doc.doc_type,
            lifecycle_state = ?doc.lifecycle_state,
            option = %option,
            "Versioning option rejected by restrictions"
        );
        Err(DocverError::VersioningRestricted {
            option,
            doc_type: doc.doc_type.clone(),
            lifecycle_state: doc.lifecycle_state.clone(),
        })
    }

    /// Effective option of a save that did not ask for one.
    ///
    /// NONE when it is allowed or when the rule allows nothing at all; an
    /// error when the configuration requires every update to be versioned.
    pub fn unrequested_option(&self, doc: &Document) -> Result<VersioningOption> {
        let options = self.save_options(doc);
        if options.is_empty() || options.contains(&VersioningOption::None) {
            Ok(VersioningOption::None)
        } else {
            Err(DocverError::VersioningRequired {
                doc_type: doc.doc_type.clone(),
                lifecycle_state: doc.lifecycle_state.clone(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use docver_common::VersioningOption::{Major, Minor, None as NoBump};

    fn set(options: &[VersioningOption]) -> BTreeSet<VersioningOption> {
        options.iter().copied().collect()
    }

    #[test]
    fn test_no_rules_allows_everything() {
        let restrictions = VersioningRestrictions::default();
        assert_eq!(
            restrictions.allowed_options("File", Some("project")),
            set(&[NoBump, Minor, Major])
        );
    }

    #[test]
    fn test_exact_and_wildcard_matching() {
        let restrictions = VersioningRestrictions::new(vec![
            RestrictionRule::new("*", "*", &[NoBump, Minor]),
            RestrictionRule::new("File", "approved", &[Major]),
        ]);
        assert_eq!(restrictions.allowed_options("File", Some("approved")), set(&[Major]));
        assert_eq!(restrictions.allowed_options("File", Some("project")), set(&[NoBump, Minor]));
        assert_eq!(restrictions.allowed_options("Note", None), set(&[NoBump, Minor]));
    }

    #[test]
    fn test_last_match_wins_reinit() {
        let restrictions = VersioningRestrictions::new(vec![
            RestrictionRule::new("*", "*", &[Major]),
            RestrictionRule::new("Note", "*", &[NoBump, Minor, Major]),
        ]);
        assert_eq!(restrictions.allowed_options("Note", Some("project")), set(&[NoBump, Minor, Major]));
        assert_eq!(restrictions.allowed_options("File", Some("project")), set(&[Major]));

        // A broad rule contributed later overrides the specific one again
        let restrictions = VersioningRestrictions::new(vec![
            RestrictionRule::new("Note", "*", &[NoBump, Minor, Major]),
            RestrictionRule::new("*", "*", &[Major]),
        ]);
        assert_eq!(restrictions.allowed_options("Note", Some("project")), set(&[Major]));
    }

    #[test]
    fn test_exact_lifecycle_does_not_match_missing_state() {
        let restrictions =
            VersioningRestrictions::new(vec![RestrictionRule::new("File", "project", &[Major])]);
        assert_eq!(restrictions.allowed_options("File", None).len(), 3);
    }

    #[test]
    fn test_check_reports_type_and_state() {
        let restrictions =
            VersioningRestrictions::new(vec![RestrictionRule::new("File", "*", &[Major])]);
        let doc = Document::new("f", "File");
        assert!(restrictions.check(&doc, Major).is_ok());

        let err = restrictions.check(&doc, Minor).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Versioning option=MINOR is not allowed by the configuration for type=File/lifeCycleState=project"
        );
        assert!(matches!(
            restrictions.check(&doc, NoBump),
            Err(DocverError::VersioningRestricted { option: NoBump, .. })
        ));
    }

    #[test]
    fn test_non_versionable_only_allows_none() {
        let restrictions = VersioningRestrictions::default();
        let doc = Document::new("folder", "Folder").without_facet(crate::document::FACET_VERSIONABLE);
        assert_eq!(restrictions.save_options(&doc), set(&[NoBump]));
        assert!(restrictions.check(&doc, Minor).is_err());
    }

    #[test]
    fn test_unrequested_option() {
        let doc = Document::new("f", "File");

        let open = VersioningRestrictions::default();
        assert_eq!(open.unrequested_option(&doc).unwrap(), NoBump);

        let empty = VersioningRestrictions::new(vec![RestrictionRule::new("File", "*", &[])]);
        assert_eq!(empty.unrequested_option(&doc).unwrap(), NoBump);
        assert!(empty.check(&doc, NoBump).is_err());

        let forced = VersioningRestrictions::new(vec![RestrictionRule::new("File", "*", &[Minor, Major])]);
        assert!(matches!(
            forced.unrequested_option(&doc),
            Err(DocverError::VersioningRequired { .. })
        ));
    }
}
