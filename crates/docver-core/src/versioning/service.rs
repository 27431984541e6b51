//! Versioning state machine
//!
//! [`VersioningService`] owns the compiled restrictions and policies and
//! drives every version transition of a live document:
//!
//! - `post_create`: initial numbers from the first matching policy
//! - `check_in`: bump, freeze a [`Version`], mark checked in
//! - `check_out`: mark checked out, catching up with the latest version
//!   when the document was restored from an older one
//! - `save`: effective option resolution, restriction validation,
//!   automatic checkout and automatic versioning
//! - `restore`: bring a version back as the live content
//!
//! The service performs no locking: callers serialize operations on a
//! lineage (see [`crate::session::Session`]).

use docver_common::{DocverError, Result, Transition, VersionState, VersioningOption};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use super::filter::{NamedFilter, StandardVersioningFilter, VersioningFilter};
use super::policy::{VersioningPolicies, VersioningPolicy};
use super::restriction::{RestrictionRule, VersioningRestrictions};
use crate::config::VersioningConfig;
use crate::document::{Document, Version, DEFAULT_LIFECYCLE_STATE};
use crate::events::BACK_TO_PROJECT_TRANSITION;
use crate::store::DocumentStore;

/// Lifecycle states left through `backToProject` when edited
pub const APPROVED_STATE: &str = "approved";
pub const OBSOLETE_STATE: &str = "obsolete";

/// Custom filters made available to configuration by name
pub type CustomFilters = HashMap<String, Arc<dyn VersioningFilter>>;

/// Caller options of a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Explicit option; policies and restriction defaults apply when absent
    pub versioning_option: Option<VersioningOption>,
    pub comment: Option<String>,
    /// Keep a checked-in document checked in even when the save is dirty
    pub disable_auto_checkout: bool,
}

impl SaveOptions {
    pub fn with_option(option: VersioningOption) -> Self {
        Self {
            versioning_option: Some(option),
            ..Default::default()
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn disable_auto_checkout(mut self) -> Self {
        self.disable_auto_checkout = true;
        self
    }
}

/// Lifecycle transition followed during a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleChange {
    pub from: Option<String>,
    pub to: String,
    pub transition: String,
}

/// What a save did besides writing content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOutcome {
    /// Version created after the write
    pub version: Option<Version>,
    /// Version of the previous state created by a before-update policy
    pub before_version: Option<Version>,
    pub auto_checked_out: bool,
    pub lifecycle_change: Option<LifecycleChange>,
}

/// Compiled versioning configuration and the transitions it governs
#[derive(Debug, Clone, Default)]
pub struct VersioningService {
    restrictions: VersioningRestrictions,
    policies: VersioningPolicies,
}

impl VersioningService {
    pub fn new(restrictions: VersioningRestrictions, policies: VersioningPolicies) -> Self {
        Self {
            restrictions,
            policies,
        }
    }

    pub fn builder() -> VersioningServiceBuilder {
        VersioningServiceBuilder::default()
    }

    /// Compile declarative contributions. Every configuration error surfaces
    /// here, never while saving.
    pub fn from_config(config: &VersioningConfig, custom: &CustomFilters) -> Result<Self> {
        config.validate()?;

        let mut filters: HashMap<&str, NamedFilter> = HashMap::with_capacity(config.filters.len());
        for filter in &config.filters {
            let compiled: Arc<dyn VersioningFilter> = match filter.custom.as_deref() {
                Some(name) => custom.get(name).cloned().ok_or_else(|| {
                    DocverError::config(format!(
                        "Filter '{}' references unknown custom filter '{}'",
                        filter.id, name
                    ))
                })?,
                None => Arc::new(StandardVersioningFilter::from_config(filter)?),
            };
            filters.insert(
                filter.id.as_str(),
                NamedFilter {
                    id: filter.id.clone(),
                    filter: compiled,
                },
            );
        }

        let mut policies = Vec::with_capacity(config.policies.len());
        for policy in &config.policies {
            let mut compiled = VersioningPolicy::new(&policy.id, policy.order)
                .before_update(policy.before_update);
            compiled.increment = policy.increment;
            compiled.initial_state = policy.initial_state;
            for filter_id in &policy.filters {
                let filter = filters.get(filter_id.as_str()).cloned().ok_or_else(|| {
                    DocverError::config(format!(
                        "Policy '{}' references unknown filter '{}'",
                        policy.id, filter_id
                    ))
                })?;
                compiled = compiled.with_filter(filter);
            }
            policies.push(compiled);
        }

        let rules = config.restrictions.iter().map(RestrictionRule::from).collect();

        info!(
            policies = policies.len(),
            filters = filters.len(),
            restrictions = config.restrictions.len(),
            "Compiled versioning configuration"
        );

        Ok(Self::new(
            VersioningRestrictions::new(rules),
            VersioningPolicies::new(policies),
        ))
    }

    pub fn restrictions(&self) -> &VersioningRestrictions {
        &self.restrictions
    }

    pub fn policies(&self) -> &VersioningPolicies {
        &self.policies
    }

    /// Options a save of `doc` may request
    pub fn save_options(&self, doc: &Document) -> BTreeSet<VersioningOption> {
        self.restrictions.save_options(doc)
    }

    /// Initialize the version state of a document being created
    pub fn post_create(&self, doc: &mut Document) {
        doc.version = self
            .policies
            .initial_state(doc)
            .map(|initial| initial.state())
            .unwrap_or_default();
        doc.base_version_id = None;
        debug!(document_id = %doc.id, state = %doc.version, "Initial version state");
    }

    /// Check in a checked-out document. No option means MINOR; NONE is
    /// rejected since a check-in always creates a version.
    #[tracing::instrument(skip(self, store, doc), fields(document_id = %doc.id))]
    pub fn check_in(
        &self,
        store: &dyn DocumentStore,
        doc: &mut Document,
        option: Option<VersioningOption>,
        comment: Option<&str>,
    ) -> Result<Version> {
        let option = option.unwrap_or(VersioningOption::Minor);
        if !doc.is_checked_out() {
            return Err(DocverError::VersioningState {
                transition: Transition::CheckIn,
                document_id: doc.id,
                state: doc.version,
            });
        }
        self.restrictions.check(doc, option)?;
        if !option.is_bump() {
            return Err(DocverError::InvalidCheckInOption(option));
        }
        self.do_check_in(store, doc, option, comment)
    }

    /// Bump and freeze a checked-out document. `option` must be a bump that
    /// was already validated against the restrictions.
    fn do_check_in(
        &self,
        store: &dyn DocumentStore,
        doc: &mut Document,
        option: VersioningOption,
        comment: Option<&str>,
    ) -> Result<Version> {
        let next = doc.version.bumped(option).with_checked_out(false);
        let mut version = Version::snapshot(doc, comment);
        version.major = next.major;
        version.minor = next.minor;
        store.insert_version(&version)?;

        doc.version = next;
        doc.base_version_id = Some(version.id);
        info!(document_id = %doc.id, label = %version.label(), "Checked in");
        Ok(version)
    }

    /// Check out a checked-in document. Numbers are left alone unless the
    /// base version is not the latest one of the lineage, in which case they
    /// catch up with the latest version.
    #[tracing::instrument(skip(self, store, doc), fields(document_id = %doc.id))]
    pub fn check_out(&self, store: &dyn DocumentStore, doc: &mut Document) -> Result<()> {
        if doc.is_checked_out() {
            return Err(DocverError::VersioningState {
                transition: Transition::CheckOut,
                document_id: doc.id,
                state: doc.version,
            });
        }

        let mut next = doc.version.with_checked_out(true);
        if let Some(base_id) = doc.base_version_id {
            if let Some(last) = store.last_version(doc.id)? {
                if last.id != base_id {
                    debug!(
                        document_id = %doc.id,
                        latest = %last.label(),
                        "Base version is not the latest, catching up"
                    );
                    next = VersionState::new(last.major, last.minor, true);
                }
            }
        }
        doc.version = next;
        info!(document_id = %doc.id, label = %doc.version_label(), "Checked out");
        Ok(())
    }

    /// Apply the versioning side of writing `doc` over its stored state
    /// `previous`.
    ///
    /// Options and restrictions are resolved before anything is touched, so a
    /// rejected save leaves both the store and `doc` content untouched.
    #[tracing::instrument(skip(self, store, previous, doc, options), fields(document_id = %doc.id))]
    pub fn save(
        &self,
        store: &dyn DocumentStore,
        previous: &Document,
        doc: &mut Document,
        options: &SaveOptions,
    ) -> Result<SaveOutcome> {
        // Version numbers are only moved by transitions; type, facets and
        // lifecycle state belong to the repository
        doc.version = previous.version;
        doc.base_version_id = previous.base_version_id;
        doc.doc_type = previous.doc_type.clone();
        doc.facets = previous.facets.clone();
        doc.schemas = previous.schemas.clone();
        doc.lifecycle_state = previous.lifecycle_state.clone();

        let dirty = doc.is_dirty_against(previous);
        let automatic = options.versioning_option.is_none() && dirty && doc.is_versionable();

        let before_policy = if automatic && previous.is_checked_out() {
            self.policies.matching(Some(previous), doc, true)
        } else {
            None
        };
        let before_increment = before_policy
            .and_then(|policy| policy.increment)
            .filter(VersioningOption::is_bump);
        if let Some(increment) = before_increment {
            self.restrictions.check(previous, increment)?;
        }

        let option = match options.versioning_option {
            Some(option) => {
                self.restrictions.check(doc, option)?;
                option
            },
            None => {
                let policy_increment = if automatic {
                    self.policies
                        .matching(Some(previous), doc, false)
                        .and_then(|policy| policy.increment)
                        .filter(VersioningOption::is_bump)
                } else {
                    None
                };
                match policy_increment {
                    Some(increment) => {
                        self.restrictions.check(doc, increment)?;
                        increment
                    },
                    None => self.restrictions.unrequested_option(doc)?,
                }
            },
        };
        debug!(document_id = %doc.id, dirty, option = %option, "Resolved save option");

        let mut outcome = SaveOutcome::default();

        if let (Some(policy), Some(increment)) = (before_policy, before_increment) {
            let mut frozen = previous.clone();
            let version = self.do_check_in(store, &mut frozen, increment, None)?;
            debug!(policy = %policy.id, label = %version.label(), "Versioned previous state");
            doc.version = frozen.version;
            doc.base_version_id = frozen.base_version_id;
            self.check_out(store, doc)?;
            outcome.before_version = Some(version);
        }

        if !doc.is_checked_out() && dirty && !options.disable_auto_checkout {
            self.check_out(store, doc)?;
            outcome.auto_checked_out = true;
            outcome.lifecycle_change = back_to_project(doc);
        }

        // Validated above, before backToProject moved the lifecycle state
        if doc.is_checked_out() && option.is_bump() {
            let version = self.do_check_in(store, doc, option, options.comment.as_deref())?;
            outcome.version = Some(version);
        }

        Ok(outcome)
    }

    /// Make `version` the live content of `doc`, checked in at its numbers
    #[tracing::instrument(skip(self, doc, version), fields(document_id = %doc.id, version_id = %version.id))]
    pub fn restore(&self, doc: &mut Document, version: &Version) -> Result<()> {
        if version.series_id != doc.id {
            return Err(DocverError::VersionNotFound(version.id));
        }
        doc.name = version.name.clone();
        doc.properties = version.properties.clone();
        doc.version = version.state();
        doc.base_version_id = Some(version.id);
        info!(document_id = %doc.id, label = %version.label(), "Restored version");
        Ok(())
    }
}

/// Edited approved or obsolete documents go back to the project state
fn back_to_project(doc: &mut Document) -> Option<LifecycleChange> {
    let from = doc.lifecycle_state.clone();
    match from.as_deref() {
        Some(APPROVED_STATE) | Some(OBSOLETE_STATE) => {
            doc.lifecycle_state = Some(DEFAULT_LIFECYCLE_STATE.to_string());
            Some(LifecycleChange {
                from,
                to: DEFAULT_LIFECYCLE_STATE.to_string(),
                transition: BACK_TO_PROJECT_TRANSITION.to_string(),
            })
        },
        _ => None,
    }
}

/// Programmatic construction of a [`VersioningService`]
#[derive(Debug, Default)]
pub struct VersioningServiceBuilder {
    rules: Vec<RestrictionRule>,
    policies: Vec<VersioningPolicy>,
}

impl VersioningServiceBuilder {
    pub fn restriction(mut self, rule: RestrictionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn policy(mut self, policy: VersioningPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn build(self) -> VersioningService {
        VersioningService::new(
            VersioningRestrictions::new(self.rules),
            VersioningPolicies::new(self.policies),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use docver_common::VersioningOption::{Major, Minor, None as NoBump};

    fn created(service: &VersioningService, store: &MemoryStore, doc: Document) -> Document {
        let mut doc = doc;
        service.post_create(&mut doc);
        store.put_document(&doc).unwrap();
        doc
    }

    fn edit(doc: &Document, title: &str) -> Document {
        let mut edited = doc.clone();
        edited.set_property("dc:title", title);
        edited
    }

    #[test]
    fn test_check_in_and_out_sequence() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let mut doc = created(&service, &store, Document::new("f", "File"));
        assert_eq!(doc.version_label(), "0.0");

        service.check_in(&store, &mut doc, Some(Minor), None).unwrap();
        assert_eq!(doc.version_label(), "0.1");
        assert!(!doc.is_checked_out());

        service.check_out(&store, &mut doc).unwrap();
        assert_eq!(doc.version_label(), "0.1+");

        let version = service.check_in(&store, &mut doc, Some(Major), Some("release")).unwrap();
        assert_eq!(version.label(), "1.0");
        assert_eq!(version.comment.as_deref(), Some("release"));
        assert_eq!(doc.base_version_id, Some(version.id));
        assert_eq!(store.versions(doc.id).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_transitions() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let mut doc = created(&service, &store, Document::new("f", "File"));

        let err = service.check_out(&store, &mut doc).unwrap_err();
        assert!(matches!(
            err,
            DocverError::VersioningState { transition: Transition::CheckOut, .. }
        ));

        service.check_in(&store, &mut doc, None, None).unwrap();
        assert_eq!(doc.version_label(), "0.1");
        let err = service.check_in(&store, &mut doc, Some(Minor), None).unwrap_err();
        assert!(matches!(
            err,
            DocverError::VersioningState { transition: Transition::CheckIn, .. }
        ));
    }

    #[test]
    fn test_check_in_with_none_is_rejected() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let mut doc = created(&service, &store, Document::new("f", "File"));
        assert!(matches!(
            service.check_in(&store, &mut doc, Some(NoBump), None),
            Err(DocverError::InvalidCheckInOption(NoBump))
        ));
        assert!(doc.is_checked_out());
        assert_eq!(store.version_count(), 0);
    }

    #[test]
    fn test_restricted_check_in_leaves_document_untouched() {
        let service = VersioningService::builder()
            .restriction(RestrictionRule::new("File", "*", &[Major]))
            .build();
        let store = MemoryStore::new();
        let mut doc = created(&service, &store, Document::new("f", "File"));
        let err = service.check_in(&store, &mut doc, Some(Minor), None).unwrap_err();
        assert!(err.is_restriction());
        assert_eq!(doc.version, VersionState::default());
        assert!(service.check_in(&store, &mut doc, Some(Major), None).is_ok());
        assert_eq!(doc.version_label(), "1.0");
    }

    #[test]
    fn test_initial_state_from_policy() {
        let service = VersioningService::builder()
            .policy(VersioningPolicy::new("initial", 1).with_initial_state(2, 5))
            .build();
        let store = MemoryStore::new();
        let doc = created(&service, &store, Document::new("f", "File"));
        assert_eq!(doc.version_label(), "2.5+");
        assert_eq!(store.version_count(), 0);
    }

    #[test]
    fn test_plain_save_keeps_numbers() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let previous = created(&service, &store, Document::new("f", "File"));
        let mut doc = edit(&previous, "t1");
        let outcome = service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        assert_eq!(outcome, SaveOutcome::default());
        assert_eq!(doc.version, previous.version);
    }

    #[test]
    fn test_auto_checkout_on_dirty_save() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let mut previous = created(&service, &store, Document::new("f", "File"));
        service.check_in(&store, &mut previous, Some(Major), None).unwrap();

        let mut doc = edit(&previous, "t1");
        let outcome = service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        assert!(outcome.auto_checked_out);
        assert_eq!(doc.version_label(), "1.0+");

        // Not dirty: stays checked in
        let mut doc = previous.clone();
        let outcome = service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        assert!(!outcome.auto_checked_out);
        assert_eq!(doc.version_label(), "1.0");

        // Disabled
        let mut doc = edit(&previous, "t2");
        let options = SaveOptions::default().disable_auto_checkout();
        service.save(&store, &previous, &mut doc, &options).unwrap();
        assert_eq!(doc.version_label(), "1.0");
    }

    #[test]
    fn test_auto_checkout_back_to_project() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let mut previous = created(
            &service,
            &store,
            Document::new("f", "File").with_lifecycle_state(Some(APPROVED_STATE)),
        );
        service.check_in(&store, &mut previous, Some(Minor), None).unwrap();

        let mut doc = edit(&previous, "t1");
        let outcome = service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        let change = outcome.lifecycle_change.unwrap();
        assert_eq!(change.from.as_deref(), Some("approved"));
        assert_eq!(change.transition, "backToProject");
        assert_eq!(doc.lifecycle_state.as_deref(), Some("project"));
    }

    #[test]
    fn test_save_with_explicit_option_checks_in() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let previous = created(&service, &store, Document::new("f", "File"));
        let mut doc = edit(&previous, "t1");
        let options = SaveOptions::with_option(Minor).comment("c");
        let outcome = service.save(&store, &previous, &mut doc, &options).unwrap();
        let version = outcome.version.unwrap();
        assert_eq!(version.label(), "0.1");
        assert_eq!(version.properties["dc:title"], "t1");
        assert_eq!(doc.version_label(), "0.1");
    }

    #[test]
    fn test_save_ignores_caller_version_numbers() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let previous = created(&service, &store, Document::new("f", "File"));
        let mut doc = edit(&previous, "t1");
        doc.version = VersionState::new(9, 9, false);
        service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        assert_eq!(doc.version, previous.version);
    }

    #[test]
    fn test_save_keeps_repository_owned_fields() {
        let service = VersioningService::builder()
            .restriction(RestrictionRule::new("File", APPROVED_STATE, &[Major]))
            .build();
        let store = MemoryStore::new();
        let previous = created(
            &service,
            &store,
            Document::new("f", "File").with_lifecycle_state(Some(APPROVED_STATE)),
        );

        let mut doc = edit(&previous, "t1")
            .with_lifecycle_state(Some(DEFAULT_LIFECYCLE_STATE))
            .without_facet(crate::document::FACET_VERSIONABLE);
        doc.doc_type = "Note".to_string();
        let err = service
            .save(&store, &previous, &mut doc, &SaveOptions::with_option(Minor))
            .unwrap_err();
        assert!(matches!(
            err,
            DocverError::VersioningRestricted { option: Minor, ref lifecycle_state, .. }
                if lifecycle_state.as_deref() == Some(APPROVED_STATE)
        ));
        assert_eq!(doc.doc_type, "File");
        assert!(doc.is_versionable());
        assert_eq!(doc.lifecycle_state.as_deref(), Some(APPROVED_STATE));
    }

    #[test]
    fn test_save_option_validated_before_back_to_project() {
        let service = VersioningService::builder()
            .restriction(RestrictionRule::new("File", APPROVED_STATE, &[NoBump, Minor, Major]))
            .restriction(RestrictionRule::new("File", DEFAULT_LIFECYCLE_STATE, &[NoBump, Major]))
            .build();
        let store = MemoryStore::new();
        let mut previous = created(
            &service,
            &store,
            Document::new("f", "File").with_lifecycle_state(Some(APPROVED_STATE)),
        );
        service.check_in(&store, &mut previous, Some(Major), None).unwrap();

        let mut doc = edit(&previous, "t1");
        let outcome = service
            .save(&store, &previous, &mut doc, &SaveOptions::with_option(Minor))
            .unwrap();
        assert!(outcome.auto_checked_out);
        assert_eq!(outcome.lifecycle_change.unwrap().to, DEFAULT_LIFECYCLE_STATE);
        assert_eq!(outcome.version.unwrap().label(), "1.1");
        assert_eq!(doc.version_label(), "1.1");
        assert_eq!(doc.lifecycle_state.as_deref(), Some(DEFAULT_LIFECYCLE_STATE));
    }

    #[test]
    fn test_restricted_save_is_rejected_before_mutation() {
        let service = VersioningService::builder()
            .restriction(RestrictionRule::new("*", "*", &[Major]))
            .build();
        let store = MemoryStore::new();
        let mut previous = created(&service, &store, Document::new("f", "File"));
        service.check_in(&store, &mut previous, Some(Major), None).unwrap();

        let mut doc = edit(&previous, "t1");
        let err = service
            .save(&store, &previous, &mut doc, &SaveOptions::with_option(Minor))
            .unwrap_err();
        assert!(matches!(err, DocverError::VersioningRestricted { option: Minor, .. }));
        assert!(!doc.is_checked_out());

        let err = service
            .save(&store, &previous, &mut doc, &SaveOptions::default())
            .unwrap_err();
        assert!(matches!(err, DocverError::VersioningRequired { .. }));

        let outcome = service
            .save(&store, &previous, &mut doc, &SaveOptions::with_option(Major))
            .unwrap();
        assert_eq!(outcome.version.unwrap().label(), "2.0");
    }

    #[test]
    fn test_after_update_policy() {
        let service = VersioningService::builder()
            .policy(VersioningPolicy::new("always-minor", 1).with_increment(Minor))
            .build();
        let store = MemoryStore::new();
        let previous = created(&service, &store, Document::new("f", "File"));

        let mut doc = edit(&previous, "t1");
        service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        assert_eq!(doc.version_label(), "0.1");

        let previous = doc.clone();
        let mut doc = edit(&previous, "t2");
        service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        assert_eq!(doc.version_label(), "0.2");

        // Unchanged content does not trigger policies
        let previous = doc.clone();
        let mut doc = previous.clone();
        let outcome = service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        assert!(outcome.version.is_none());
    }

    #[test]
    fn test_before_update_policy() {
        let service = VersioningService::builder()
            .policy(
                VersioningPolicy::new("before", 1)
                    .with_increment(Minor)
                    .before_update(true),
            )
            .build();
        let store = MemoryStore::new();
        let previous = created(&service, &store, Document::new("f", "File").with_property("dc:title", "t0"));

        let mut doc = edit(&previous, "t1");
        let outcome = service.save(&store, &previous, &mut doc, &SaveOptions::default()).unwrap();
        let before = outcome.before_version.unwrap();
        assert_eq!(before.label(), "0.1");
        assert_eq!(before.properties["dc:title"], "t0");
        assert!(outcome.version.is_none());
        assert_eq!(doc.version_label(), "0.1+");
    }

    #[test]
    fn test_checkout_after_restore_catches_up() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let mut doc = created(&service, &store, Document::new("f", "File"));
        let v1 = service.check_in(&store, &mut doc, Some(Major), None).unwrap();
        service.check_out(&store, &mut doc).unwrap();
        service.check_in(&store, &mut doc, Some(Major), None).unwrap();
        assert_eq!(doc.version_label(), "2.0");

        service.restore(&mut doc, &v1).unwrap();
        assert_eq!(doc.version_label(), "1.0");

        let previous = doc.clone();
        let mut edited = edit(&previous, "t1");
        let outcome = service
            .save(&store, &previous, &mut edited, &SaveOptions::with_option(Major))
            .unwrap();
        assert_eq!(outcome.version.unwrap().label(), "3.0");
    }

    #[test]
    fn test_restore_rejects_foreign_version() {
        let service = VersioningService::default();
        let store = MemoryStore::new();
        let mut other = created(&service, &store, Document::new("o", "File"));
        let version = service.check_in(&store, &mut other, None, None).unwrap();
        let mut doc = created(&service, &store, Document::new("f", "File"));
        assert!(service.restore(&mut doc, &version).is_err());
    }
}
