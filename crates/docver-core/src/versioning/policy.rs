//! Versioning policies
//!
//! A policy ties an ordered list of filters (all must pass) to an automatic
//! increment and an optional initial version. Policies are evaluated by
//! ascending `order`, ties broken by id; the first match wins.

use docver_common::{VersionState, VersioningOption};
use serde::{Deserialize, Serialize};

use super::filter::NamedFilter;
use crate::document::Document;

/// Starting numbers of a new document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState {
    pub major: u64,
    pub minor: u64,
}

impl InitialState {
    pub fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// New documents always start checked out
    pub fn state(&self) -> VersionState {
        VersionState::new(self.major, self.minor, true)
    }
}

#[derive(Debug, Clone)]
pub struct VersioningPolicy {
    pub id: String,
    pub order: i32,
    /// Version the previous state before the write instead of after it
    pub before_update: bool,
    pub increment: Option<VersioningOption>,
    pub initial_state: Option<InitialState>,
    pub filters: Vec<NamedFilter>,
}

impl VersioningPolicy {
    pub fn new(id: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            order,
            before_update: false,
            increment: None,
            initial_state: None,
            filters: Vec::new(),
        }
    }

    pub fn with_increment(mut self, increment: VersioningOption) -> Self {
        self.increment = Some(increment);
        self
    }

    pub fn with_initial_state(mut self, major: u64, minor: u64) -> Self {
        self.initial_state = Some(InitialState::new(major, minor));
        self
    }

    pub fn before_update(mut self, before_update: bool) -> Self {
        self.before_update = before_update;
        self
    }

    pub fn with_filter(mut self, filter: NamedFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Every filter passes; a policy without filters matches everything
    pub fn matches(&self, previous: Option<&Document>, current: &Document) -> bool {
        self.filters.iter().all(|f| f.test(previous, current))
    }
}

/// Policies sorted by evaluation order
#[derive(Debug, Clone, Default)]
pub struct VersioningPolicies {
    policies: Vec<VersioningPolicy>,
}

impl VersioningPolicies {
    pub fn new(mut policies: Vec<VersioningPolicy>) -> Self {
        policies.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Self { policies }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersioningPolicy> {
        self.policies.iter()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Starting numbers of a document being created
    pub fn initial_state(&self, created: &Document) -> Option<InitialState> {
        self.policies
            .iter()
            .filter(|p| p.initial_state.is_some())
            .find(|p| p.matches(None, created))
            .and_then(|p| p.initial_state)
    }

    /// First policy with an increment matching this save and update phase
    pub fn matching(
        &self,
        previous: Option<&Document>,
        current: &Document,
        before_update: bool,
    ) -> Option<&VersioningPolicy> {
        self.policies
            .iter()
            .filter(|p| p.increment.is_some() && p.before_update == before_update)
            .find(|p| p.matches(previous, current))
    }
}
