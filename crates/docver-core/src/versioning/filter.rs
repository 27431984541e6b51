//! Versioning filters
//!
//! A filter decides whether a save qualifies for a policy. The standard
//! filter is declarative (types, facets, schemas and a condition); custom
//! filters are any `Fn(Option<&Document>, &Document) -> bool`.

use docver_common::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::expression::Condition;
use crate::config::FilterConfig;
use crate::document::Document;

/// Predicate over the document before the save and the document being saved.
/// `previous` is `None` when the document is being created.
pub trait VersioningFilter: Send + Sync {
    fn test(&self, previous: Option<&Document>, current: &Document) -> bool;
}

impl<F> VersioningFilter for F
where
    F: Fn(Option<&Document>, &Document) -> bool + Send + Sync,
{
    fn test(&self, previous: Option<&Document>, current: &Document) -> bool {
        self(previous, current)
    }
}

/// Declarative filter; an empty criteria set accepts every document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardVersioningFilter {
    pub id: String,
    pub types: BTreeSet<String>,
    pub facets: BTreeSet<String>,
    pub schemas: BTreeSet<String>,
    pub condition: Option<Condition>,
}

impl StandardVersioningFilter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn with_facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets.extend(facets.into_iter().map(Into::into));
        self
    }

    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas.extend(schemas.into_iter().map(Into::into));
        self
    }

    /// Parse and attach a condition; malformed expressions are rejected here
    pub fn with_condition(mut self, condition: &str) -> Result<Self> {
        self.condition = Some(Condition::parse(condition)?);
        Ok(self)
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let filter = Self::new(&config.id)
            .with_types(&config.types)
            .with_facets(&config.facets)
            .with_schemas(&config.schemas);
        match config.condition.as_deref() {
            Some(condition) => filter.with_condition(condition),
            None => Ok(filter),
        }
    }
}

impl VersioningFilter for StandardVersioningFilter {
    fn test(&self, previous: Option<&Document>, current: &Document) -> bool {
        if !self.types.is_empty() && !self.types.contains(&current.doc_type) {
            return false;
        }
        if !self.facets.is_empty() && !self.facets.iter().any(|f| current.has_facet(f)) {
            return false;
        }
        if !self.schemas.is_empty() && !self.schemas.iter().any(|s| current.has_schema(s)) {
            return false;
        }
        match &self.condition {
            None => true,
            // Conditions never trigger on creation
            Some(_) if previous.is_none() => false,
            Some(condition) => condition.evaluate(previous, current),
        }
    }
}

/// A filter registered under a name, as referenced by policies
#[derive(Clone)]
pub struct NamedFilter {
    pub id: String,
    pub filter: Arc<dyn VersioningFilter>,
}

impl NamedFilter {
    pub fn new(id: impl Into<String>, filter: impl VersioningFilter + 'static) -> Self {
        Self {
            id: id.into(),
            filter: Arc::new(filter),
        }
    }

    pub fn test(&self, previous: Option<&Document>, current: &Document) -> bool {
        self.filter.test(previous, current)
    }
}

impl fmt::Debug for NamedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFilter").field("id", &self.id).finish_non_exhaustive()
    }
}
