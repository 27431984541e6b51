//! Live documents, frozen versions and proxies
//!
//! A live document owns a lineage of [`Version`]s (its "version series"; the
//! series id is the live document id). [`Proxy`] values place a version, or
//! the live document itself, somewhere else and keep their target alive.

use chrono::{DateTime, Utc};
use docver_common::VersionState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::versioning::format_version_label;

/// Facet marking documents that can be versioned
pub const FACET_VERSIONABLE: &str = "Versionable";

/// Lifecycle state of new documents
pub const DEFAULT_LIFECYCLE_STATE: &str = "project";

/// The current, mutable working copy of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub doc_type: String,
    pub facets: BTreeSet<String>,
    pub schemas: BTreeSet<String>,
    pub lifecycle_state: Option<String>,
    /// Property values keyed by `prefix:name` (e.g. `dc:title`)
    pub properties: BTreeMap<String, Value>,
    pub version: VersionState,
    /// Version the live document was last checked in as, or restored from
    pub base_version_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
}

impl Document {
    /// New versionable document in the default lifecycle state
    pub fn new(name: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            doc_type: doc_type.into(),
            facets: BTreeSet::from([FACET_VERSIONABLE.to_string()]),
            schemas: BTreeSet::new(),
            lifecycle_state: Some(DEFAULT_LIFECYCLE_STATE.to_string()),
            properties: BTreeMap::new(),
            version: VersionState::default(),
            base_version_id: None,
            parent_id: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facets.insert(facet.into());
        self
    }

    pub fn without_facet(mut self, facet: &str) -> Self {
        self.facets.remove(facet);
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schemas.insert(schema.into());
        self
    }

    pub fn with_lifecycle_state(mut self, state: Option<&str>) -> Self {
        self.lifecycle_state = state.map(str::to_string);
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn has_facet(&self, facet: &str) -> bool {
        self.facets.contains(facet)
    }

    pub fn has_schema(&self, schema: &str) -> bool {
        self.schemas.contains(schema)
    }

    pub fn is_versionable(&self) -> bool {
        self.has_facet(FACET_VERSIONABLE)
    }

    pub fn is_checked_out(&self) -> bool {
        self.version.checked_out
    }

    pub fn version_label(&self) -> String {
        format_version_label(self.version.major, self.version.minor, self.version.checked_out)
    }

    /// Whether saving `self` over `stored` changes the content
    pub fn is_dirty_against(&self, stored: &Document) -> bool {
        self.properties != stored.properties || self.name != stored.name
    }
}

/// Immutable snapshot of a live document taken at check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: Uuid,
    /// Id of the live document this version was taken from
    pub series_id: Uuid,
    pub major: u64,
    pub minor: u64,
    pub created_at: DateTime<Utc>,
    pub comment: Option<String>,
    pub name: String,
    pub doc_type: String,
    pub lifecycle_state: Option<String>,
    pub properties: BTreeMap<String, Value>,
}

impl Version {
    /// Freeze the current content and numbers of `doc`
    pub fn snapshot(doc: &Document, comment: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            series_id: doc.id,
            major: doc.version.major,
            minor: doc.version.minor,
            created_at: Utc::now(),
            comment: comment.map(str::to_string),
            name: doc.name.clone(),
            doc_type: doc.doc_type.clone(),
            lifecycle_state: doc.lifecycle_state.clone(),
            properties: doc.properties.clone(),
        }
    }

    /// Versions are always checked in
    pub fn state(&self) -> VersionState {
        VersionState::new(self.major, self.minor, false)
    }

    pub fn label(&self) -> String {
        format_version_label(self.major, self.minor, false)
    }
}

/// What a proxy points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProxyTarget {
    Version(Uuid),
    Live(Uuid),
}

impl ProxyTarget {
    pub fn id(&self) -> Uuid {
        match self {
            ProxyTarget::Version(id) | ProxyTarget::Live(id) => *id,
        }
    }
}

/// Placement of a version (or a live document) in another location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    pub id: Uuid,
    pub target: ProxyTarget,
    pub parent_id: Option<Uuid>,
}

impl Proxy {
    pub fn new(target: ProxyTarget, parent_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            parent_id,
        }
    }
}

/// What remains known about a document once it has been removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowDocument {
    pub id: Uuid,
    pub name: String,
    pub doc_type: String,
    pub lifecycle_state: Option<String>,
}

impl From<&Document> for ShallowDocument {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name.clone(),
            doc_type: doc.doc_type.clone(),
            lifecycle_state: doc.lifecycle_state.clone(),
        }
    }
}

impl From<&Version> for ShallowDocument {
    fn from(version: &Version) -> Self {
        Self {
            id: version.series_id,
            name: version.name.clone(),
            doc_type: version.doc_type.clone(),
            lifecycle_state: version.lifecycle_state.clone(),
        }
    }
}
