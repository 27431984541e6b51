//! Repository collaborator
//!
//! The versioning engine never persists anything itself: it reads and writes
//! documents, versions and proxies through [`DocumentStore`]. [`MemoryStore`]
//! is the in-process implementation used by the session, the CLI and tests.

use docver_common::{DocverError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;
use uuid::Uuid;

use crate::document::{Document, Proxy, Version};

/// Storage of live documents, versions and proxies
pub trait DocumentStore: Send + Sync {
    fn document(&self, id: Uuid) -> Result<Document>;

    fn contains_document(&self, id: Uuid) -> bool;

    /// Insert or replace a live document
    fn put_document(&self, doc: &Document) -> Result<()>;

    fn remove_document(&self, id: Uuid) -> Result<Document>;

    fn version(&self, id: Uuid) -> Result<Version>;

    fn insert_version(&self, version: &Version) -> Result<()>;

    fn remove_version(&self, id: Uuid) -> Result<Version>;

    /// Versions of a lineage, oldest first
    fn versions(&self, series_id: Uuid) -> Result<Vec<Version>>;

    fn proxy(&self, id: Uuid) -> Result<Proxy>;

    fn insert_proxy(&self, proxy: &Proxy) -> Result<()>;

    fn remove_proxy(&self, id: Uuid) -> Result<Proxy>;

    /// Proxies whose target (version or live document) has this id
    fn proxies_targeting(&self, target_id: Uuid) -> Result<Vec<Proxy>>;

    /// Latest version of a lineage
    fn last_version(&self, series_id: Uuid) -> Result<Option<Version>> {
        Ok(self.versions(series_id)?.pop())
    }
}

#[derive(Default)]
struct StoreState {
    documents: HashMap<Uuid, Document>,
    versions: HashMap<Uuid, Version>,
    proxies: HashMap<Uuid, Proxy>,
}

/// Thread-safe in-memory [`DocumentStore`]
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version_count(&self) -> usize {
        self.state.read().versions.len()
    }
}

impl DocumentStore for MemoryStore {
    fn document(&self, id: Uuid) -> Result<Document> {
        self.state
            .read()
            .documents
            .get(&id)
            .cloned()
            .ok_or(DocverError::DocumentNotFound(id))
    }

    fn contains_document(&self, id: Uuid) -> bool {
        self.state.read().documents.contains_key(&id)
    }

    fn put_document(&self, doc: &Document) -> Result<()> {
        trace!(document_id = %doc.id, state = %doc.version, "Storing document");
        self.state.write().documents.insert(doc.id, doc.clone());
        Ok(())
    }

    fn remove_document(&self, id: Uuid) -> Result<Document> {
        self.state
            .write()
            .documents
            .remove(&id)
            .ok_or(DocverError::DocumentNotFound(id))
    }

    fn version(&self, id: Uuid) -> Result<Version> {
        self.state
            .read()
            .versions
            .get(&id)
            .cloned()
            .ok_or(DocverError::VersionNotFound(id))
    }

    fn insert_version(&self, version: &Version) -> Result<()> {
        trace!(version_id = %version.id, series_id = %version.series_id, label = %version.label(), "Storing version");
        self.state.write().versions.insert(version.id, version.clone());
        Ok(())
    }

    fn remove_version(&self, id: Uuid) -> Result<Version> {
        self.state
            .write()
            .versions
            .remove(&id)
            .ok_or(DocverError::VersionNotFound(id))
    }

    fn versions(&self, series_id: Uuid) -> Result<Vec<Version>> {
        let mut versions: Vec<Version> = self
            .state
            .read()
            .versions
            .values()
            .filter(|v| v.series_id == series_id)
            .cloned()
            .collect();
        // Numbers only grow along a lineage
        versions.sort_by(|a, b| {
            (a.major, a.minor, a.created_at).cmp(&(b.major, b.minor, b.created_at))
        });
        Ok(versions)
    }

    fn proxy(&self, id: Uuid) -> Result<Proxy> {
        self.state
            .read()
            .proxies
            .get(&id)
            .cloned()
            .ok_or(DocverError::ProxyNotFound(id))
    }

    fn insert_proxy(&self, proxy: &Proxy) -> Result<()> {
        self.state.write().proxies.insert(proxy.id, proxy.clone());
        Ok(())
    }

    fn remove_proxy(&self, id: Uuid) -> Result<Proxy> {
        self.state
            .write()
            .proxies
            .remove(&id)
            .ok_or(DocverError::ProxyNotFound(id))
    }

    fn proxies_targeting(&self, target_id: Uuid) -> Result<Vec<Proxy>> {
        Ok(self
            .state
            .read()
            .proxies
            .values()
            .filter(|p| p.target.id() == target_id)
            .cloned()
            .collect())
    }
}
