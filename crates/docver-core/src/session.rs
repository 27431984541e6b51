//! Document session
//!
//! [`Session`] is the repository-facing entry point: it loads documents from
//! the [`DocumentStore`], runs the [`VersioningService`] transitions, writes
//! the results back and fires the matching [`DocumentEvent`]s.
//!
//! Writes are serialized by a session-wide lock, which gives every lineage
//! the single-writer guarantee the versioning service relies on.

use docver_common::{DocverError, Result, VersionState, VersioningOption};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::{Document, Proxy, ProxyTarget, ShallowDocument, Version};
use crate::events::{DocumentEvent, EventBus};
use crate::store::{DocumentStore, MemoryStore};
use crate::versioning::format_version_label;
pub use crate::versioning::service::SaveOptions;
use crate::versioning::service::{SaveOutcome, VersioningService};

pub struct Session {
    store: Arc<dyn DocumentStore>,
    service: RwLock<Arc<VersioningService>>,
    bus: EventBus,
    writer: Mutex<()>,
}

impl Session {
    pub fn new(store: Arc<dyn DocumentStore>, service: VersioningService, bus: EventBus) -> Self {
        Self {
            store,
            service: RwLock::new(Arc::new(service)),
            bus,
            writer: Mutex::new(()),
        }
    }

    /// Session over a fresh [`MemoryStore`] and event bus
    pub fn in_memory(service: VersioningService) -> Self {
        Self::new(Arc::new(MemoryStore::new()), service, EventBus::new())
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn service(&self) -> Arc<VersioningService> {
        self.service.read().clone()
    }

    /// Swap the versioning configuration; later operations use the new one
    pub fn reconfigure(&self, service: VersioningService) {
        let _guard = self.writer.lock();
        *self.service.write() = Arc::new(service);
        info!("Versioning configuration replaced");
    }

    /// Recently fired events, oldest first
    pub fn events(&self) -> Vec<DocumentEvent> {
        self.bus.history()
    }

    // ========================================================================
    // Live documents
    // ========================================================================

    pub fn create_document(&self, doc: Document) -> Result<Document> {
        let _guard = self.writer.lock();
        let mut doc = doc;
        self.service().post_create(&mut doc);
        self.store.put_document(&doc)?;
        info!(document_id = %doc.id, doc_type = %doc.doc_type, label = %doc.version_label(), "Created document");
        self.bus.fire(DocumentEvent::Created {
            document_id: doc.id,
            doc_type: doc.doc_type.clone(),
        });
        Ok(doc)
    }

    pub fn get_document(&self, id: Uuid) -> Result<Document> {
        self.store.document(id)
    }

    /// Write `doc` over its stored state. Version numbers, type, facets,
    /// schemas and lifecycle state carried by `doc` are ignored: numbers only
    /// move through versioning transitions and the rest is the stored one.
    pub fn save_document(&self, doc: Document, options: &SaveOptions) -> Result<Document> {
        let _guard = self.writer.lock();
        let previous = self.store.document(doc.id)?;
        let mut doc = doc;
        let outcome = self.service().save(self.store.as_ref(), &previous, &mut doc, options)?;
        self.store.put_document(&doc)?;
        debug!(document_id = %doc.id, label = %doc.version_label(), "Saved document");
        self.fire_save_events(&doc, outcome);
        Ok(doc)
    }

    fn fire_save_events(&self, doc: &Document, outcome: SaveOutcome) {
        if let Some(version) = outcome.before_version {
            self.fire_checked_in(&version);
            self.bus.fire(DocumentEvent::CheckedOut { document_id: doc.id });
        }
        if outcome.auto_checked_out {
            self.bus.fire(DocumentEvent::CheckedOut { document_id: doc.id });
        }
        if let Some(change) = outcome.lifecycle_change {
            self.bus.fire(DocumentEvent::LifecycleTransition {
                document_id: doc.id,
                from: change.from,
                to: change.to,
                transition: change.transition,
            });
        }
        if let Some(version) = outcome.version {
            self.fire_checked_in(&version);
        }
    }

    fn fire_checked_in(&self, version: &Version) {
        self.bus.fire(DocumentEvent::CheckedIn {
            document_id: version.series_id,
            version_id: version.id,
            label: version.label(),
        });
    }

    pub fn check_in(
        &self,
        id: Uuid,
        option: Option<VersioningOption>,
        comment: Option<&str>,
    ) -> Result<Version> {
        let _guard = self.writer.lock();
        self.check_in_locked(id, option, comment)
    }

    fn check_in_locked(
        &self,
        id: Uuid,
        option: Option<VersioningOption>,
        comment: Option<&str>,
    ) -> Result<Version> {
        let mut doc = self.store.document(id)?;
        let version = self.service().check_in(self.store.as_ref(), &mut doc, option, comment)?;
        self.store.put_document(&doc)?;
        self.fire_checked_in(&version);
        Ok(version)
    }

    pub fn check_out(&self, id: Uuid) -> Result<Document> {
        let _guard = self.writer.lock();
        let mut doc = self.store.document(id)?;
        self.service().check_out(self.store.as_ref(), &mut doc)?;
        self.store.put_document(&doc)?;
        self.bus.fire(DocumentEvent::CheckedOut { document_id: id });
        Ok(doc)
    }

    pub fn restore_to_version(&self, id: Uuid, version_id: Uuid) -> Result<Document> {
        let _guard = self.writer.lock();
        let mut doc = self.store.document(id)?;
        let version = self.store.version(version_id)?;
        self.service().restore(&mut doc, &version)?;
        self.store.put_document(&doc)?;
        self.bus.fire(DocumentEvent::Restored {
            document_id: id,
            version_id,
        });
        Ok(doc)
    }

    /// Versions of a lineage, oldest first
    pub fn versions(&self, id: Uuid) -> Result<Vec<Version>> {
        self.store.versions(id)
    }

    pub fn last_version(&self, id: Uuid) -> Result<Option<Version>> {
        self.store.last_version(id)
    }

    pub fn version_label(&self, id: Uuid) -> Result<String> {
        Ok(self.store.document(id)?.version_label())
    }

    // ========================================================================
    // Proxies
    // ========================================================================

    /// Check the document in if needed and place a proxy to its base version
    pub fn publish(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Proxy> {
        let _guard = self.writer.lock();
        let doc = self.store.document(id)?;
        let version_id = if doc.is_checked_out() {
            self.check_in_locked(id, None, None)?.id
        } else {
            doc.base_version_id
                .ok_or_else(|| DocverError::config(format!("Document {id} has no version to publish")))?
        };
        let proxy = Proxy::new(ProxyTarget::Version(version_id), parent_id);
        self.store.insert_proxy(&proxy)?;
        info!(document_id = %id, proxy_id = %proxy.id, version_id = %version_id, "Published document");
        Ok(proxy)
    }

    pub fn create_proxy(&self, target: ProxyTarget, parent_id: Option<Uuid>) -> Result<Proxy> {
        let _guard = self.writer.lock();
        match target {
            ProxyTarget::Version(id) => {
                self.store.version(id)?;
            },
            ProxyTarget::Live(id) => {
                self.store.document(id)?;
            },
        }
        let proxy = Proxy::new(target, parent_id);
        self.store.insert_proxy(&proxy)?;
        Ok(proxy)
    }

    /// Version state seen through a proxy: its target's
    pub fn proxy_state(&self, proxy_id: Uuid) -> Result<VersionState> {
        match self.store.proxy(proxy_id)?.target {
            ProxyTarget::Version(id) => Ok(self.store.version(id)?.state()),
            ProxyTarget::Live(id) => Ok(self.store.document(id)?.version),
        }
    }

    pub fn proxy_label(&self, proxy_id: Uuid) -> Result<String> {
        let state = self.proxy_state(proxy_id)?;
        Ok(format_version_label(state.major, state.minor, state.checked_out))
    }

    /// Live document behind a proxy
    fn proxy_lineage(&self, proxy_id: Uuid) -> Result<Uuid> {
        match self.store.proxy(proxy_id)?.target {
            ProxyTarget::Version(id) => Ok(self.store.version(id)?.series_id),
            ProxyTarget::Live(id) => Ok(id),
        }
    }

    pub fn check_in_proxy(
        &self,
        proxy_id: Uuid,
        option: Option<VersioningOption>,
        comment: Option<&str>,
    ) -> Result<Version> {
        let id = self.proxy_lineage(proxy_id)?;
        self.check_in(id, option, comment)
    }

    pub fn check_out_proxy(&self, proxy_id: Uuid) -> Result<Document> {
        let id = self.proxy_lineage(proxy_id)?;
        self.check_out(id)
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove a live document. Proxies to the live document go with it; its
    /// versions are left to the orphan version remover.
    pub fn remove_document(&self, id: Uuid) -> Result<()> {
        let _guard = self.writer.lock();
        let doc = self.store.remove_document(id)?;
        for proxy in self.store.proxies_targeting(id)? {
            if matches!(proxy.target, ProxyTarget::Live(_)) {
                self.store.remove_proxy(proxy.id)?;
                self.bus.fire(DocumentEvent::ProxyRemoved { proxy });
            }
        }
        let version_ids = self.store.versions(id)?.into_iter().map(|v| v.id).collect();
        info!(document_id = %id, "Removed document");
        self.bus.fire(DocumentEvent::DocumentRemoved {
            document: ShallowDocument::from(&doc),
            version_ids,
        });
        Ok(())
    }

    pub fn remove_proxy(&self, proxy_id: Uuid) -> Result<Proxy> {
        let _guard = self.writer.lock();
        let proxy = self.store.remove_proxy(proxy_id)?;
        self.bus.fire(DocumentEvent::ProxyRemoved {
            proxy: proxy.clone(),
        });
        Ok(proxy)
    }

    /// Remove a version unless a proxy targets it or it is the base version
    /// of its checked-in live document
    pub fn remove_version(&self, version_id: Uuid) -> Result<()> {
        let _guard = self.writer.lock();
        let version = self.store.version(version_id)?;
        if let Some(proxy) = self.store.proxies_targeting(version_id)?.into_iter().next() {
            return Err(DocverError::VersionReferenced {
                version_id,
                proxy_id: proxy.id,
            });
        }
        if let Ok(doc) = self.store.document(version.series_id) {
            if !doc.is_checked_out() && doc.base_version_id == Some(version_id) {
                return Err(DocverError::VersionInUse {
                    version_id,
                    document_id: doc.id,
                });
            }
        }
        self.store.remove_version(version_id)?;
        self.bus.fire(DocumentEvent::VersionRemoved {
            version_id,
            series_id: version.series_id,
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use docver_common::VersioningOption::{Major, Minor};

    fn session() -> Session {
        Session::in_memory(VersioningService::default())
    }

    #[test]
    fn test_observed_label_sequence() {
        let session = session();
        let doc = session.create_document(Document::new("file", "File")).unwrap();
        assert_eq!(session.version_label(doc.id).unwrap(), "0.0");
        assert!(doc.is_checked_out());

        session.check_in(doc.id, Some(Minor), None).unwrap();
        assert_eq!(session.version_label(doc.id).unwrap(), "0.1");

        session.check_out(doc.id).unwrap();
        assert_eq!(session.version_label(doc.id).unwrap(), "0.1+");

        session.check_in(doc.id, Some(Major), None).unwrap();
        assert_eq!(session.version_label(doc.id).unwrap(), "1.0");

        let doc = session.get_document(doc.id).unwrap().with_property("dc:title", "edited");
        let doc = session.save_document(doc, &SaveOptions::default()).unwrap();
        assert_eq!(doc.version_label(), "1.0+");

        let version = session.check_in(doc.id, Some(Minor), Some("foo")).unwrap();
        assert_eq!(version.label(), "1.1");
        assert_eq!(version.comment.as_deref(), Some("foo"));
        assert_eq!(session.versions(doc.id).unwrap().len(), 3);
    }

    #[test]
    fn test_publish_checks_in_first() {
        let session = session();
        let doc = session.create_document(Document::new("file", "File")).unwrap();
        let proxy = session.publish(doc.id, None).unwrap();
        assert_eq!(session.proxy_label(proxy.id).unwrap(), "0.1");
        assert!(!session.get_document(doc.id).unwrap().is_checked_out());

        // Already checked in: the base version is published again
        let again = session.publish(doc.id, None).unwrap();
        assert_eq!(again.target, proxy.target);
    }

    #[test]
    fn test_live_proxy_follows_document() {
        let session = session();
        let doc = session.create_document(Document::new("file", "File")).unwrap();
        let proxy = session.create_proxy(ProxyTarget::Live(doc.id), None).unwrap();

        session.check_in_proxy(proxy.id, Some(Major), None).unwrap();
        assert_eq!(session.proxy_label(proxy.id).unwrap(), "1.0");
        assert_eq!(session.version_label(doc.id).unwrap(), "1.0");

        session.check_out_proxy(proxy.id).unwrap();
        assert!(session.proxy_state(proxy.id).unwrap().checked_out);
        assert_eq!(session.version_label(doc.id).unwrap(), "1.0+");
    }

    #[test]
    fn test_remove_version_guards() {
        let session = session();
        let doc = session.create_document(Document::new("file", "File")).unwrap();
        let v1 = session.check_in(doc.id, None, None).unwrap();
        session.check_out(doc.id).unwrap();
        let v2 = session.check_in(doc.id, None, None).unwrap();

        assert!(matches!(
            session.remove_version(v2.id),
            Err(DocverError::VersionInUse { .. })
        ));

        let proxy = session.create_proxy(ProxyTarget::Version(v1.id), None).unwrap();
        assert!(matches!(
            session.remove_version(v1.id),
            Err(DocverError::VersionReferenced { .. })
        ));

        session.remove_proxy(proxy.id).unwrap();
        session.remove_version(v1.id).unwrap();
        assert_eq!(session.versions(doc.id).unwrap().len(), 1);
        assert!(session
            .events()
            .iter()
            .any(|e| matches!(e, DocumentEvent::VersionRemoved { version_id, .. } if *version_id == v1.id)));
    }

    #[test]
    fn test_rejected_save_is_not_stored() {
        let session = Session::in_memory(
            VersioningService::builder()
                .restriction(crate::versioning::RestrictionRule::new("File", "*", &[Major]))
                .build(),
        );
        let doc = session.create_document(Document::new("file", "File")).unwrap();
        let edited = doc.clone().with_property("dc:title", "t1");
        assert!(session
            .save_document(edited, &SaveOptions::with_option(Minor))
            .is_err());
        assert!(session.get_document(doc.id).unwrap().property("dc:title").is_none());
    }

    #[test]
    fn test_reconfigure_applies_to_later_saves() {
        let session = session();
        let doc = session.create_document(Document::new("file", "File")).unwrap();
        session.reconfigure(
            VersioningService::builder()
                .policy(crate::versioning::VersioningPolicy::new("minor", 1).with_increment(Minor))
                .build(),
        );
        let doc = session
            .save_document(doc.with_property("dc:title", "t1"), &SaveOptions::default())
            .unwrap();
        assert_eq!(doc.version_label(), "0.1");
        assert_eq!(session.service().policies().len(), 1);
    }

    #[test]
    fn test_remove_document_fires_lineage() {
        let session = session();
        let doc = session.create_document(Document::new("file", "File")).unwrap();
        let version = session.check_in(doc.id, None, None).unwrap();
        session.remove_document(doc.id).unwrap();

        let removed = session.events().into_iter().find_map(|e| match e {
            DocumentEvent::DocumentRemoved { version_ids, .. } => Some(version_ids),
            _ => None,
        });
        assert_eq!(removed, Some(vec![version.id]));
        assert!(matches!(
            session.get_document(doc.id),
            Err(DocverError::DocumentNotFound(_))
        ));
    }
}
