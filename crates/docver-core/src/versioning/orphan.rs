//! Orphan version removal
//!
//! Versions outlive their live document as long as a proxy targets them.
//! Once neither the live document nor any proxy remains, a version is an
//! orphan and [`OrphanVersionRemover`] purges it, asynchronously, in
//! reaction to `DocumentRemoved` and `ProxyRemoved` events.

use docver_common::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::OrphanRemovalConfig;
use crate::document::{ProxyTarget, ShallowDocument};
use crate::events::{DocumentEvent, EventBus};
use crate::store::DocumentStore;

/// Narrows (or vetoes, by returning nothing) the versions about to be purged
pub trait OrphanVersionRemovalFilter: Send + Sync {
    fn filter(
        &self,
        store: &dyn DocumentStore,
        deleted: &ShallowDocument,
        version_ids: Vec<Uuid>,
    ) -> Vec<Uuid>;
}

/// Only purge versions of documents of the given types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOrphanFilter {
    types: BTreeSet<String>,
}

impl TypeOrphanFilter {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }
}

impl OrphanVersionRemovalFilter for TypeOrphanFilter {
    fn filter(
        &self,
        _store: &dyn DocumentStore,
        deleted: &ShallowDocument,
        version_ids: Vec<Uuid>,
    ) -> Vec<Uuid> {
        if self.types.contains(&deleted.doc_type) {
            version_ids
        } else {
            Vec::new()
        }
    }
}

#[derive(Clone, Default)]
pub struct OrphanVersionRemovalPolicy {
    filters: Vec<Arc<dyn OrphanVersionRemovalFilter>>,
}

impl fmt::Debug for OrphanVersionRemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrphanVersionRemovalPolicy")
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl OrphanVersionRemovalPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl OrphanVersionRemovalFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn from_config(config: &OrphanRemovalConfig) -> Self {
        if config.types.is_empty() {
            Self::new()
        } else {
            Self::new().with_filter(TypeOrphanFilter::new(&config.types))
        }
    }

    /// Versions among `version_ids` that can be purged now that `deleted`
    /// is gone: still stored, not targeted by any proxy, and kept by every
    /// filter.
    pub fn removable_version_ids(
        &self,
        store: &dyn DocumentStore,
        deleted: &ShallowDocument,
        version_ids: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        if store.contains_document(deleted.id) {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::with_capacity(version_ids.len());
        for &id in version_ids {
            if store.version(id).is_err() {
                continue;
            }
            if store.proxies_targeting(id)?.is_empty() {
                candidates.push(id);
            }
        }

        for filter in &self.filters {
            if candidates.is_empty() {
                break;
            }
            candidates = filter.filter(store, deleted, candidates);
        }
        Ok(candidates)
    }
}

/// Background task purging orphan versions
pub struct OrphanVersionRemover;

impl OrphanVersionRemover {
    /// Subscribe to `bus` and start the removal task. The subscription is
    /// registered before this returns, so no later event is missed.
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        policy: Arc<OrphanVersionRemovalPolicy>,
        bus: &EventBus,
    ) -> JoinHandle<()> {
        let mut listener = bus.subscribe();
        let bus = bus.clone();
        tokio::spawn(async move {
            while let Some(delivery) = listener.recv().await {
                if let Err(e) = handle_event(store.as_ref(), &policy, &bus, &delivery.event) {
                    warn!(event = delivery.event.name(), error = %e, "Orphan version removal failed");
                }
            }
            debug!("Orphan version remover stopped");
        })
    }
}

fn handle_event(
    store: &dyn DocumentStore,
    policy: &OrphanVersionRemovalPolicy,
    bus: &EventBus,
    event: &DocumentEvent,
) -> Result<()> {
    let (deleted, version_ids) = match event {
        DocumentEvent::DocumentRemoved {
            document,
            version_ids,
        } => (document.clone(), version_ids.clone()),
        DocumentEvent::ProxyRemoved { proxy } => {
            let ProxyTarget::Version(version_id) = proxy.target else {
                return Ok(());
            };
            let Ok(version) = store.version(version_id) else {
                return Ok(());
            };
            (ShallowDocument::from(&version), vec![version_id])
        },
        _ => return Ok(()),
    };

    let removable = policy.removable_version_ids(store, &deleted, &version_ids)?;
    if removable.is_empty() {
        return Ok(());
    }

    let mut removed = 0usize;
    for id in removable {
        match store.remove_version(id) {
            Ok(version) => {
                removed += 1;
                bus.fire(DocumentEvent::VersionRemoved {
                    version_id: version.id,
                    series_id: version.series_id,
                });
            },
            Err(e) => warn!(version_id = %id, error = %e, "Failed to remove orphan version"),
        }
    }
    info!(document_id = %deleted.id, removed, "Removed orphan versions");
    Ok(())
}
