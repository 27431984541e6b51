//! Document events and their delivery
//!
//! [`EventBus::fire`] is synchronous and never blocks: events are pushed to
//! every subscribed listener over an unbounded channel. Each delivery carries
//! a ticket that is released when the listener drops it, which is what
//! [`EventBus::wait_for_completion`] waits on.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::document::{Proxy, ShallowDocument};

/// Number of fired events kept for [`EventBus::history`]
pub const EVENT_HISTORY_CAPACITY: usize = 1024;

/// Lifecycle transition taken when an approved or obsolete document is edited
pub const BACK_TO_PROJECT_TRANSITION: &str = "backToProject";

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    Created {
        document_id: Uuid,
        doc_type: String,
    },
    CheckedIn {
        document_id: Uuid,
        version_id: Uuid,
        label: String,
    },
    CheckedOut {
        document_id: Uuid,
    },
    LifecycleTransition {
        document_id: Uuid,
        from: Option<String>,
        to: String,
        transition: String,
    },
    Restored {
        document_id: Uuid,
        version_id: Uuid,
    },
    /// A live document was removed; `version_ids` is its whole lineage
    DocumentRemoved {
        document: ShallowDocument,
        version_ids: Vec<Uuid>,
    },
    ProxyRemoved {
        proxy: Proxy,
    },
    VersionRemoved {
        version_id: Uuid,
        series_id: Uuid,
    },
}

impl DocumentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DocumentEvent::Created { .. } => "documentCreated",
            DocumentEvent::CheckedIn { .. } => "documentCheckedIn",
            DocumentEvent::CheckedOut { .. } => "documentCheckedOut",
            DocumentEvent::LifecycleTransition { .. } => "lifecycle_transition_event",
            DocumentEvent::Restored { .. } => "documentRestored",
            DocumentEvent::DocumentRemoved { .. } => "documentRemoved",
            DocumentEvent::ProxyRemoved { .. } => "proxyRemoved",
            DocumentEvent::VersionRemoved { .. } => "versionRemoved",
        }
    }
}

struct BusInner {
    listeners: RwLock<Vec<mpsc::UnboundedSender<Delivery>>>,
    pending: AtomicUsize,
    idle: Notify,
    history: Mutex<VecDeque<DocumentEvent>>,
}

impl BusInner {
    fn release(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Marks one outstanding delivery; released on drop
struct Ticket {
    bus: Arc<BusInner>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.bus.release();
    }
}

/// An event handed to a listener. Drop it once the event is fully handled.
pub struct Delivery {
    pub event: DocumentEvent,
    _ticket: Ticket,
}

/// Receiving end of a subscription
pub struct EventListener {
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl EventListener {
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }
}

/// Cloneable handle on the event system
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: RwLock::new(Vec::new()),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
                history: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Register a listener. Every event fired afterwards is delivered to it
    /// and counts as pending until the listener drops the [`Delivery`].
    pub fn subscribe(&self) -> EventListener {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.listeners.write().push(tx);
        EventListener { rx }
    }

    pub fn fire(&self, event: DocumentEvent) {
        trace!(event = event.name(), "Firing event");
        {
            let mut history = self.inner.history.lock();
            if history.len() == EVENT_HISTORY_CAPACITY {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        let mut listeners = self.inner.listeners.write();
        listeners.retain(|tx| !tx.is_closed());
        for tx in listeners.iter() {
            self.inner.pending.fetch_add(1, Ordering::AcqRel);
            let delivery = Delivery {
                event: event.clone(),
                _ticket: Ticket {
                    bus: Arc::clone(&self.inner),
                },
            };
            // A failed send drops the delivery, which releases its ticket
            if tx.send(delivery).is_err() {
                debug!(event = event.name(), "Listener went away before delivery");
            }
        }
    }

    /// Number of deliveries not yet handled by their listener
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Resolves once every delivered event has been handled, including the
    /// events fired by listeners while handling.
    pub async fn wait_for_completion(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Most recent fired events, oldest first
    pub fn history(&self) -> Vec<DocumentEvent> {
        self.inner.history.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn checked_out(id: Uuid) -> DocumentEvent {
        DocumentEvent::CheckedOut { document_id: id }
    }

    #[tokio::test]
    async fn test_wait_without_listeners_returns_immediately() {
        let bus = EventBus::new();
        bus.fire(checked_out(Uuid::new_v4()));
        bus.wait_for_completion().await;
        assert_eq!(bus.history().len(), 1);
    }

    #[tokio::test]
    async fn test_wait_until_listener_handles_event() {
        let bus = EventBus::new();
        let mut listener = bus.subscribe();
        bus.fire(checked_out(Uuid::new_v4()));
        assert_eq!(bus.pending(), 1);

        let worker = tokio::spawn(async move {
            let delivery = listener.recv().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(delivery);
        });

        bus.wait_for_completion().await;
        assert_eq!(bus.pending(), 0);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_listener_does_not_block() {
        let bus = EventBus::new();
        let listener = bus.subscribe();
        drop(listener);
        bus.fire(checked_out(Uuid::new_v4()));
        bus.wait_for_completion().await;
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = EventBus::new();
        for _ in 0..EVENT_HISTORY_CAPACITY + 5 {
            bus.fire(checked_out(Uuid::new_v4()));
        }
        assert_eq!(bus.history().len(), EVENT_HISTORY_CAPACITY);
    }
}
