//! docver core library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Document versioning engine: checkout/checkin state machine, declarative
//! versioning policies and restrictions, and asynchronous removal of orphan
//! versions.
//!
//! # Overview
//!
//! - [`versioning`]: labels, restrictions, condition expressions, filters,
//!   policies, the [`versioning::VersioningService`] state machine and the
//!   orphan version remover
//! - [`document`]: live documents, frozen versions and proxies
//! - [`store`]: the repository collaborator ([`store::DocumentStore`]) and an
//!   in-memory implementation
//! - [`session`]: document operations wired to the service, store and events
//! - [`events`]: the event bus and its completion signal
//! - [`config`]: TOML contributions for policies, filters and restrictions
//!
//! # Example
//!
//! ```
//! use docver_core::document::Document;
//! use docver_core::session::Session;
//! use docver_core::versioning::VersioningService;
//! use docver_common::VersioningOption;
//!
//! # fn main() -> docver_common::Result<()> {
//! let session = Session::in_memory(VersioningService::default());
//! let doc = session.create_document(Document::new("report", "File"))?;
//! assert_eq!(doc.version_label(), "0.0");
//!
//! session.check_in(doc.id, Some(VersioningOption::Minor), None)?;
//! assert_eq!(session.version_label(doc.id)?, "0.1");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod events;
pub mod session;
pub mod store;
pub mod versioning;

pub use config::VersioningConfig;
pub use document::{Document, Proxy, ProxyTarget, ShallowDocument, Version};
pub use events::{DocumentEvent, EventBus};
pub use session::{SaveOptions, Session};
pub use store::{DocumentStore, MemoryStore};
