//! Versioning engine
//!
//! - `label`: display labels of version states
//! - `restriction`: allowed options per document type and lifecycle state
//! - `expression`: filter condition normalization and evaluation
//! - `filter` / `policy`: automatic versioning rules
//! - `service`: the checkout/checkin state machine
//! - `orphan`: asynchronous purge of unreachable versions

pub mod expression;
pub mod filter;
pub mod label;
pub mod orphan;
pub mod policy;
pub mod restriction;
pub mod service;

pub use expression::{normalize_condition, Condition};
pub use filter::{NamedFilter, StandardVersioningFilter, VersioningFilter};
pub use label::format_version_label;
pub use orphan::{
    OrphanVersionRemovalFilter, OrphanVersionRemovalPolicy, OrphanVersionRemover, TypeOrphanFilter,
};
pub use policy::{InitialState, VersioningPolicies, VersioningPolicy};
pub use restriction::{RestrictionRule, VersioningRestrictions};
pub use service::{CustomFilters, LifecycleChange, SaveOptions, SaveOutcome, VersioningService};
