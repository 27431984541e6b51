//! docver Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging and error handling for the docver workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all docver workspace members:
//!
//! - **Error Handling**: [`DocverError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber bootstrap ([`logging`])
//! - **Types**: versioning value types shared by the engine and the CLI
//!
//! # Example
//!
//! ```
//! use docver_common::types::{VersionState, VersioningOption};
//!
//! let state = VersionState::new(1, 4, true);
//! let next = state.bumped(VersioningOption::Minor);
//! assert_eq!((next.major, next.minor), (1, 5));
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{DocverError, Result};
pub use types::{Transition, VersionState, VersioningOption};
