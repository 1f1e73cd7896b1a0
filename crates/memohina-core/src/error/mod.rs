//! Error types for Memohina
//!
//! The crate-wide [`HinaError`] implements [`UnifiedError`], which gives every
//! error a stable code, a message, optional context and a retry hint.
//! Component errors ([`PersistenceError`], [`RemoteStoreError`],
//! [`ExportError`]) stay precise at their call sites and convert into
//! `HinaError` at the command and CLI layers.

mod constructors;
mod conversions;
mod domain;
mod types;
mod unified_error;

pub use domain::{ExportError, PersistenceError, RemoteStoreError};
pub use types::{HinaError, HinaResult, UnifiedError};
