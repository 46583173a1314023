//! `rbacsync-core`: shared building blocks for the reconciliation workspace.
//!
//! This crate contains **pure** primitives (no IO, no adapters).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{IdentityKey, RunId};
