//! Domain model for cycle tracking and personal-safety records.
//!
//! # Responsibility
//! - Define the three persisted entity shapes and their invariants.
//! - Provide the shared `Entity` contract used by cache, remote and sync layers.
//!
//! # Invariants
//! - Every entity is identified by an opaque, stable string id.
//! - Validation runs before any store is touched; invalid records never persist.
//! - `SosEvent` is append-only apart from its resolution state.

pub mod contact;
pub mod entity;
pub mod period;
pub mod sos;
pub mod validation;
