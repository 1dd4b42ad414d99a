//! Collaborator contracts consumed by the core.
//!
//! # Responsibility
//! - Abstract wall-clock time, id generation, identity, user notices and
//!   geolocation behind injectable traits.
//! - Provide production implementations plus deterministic ones for tests.
//!
//! # Invariants
//! - All port traits are `Send + Sync` so they can be shared with the
//!   position sampler thread.

pub mod clock;
pub mod geo;
pub mod identity;
pub mod ids;
pub mod notify;
