//! Flutter-facing bindings for `lunaguard_core`.

pub mod api;
