//! Hosted backend adapter.
//!
//! # Responsibility
//! - Translate entity operations into table-level backend calls scoped to the
//!   current identity.
//! - Map backend rows to and from entity shapes.
//!
//! # Invariants
//! - Every call returns `RemoteResult`; nothing here panics or retries.
//! - One upsert/delete touches exactly one row and is atomic at row level.
//! - Timeouts surface as `RemoteError::Network`, same as any transport failure.

mod error;
mod rest;
mod rows;
mod store;
mod transport;

pub use error::{RemoteError, RemoteErrorKind, RemoteResult};
pub use rest::RestTransport;
pub use rows::{ContactRow, PeriodRow, RemoteRecord, SosAlertRow};
pub use store::RemoteStore;
pub use transport::{DeleteQuery, RemoteTransport, SelectQuery};
