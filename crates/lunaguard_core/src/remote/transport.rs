//! Table-level transport seam.

use super::error::RemoteResult;
use serde_json::Value;

/// Ordered, optionally user-scoped table read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub table: &'static str,
    pub order_by: &'static str,
    pub descending: bool,
    pub user_id: Option<String>,
}

impl SelectQuery {
    /// Newest rows first.
    pub fn recent(table: &'static str, user_id: Option<String>) -> Self {
        Self {
            table,
            order_by: "created_at",
            descending: true,
            user_id,
        }
    }
}

/// Single-row delete, optionally user-scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteQuery {
    pub table: &'static str,
    pub id: String,
    pub user_id: Option<String>,
}

/// Raw JSON row access to the backend.
///
/// Implementations perform exactly one request per call and never retry.
pub trait RemoteTransport: Send {
    fn select(&self, query: &SelectQuery) -> RemoteResult<Vec<Value>>;

    /// Inserts or replaces one row keyed by its `id` column.
    fn upsert(&self, table: &'static str, row: Value) -> RemoteResult<()>;

    fn delete(&self, query: &DeleteQuery) -> RemoteResult<()>;
}
