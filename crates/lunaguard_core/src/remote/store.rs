//! Entity-level backend access scoped to the current identity.

use super::error::{RemoteError, RemoteResult};
use super::rows::RemoteRecord;
use super::transport::{DeleteQuery, RemoteTransport, SelectQuery};
use crate::model::entity::Entity;
use crate::ports::identity::IdentityProvider;
use serde_json::Value;
use std::sync::Arc;

/// Remote adapter built once per session and injected into the coordinator.
pub struct RemoteStore<T: RemoteTransport> {
    transport: T,
    identity: Arc<dyn IdentityProvider>,
}

impl<T: RemoteTransport> RemoteStore<T> {
    pub fn new(transport: T, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            transport,
            identity,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.identity.current_user_id()
    }

    /// Lists records of `E`, newest first.
    ///
    /// A single undecodable row fails the whole call with `Schema`; partial
    /// remote sets would otherwise replace the local cache.
    pub fn list<E: RemoteRecord>(&self) -> RemoteResult<Vec<E>> {
        let table = E::KIND.table();
        let query = SelectQuery::recent(table, self.current_user_id());
        let rows = self.transport.select(&query)?;

        rows.into_iter()
            .map(|row| decode_row::<E>(table, row))
            .collect()
    }

    /// Inserts or replaces `record` by id.
    pub fn upsert<E: RemoteRecord>(&self, record: &E) -> RemoteResult<()> {
        let table = E::KIND.table();
        let user_id = self.current_user_id();
        let row = serde_json::to_value(record.to_row(user_id.as_deref()))
            .map_err(|err| RemoteError::schema(table, err.to_string()))?;
        self.transport.upsert(table, row)
    }

    /// Deletes the row with `id`. Deleting an absent row succeeds.
    pub fn delete<E: Entity>(&self, id: &str) -> RemoteResult<()> {
        let query = DeleteQuery {
            table: E::KIND.table(),
            id: id.to_string(),
            user_id: self.current_user_id(),
        };
        self.transport.delete(&query)
    }
}

fn decode_row<E: RemoteRecord>(table: &str, row: Value) -> RemoteResult<E> {
    let row: E::Row =
        serde_json::from_value(row).map_err(|err| RemoteError::schema(table, err.to_string()))?;
    E::from_row(row).map_err(|cause| RemoteError::schema(table, cause))
}
