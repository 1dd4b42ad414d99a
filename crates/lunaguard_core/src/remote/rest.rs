//! PostgREST transport over blocking HTTP.
//!
//! # Invariants
//! - One HTTP request per call; the agent timeout bounds every request.
//! - 401/403 map to `RemoteError::Auth`, other statuses to `Rejected`,
//!   transport failures (including timeouts) to `Network`.

use super::error::{RemoteError, RemoteResult};
use super::transport::{DeleteQuery, RemoteTransport, SelectQuery};
use crate::config::RemoteConfig;
use log::{debug, warn};
use serde_json::Value;
use std::time::{Duration, Instant};

const REST_PREFIX: &str = "rest/v1";
const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct RestTransport {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl RestTransport {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        let bearer = config
            .access_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .unwrap_or_else(|| config.api_key.clone());
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            bearer,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{REST_PREFIX}/{table}", self.base_url)
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.bearer))
    }
}

impl RemoteTransport for RestTransport {
    fn select(&self, query: &SelectQuery) -> RemoteResult<Vec<Value>> {
        let started_at = Instant::now();
        let direction = if query.descending { "desc" } else { "asc" };
        let mut request = self
            .authorize(self.agent.get(&self.table_url(query.table)))
            .query("select", "*")
            .query("order", &format!("{}.{direction}", query.order_by));
        if let Some(user_id) = &query.user_id {
            request = request.query("user_id", &format!("eq.{user_id}"));
        }

        let response = request
            .call()
            .map_err(|err| map_error(query.table, "select", err))?;
        let rows: Vec<Value> = response
            .into_json()
            .map_err(|err| RemoteError::schema(query.table, err.to_string()))?;

        debug!(
            "event=remote_call module=remote status=ok op=select table={} rows={} duration_ms={}",
            query.table,
            rows.len(),
            started_at.elapsed().as_millis()
        );
        Ok(rows)
    }

    fn upsert(&self, table: &'static str, row: Value) -> RemoteResult<()> {
        let started_at = Instant::now();
        self.authorize(self.agent.post(&self.table_url(table)))
            .query("on_conflict", "id")
            .set("Prefer", "resolution=merge-duplicates,return=minimal")
            .send_json(row)
            .map_err(|err| map_error(table, "upsert", err))?;

        debug!(
            "event=remote_call module=remote status=ok op=upsert table={table} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn delete(&self, query: &DeleteQuery) -> RemoteResult<()> {
        let started_at = Instant::now();
        let mut request = self
            .authorize(self.agent.delete(&self.table_url(query.table)))
            .query("id", &format!("eq.{}", query.id));
        if let Some(user_id) = &query.user_id {
            request = request.query("user_id", &format!("eq.{user_id}"));
        }
        request
            .call()
            .map_err(|err| map_error(query.table, "delete", err))?;

        debug!(
            "event=remote_call module=remote status=ok op=delete table={} duration_ms={}",
            query.table,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn map_error(table: &str, op: &str, err: ureq::Error) -> RemoteError {
    let mapped = match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            RemoteError::from_status(table, status, truncate(&body))
        }
        ureq::Error::Transport(transport) => RemoteError::network(table, transport.to_string()),
    };
    warn!(
        "event=remote_call module=remote status=error op={op} table={table} error_code={}",
        mapped.kind().code()
    );
    mapped
}

fn truncate(body: &str) -> String {
    let single_line = body.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= MAX_ERROR_BODY_CHARS {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(MAX_ERROR_BODY_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{truncate, RestTransport, MAX_ERROR_BODY_CHARS};
    use crate::config::RemoteConfig;
    use crate::remote::{RemoteErrorKind, RemoteTransport, SelectQuery};

    fn config(base_url: &str) -> RemoteConfig {
        RemoteConfig {
            base_url: base_url.to_string(),
            api_key: "anon-key".to_string(),
            access_token: None,
            timeout_secs: 1,
        }
    }

    #[test]
    fn table_url_strips_trailing_slash() {
        let transport = RestTransport::new(&config("https://example.supabase.co/"));
        assert_eq!(
            transport.table_url("period_data"),
            "https://example.supabase.co/rest/v1/period_data"
        );
    }

    #[test]
    fn bearer_falls_back_to_api_key() {
        let transport = RestTransport::new(&config("https://example.supabase.co"));
        assert_eq!(transport.bearer, "anon-key");

        let mut with_token = config("https://example.supabase.co");
        with_token.access_token = Some("user-jwt".to_string());
        let transport = RestTransport::new(&with_token);
        assert_eq!(transport.bearer, "user-jwt");
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        // Port 9 (discard) on loopback is closed on test hosts.
        let transport = RestTransport::new(&config("http://127.0.0.1:9"));
        let err = transport
            .select(&SelectQuery::recent("emergency_contacts", None))
            .expect_err("closed port must fail");
        assert_eq!(err.kind(), RemoteErrorKind::Network);
        assert_eq!(err.table(), "emergency_contacts");
    }

    #[test]
    fn truncate_caps_and_flattens_error_bodies() {
        let long = "x\n".repeat(MAX_ERROR_BODY_CHARS);
        let cut = truncate(&long);
        assert!(!cut.contains('\n'));
        assert!(cut.ends_with("..."));
    }
}
