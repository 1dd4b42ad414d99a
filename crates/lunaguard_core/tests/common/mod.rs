#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lunaguard_core::model::contact::{EmergencyContact, NewContact};
use lunaguard_core::ports::clock::FixedClock;
use lunaguard_core::ports::geo::{GeoError, GeolocationProvider, Position};
use lunaguard_core::ports::identity::StaticIdentity;
use lunaguard_core::ports::ids::SequentialIdGenerator;
use lunaguard_core::ports::notify::{Notice, NoticeLevel, Notifier};
use lunaguard_core::remote::{
    DeleteQuery, RemoteError, RemoteResult, RemoteStore, RemoteTransport, SelectQuery,
};
use lunaguard_core::{Capabilities, SqliteLocalCache, SyncCoordinator};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const USER_ID: &str = "user-1";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// How the fake backend answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Online,
    /// Every call fails as if the host were unreachable.
    Offline,
    /// Every call fails with HTTP 401.
    Unauthorized,
}

#[derive(Debug, Default)]
struct FakeState {
    tables: HashMap<&'static str, Vec<Value>>,
    backend: Option<Backend>,
    calls: Vec<String>,
    last_select: Option<SelectQuery>,
    last_delete: Option<DeleteQuery>,
}

/// In-memory backend shared between the test and the store under test.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn set_backend(&self, backend: Backend) {
        self.state.lock().unwrap().backend = Some(backend);
    }

    /// Seeds raw rows, stored as given.
    pub fn seed(&self, table: &'static str, rows: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .tables
            .entry(table)
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &'static str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_select(&self) -> Option<SelectQuery> {
        self.state.lock().unwrap().last_select.clone()
    }

    pub fn last_delete(&self) -> Option<DeleteQuery> {
        self.state.lock().unwrap().last_delete.clone()
    }

    fn check(state: &FakeState, table: &str) -> RemoteResult<()> {
        match state.backend.unwrap_or(Backend::Online) {
            Backend::Online => Ok(()),
            Backend::Offline => Err(RemoteError::network(table, "connection refused")),
            Backend::Unauthorized => Err(RemoteError::from_status(table, 401, "JWT expired")),
        }
    }
}

fn matches_user(row: &Value, user_id: Option<&str>) -> bool {
    match user_id {
        Some(user_id) => row.get("user_id").and_then(Value::as_str) == Some(user_id),
        None => true,
    }
}

impl RemoteTransport for FakeTransport {
    fn select(&self, query: &SelectQuery) -> RemoteResult<Vec<Value>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("select:{}", query.table));
        state.last_select = Some(query.clone());
        Self::check(&state, query.table)?;

        let mut rows: Vec<Value> = state
            .tables
            .get(query.table)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| matches_user(row, query.user_id.as_deref()))
            .collect();
        rows.sort_by(|a, b| {
            let a = a.get(query.order_by).and_then(Value::as_str).unwrap_or("");
            let b = b.get(query.order_by).and_then(Value::as_str).unwrap_or("");
            if query.descending {
                b.cmp(a)
            } else {
                a.cmp(b)
            }
        });
        Ok(rows)
    }

    fn upsert(&self, table: &'static str, row: Value) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("upsert:{table}"));
        Self::check(&state, table)?;

        let rows = state.tables.entry(table).or_default();
        let id = row.get("id").cloned();
        match rows.iter_mut().find(|existing| existing.get("id").cloned() == id) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        Ok(())
    }

    fn delete(&self, query: &DeleteQuery) -> RemoteResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete:{}", query.table));
        state.last_delete = Some(query.clone());
        Self::check(&state, query.table)?;

        if let Some(rows) = state.tables.get_mut(query.table) {
            rows.retain(|row| {
                !(row.get("id").and_then(Value::as_str) == Some(query.id.as_str())
                    && matches_user(row, query.user_id.as_deref()))
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|notice| notice.level == level)
            .map(|notice| notice.message)
            .collect()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Returns scripted fixes in order, then repeats `fallback`.
#[derive(Debug)]
pub struct ScriptedGeo {
    script: Mutex<VecDeque<Result<Position, GeoError>>>,
    fallback: Result<Position, GeoError>,
    requests: Mutex<usize>,
}

impl ScriptedGeo {
    pub fn fixed(position: Position) -> Self {
        Self::new(Vec::new(), Ok(position))
    }

    pub fn denied() -> Self {
        Self::new(Vec::new(), Err(GeoError::PermissionDenied))
    }

    pub fn new(
        script: Vec<Result<Position, GeoError>>,
        fallback: Result<Position, GeoError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            requests: Mutex::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

impl GeolocationProvider for ScriptedGeo {
    fn current_position(&self) -> Result<Position, GeoError> {
        *self.requests.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn position() -> Position {
    Position {
        latitude: 12.823,
        longitude: 80.0444,
        accuracy: 850.0,
    }
}

pub type TestCoordinator = SyncCoordinator<FakeTransport, SqliteLocalCache>;

pub struct Harness {
    pub transport: FakeTransport,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub coordinator: TestCoordinator,
}

pub fn harness() -> Harness {
    harness_with(StaticIdentity::signed_in(USER_ID), SqliteLocalCache::open_in_memory().unwrap())
}

pub fn harness_with(identity: StaticIdentity, cache: SqliteLocalCache) -> Harness {
    let transport = FakeTransport::default();
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(FixedClock::new(now()));
    let capabilities = Capabilities {
        clock: clock.clone(),
        ids: Arc::new(SequentialIdGenerator::new("id")),
        notifier: notifier.clone(),
    };
    let remote = RemoteStore::new(transport.clone(), Arc::new(identity));
    Harness {
        transport,
        notifier,
        clock,
        coordinator: SyncCoordinator::new(remote, cache, capabilities),
    }
}

pub fn contact(id: &str, name: &str, phone: Option<&str>, email: Option<&str>) -> EmergencyContact {
    EmergencyContact::new(
        id,
        NewContact {
            name: name.to_string(),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            relationship: None,
        },
        now(),
    )
}
