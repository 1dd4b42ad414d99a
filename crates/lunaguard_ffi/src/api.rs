//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hold the single process-wide sync session.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call returns a plain envelope; failures are reported in `message`.
//! - Calls that need a session fail softly until `open_session` succeeds.

use chrono::NaiveDate;
use lunaguard_core::model::period::{PeriodRecord, CYCLE_LENGTH_RANGE};
use lunaguard_core::ports::geo::{GeoError, GeolocationProvider, Position};
use lunaguard_core::ports::identity::StaticIdentity;
use lunaguard_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    try_predict_cycle, AppConfig, Capabilities, CycleForecast, DataSource, EmergencyContact,
    LoggingConfig, NewContact, PeriodService, RemoteStore, RestTransport, SafetyService,
    SqliteLocalCache, SyncCoordinator, SyncOutcome, ValidationError, DEFAULT_TRACKING_INTERVAL,
};
use log::info;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

const DATE_FORMAT: &str = "%Y-%m-%d";

type Session = SyncCoordinator<RestTransport, SqliteLocalCache>;

static SESSION: OnceLock<Mutex<Option<Session>>> = OnceLock::new();
static TRACKED_FIX: OnceLock<Arc<SharedPosition>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let config = LoggingConfig {
        level,
        dir: PathBuf::from(log_dir.trim()),
    };
    match init_logging_inner(&config) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation completed (possibly only locally).
    pub ok: bool,
    /// Id of the affected record, when there is one.
    pub id: Option<String>,
    /// `remote` or `local`; absent on failure.
    pub source: Option<String>,
    /// User-facing warnings raised on the way.
    pub warnings: Vec<String>,
    pub message: String,
}

impl ActionResponse {
    fn completed<T>(
        message: impl Into<String>,
        id: Option<String>,
        outcome: &SyncOutcome<T>,
    ) -> Self {
        Self {
            ok: true,
            id,
            source: Some(outcome.source.as_str().to_string()),
            warnings: warning_messages(outcome),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            source: None,
            warnings: Vec::new(),
            message: message.into(),
        }
    }
}

/// Period record as exchanged with Dart. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodView {
    pub id: String,
    pub last_period_start_date: String,
    pub cycle_length: u32,
    pub period_length: u32,
    pub symptoms: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodResponse {
    pub ok: bool,
    pub record: Option<PeriodView>,
    pub source: Option<String>,
    pub warnings: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastResponse {
    pub ok: bool,
    pub next_period_date: String,
    pub days_until_next_period: i64,
    pub ovulation_date: String,
    pub fertility_window_start: String,
    pub fertility_window_end: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactView {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsResponse {
    pub ok: bool,
    pub items: Vec<ContactView>,
    pub source: Option<String>,
    pub warnings: Vec<String>,
    pub message: String,
}

/// Tracking state after a start, report or stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingResponse {
    pub ok: bool,
    /// Whether the sampler is still running.
    pub active: bool,
    /// Samples saved by this call.
    pub saved: u32,
    /// Map link for the fix currently being shared.
    pub maps_url: Option<String>,
    pub source: Option<String>,
    pub warnings: Vec<String>,
    pub message: String,
}

impl TrackingResponse {
    fn completed(active: bool, outcome: &SyncOutcome<usize>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            active,
            saved: u32::try_from(outcome.value).unwrap_or(u32::MAX),
            maps_url: tracked_fix().current().ok().map(|position| position.maps_url()),
            source: Some(outcome.source.as_str().to_string()),
            warnings: warning_messages(outcome),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            active: false,
            saved: 0,
            maps_url: None,
            source: None,
            warnings: Vec::new(),
            message: message.into(),
        }
    }
}

/// Opens the process-wide session from a TOML config file.
///
/// `user_id` is the signed-in user, if any. Re-opening replaces the previous
/// session.
#[flutter_rust_bridge::frb(sync)]
pub fn open_session(config_path: String, user_id: Option<String>) -> ActionResponse {
    let config = match AppConfig::load(config_path.trim()) {
        Ok(config) => config,
        Err(err) => return ActionResponse::failure(format!("open_session failed: {err}")),
    };
    if let Some(logging) = &config.logging {
        if let Err(err) = init_logging_inner(logging) {
            return ActionResponse::failure(format!("open_session failed: {err}"));
        }
    }

    let cache = match SqliteLocalCache::open(&config.cache.path) {
        Ok(cache) => cache.with_quota(config.cache.quota_bytes),
        Err(err) => return ActionResponse::failure(format!("open_session failed: {err}")),
    };
    let identity = match user_id {
        Some(id) => StaticIdentity::signed_in(id),
        None => StaticIdentity::anonymous(),
    };
    let remote = RemoteStore::new(RestTransport::new(&config.remote), Arc::new(identity));
    let coordinator = SyncCoordinator::new(remote, cache, Capabilities::system());

    let mut guard = session_slot()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(previous) = guard.as_mut() {
        SafetyService::new(previous).stop_tracking();
    }
    *guard = Some(coordinator);
    info!("event=session_open module=ffi status=ok");

    ActionResponse {
        ok: true,
        id: None,
        source: None,
        warnings: Vec::new(),
        message: "Session opened.".to_string(),
    }
}

/// Loads period history and returns the record the tracker should edit.
#[flutter_rust_bridge::frb(sync)]
pub fn period_current() -> PeriodResponse {
    let result = with_session(|session| {
        let outcome = PeriodService::new(session).current_period();
        PeriodResponse {
            ok: true,
            record: Some(to_period_view(&outcome.value)),
            source: Some(outcome.source.as_str().to_string()),
            warnings: warning_messages(&outcome),
            message: String::new(),
        }
    });
    result.unwrap_or_else(|message| PeriodResponse {
        ok: false,
        record: None,
        source: None,
        warnings: Vec::new(),
        message,
    })
}

/// Saves a period record to the backend and the device.
#[flutter_rust_bridge::frb(sync)]
pub fn period_save(view: PeriodView) -> ActionResponse {
    let result = with_session(|session| {
        let mut service = PeriodService::new(session);
        let existing = service.find_period(view.id.trim());
        let record = match from_period_view(&view, existing, service.now()) {
            Ok(record) => record,
            Err(message) => return ActionResponse::failure(message),
        };
        match service.save_period(record) {
            Ok(outcome) => ActionResponse::completed(
                "Period data saved.",
                Some(outcome.value.id.clone()),
                &outcome,
            ),
            Err(err) => ActionResponse::failure(err.to_string()),
        }
    });
    result.unwrap_or_else(ActionResponse::failure)
}

/// Pure forecast; does not need a session.
///
/// `today` defaults to the current UTC date.
#[flutter_rust_bridge::frb(sync)]
pub fn cycle_forecast(
    last_period_start_date: String,
    cycle_length: u32,
    today: Option<String>,
) -> ForecastResponse {
    let parsed = parse_date(&last_period_start_date).and_then(|start| {
        let today = match today.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => chrono::Utc::now().date_naive(),
        };
        checked_forecast(start, cycle_length, today).map_err(|err| err.to_string())
    });
    match parsed {
        Ok(forecast) => ForecastResponse {
            ok: true,
            next_period_date: format_date(forecast.next_period_date),
            days_until_next_period: forecast.days_until_next_period,
            ovulation_date: format_date(forecast.ovulation_date),
            fertility_window_start: format_date(forecast.fertility_window_start),
            fertility_window_end: format_date(forecast.fertility_window_end),
            message: String::new(),
        },
        Err(message) => ForecastResponse {
            ok: false,
            next_period_date: String::new(),
            days_until_next_period: 0,
            ovulation_date: String::new(),
            fertility_window_start: String::new(),
            fertility_window_end: String::new(),
            message,
        },
    }
}

fn checked_forecast(
    start: NaiveDate,
    cycle_length: u32,
    today: NaiveDate,
) -> Result<CycleForecast, ValidationError> {
    if !CYCLE_LENGTH_RANGE.contains(&cycle_length) {
        return Err(ValidationError::CycleLengthOutOfRange(cycle_length));
    }
    try_predict_cycle(start, cycle_length, today).ok_or(ValidationError::DateOutOfRange(start))
}

#[flutter_rust_bridge::frb(sync)]
pub fn contacts_list() -> ContactsResponse {
    let result = with_session(|session| {
        let outcome = SafetyService::new(session).contacts();
        ContactsResponse {
            ok: true,
            items: outcome.value.iter().map(to_contact_view).collect(),
            source: Some(outcome.source.as_str().to_string()),
            warnings: warning_messages(&outcome),
            message: String::new(),
        }
    });
    result.unwrap_or_else(|message| ContactsResponse {
        ok: false,
        items: Vec::new(),
        source: None,
        warnings: Vec::new(),
        message,
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn contact_add(
    name: String,
    phone: Option<String>,
    email: Option<String>,
    relationship: Option<String>,
) -> ActionResponse {
    let input = NewContact {
        name,
        phone,
        email,
        relationship,
    };
    let result = with_session(|session| match SafetyService::new(session).add_contact(input) {
        Ok(outcome) => ActionResponse::completed(
            "Emergency contact added.",
            Some(outcome.value.id.clone()),
            &outcome,
        ),
        Err(err) => ActionResponse::failure(err.to_string()),
    });
    result.unwrap_or_else(ActionResponse::failure)
}

#[flutter_rust_bridge::frb(sync)]
pub fn contact_delete(id: String) -> ActionResponse {
    let result = with_session(|session| {
        let outcome = SafetyService::new(session).remove_contact(id.trim());
        ActionResponse::completed("Contact removed.", Some(id.trim().to_string()), &outcome)
    });
    result.unwrap_or_else(ActionResponse::failure)
}

/// Records an SOS alert at a position the Dart side already obtained.
///
/// `permission_denied = true` reports a refused location request instead.
#[flutter_rust_bridge::frb(sync)]
pub fn sos_send(
    message: Option<String>,
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    permission_denied: bool,
) -> ActionResponse {
    let fix = ReportedPosition {
        result: if permission_denied {
            Err(GeoError::PermissionDenied)
        } else {
            Ok(Position {
                latitude,
                longitude,
                accuracy,
            })
        },
    };
    let result = with_session(|session| {
        match SafetyService::new(session).send_alert(message.as_deref(), &fix) {
            Ok(outcome) => {
                ActionResponse::completed("Alert sent.", Some(outcome.value.id.clone()), &outcome)
            }
            Err(err) => ActionResponse::failure(err.to_string()),
        }
    });
    result.unwrap_or_else(ActionResponse::failure)
}

#[flutter_rust_bridge::frb(sync)]
pub fn sos_resolve(id: String) -> ActionResponse {
    let result = with_session(|session| match SafetyService::new(session).resolve_alert(id.trim()) {
        Ok(outcome) => {
            ActionResponse::completed("Alert resolved.", Some(outcome.value.id.clone()), &outcome)
        }
        Err(err) => ActionResponse::failure(err.to_string()),
    });
    result.unwrap_or_else(ActionResponse::failure)
}

/// Starts background tracking from a fix the Dart side already obtained.
///
/// The sampler re-reads the latest reported fix every `interval_secs`
/// seconds; 0 selects the default interval.
#[flutter_rust_bridge::frb(sync)]
pub fn tracking_start(
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    interval_secs: u64,
) -> TrackingResponse {
    let fix = tracked_fix();
    fix.report(Ok(Position {
        latitude,
        longitude,
        accuracy,
    }));
    let interval = match interval_secs {
        0 => DEFAULT_TRACKING_INTERVAL,
        secs => Duration::from_secs(secs),
    };
    let provider: Arc<dyn GeolocationProvider> = Arc::<SharedPosition>::clone(fix);
    let result = with_session(|session| {
        let mut service = SafetyService::new(session);
        match service.start_tracking(provider, interval) {
            Ok(()) => TrackingResponse::completed(
                true,
                &SyncOutcome::new(0, DataSource::Remote),
                "Location tracking enabled.",
            ),
            Err(err) => TrackingResponse::failure(err.to_string()),
        }
    });
    result.unwrap_or_else(TrackingResponse::failure)
}

/// Reports the newest fix and saves every sample taken so far.
///
/// `permission_denied = true` reports a revoked permission instead; the
/// sampler stops at its next tick.
#[flutter_rust_bridge::frb(sync)]
pub fn tracking_report_position(
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    permission_denied: bool,
) -> TrackingResponse {
    tracked_fix().report(if permission_denied {
        Err(GeoError::PermissionDenied)
    } else {
        Ok(Position {
            latitude,
            longitude,
            accuracy,
        })
    });
    let result = with_session(|session| {
        let mut service = SafetyService::new(session);
        let outcome = service.pump_tracking(Duration::ZERO);
        TrackingResponse::completed(service.is_tracking(), &outcome, "")
    });
    result.unwrap_or_else(TrackingResponse::failure)
}

#[flutter_rust_bridge::frb(sync)]
pub fn tracking_stop() -> TrackingResponse {
    let result = with_session(|session| {
        let outcome = SafetyService::new(session).stop_tracking();
        TrackingResponse::completed(false, &outcome, "Location tracking disabled.")
    });
    result.unwrap_or_else(TrackingResponse::failure)
}

/// Latest fix reported by the host platform, read by the tracking sampler.
struct SharedPosition {
    latest: Mutex<Result<Position, GeoError>>,
}

impl SharedPosition {
    fn new() -> Self {
        Self {
            latest: Mutex::new(Err(GeoError::Unavailable(
                "no position reported yet".to_string(),
            ))),
        }
    }

    fn report(&self, fix: Result<Position, GeoError>) {
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fix;
    }

    fn current(&self) -> Result<Position, GeoError> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl GeolocationProvider for SharedPosition {
    fn current_position(&self) -> Result<Position, GeoError> {
        self.current()
    }
}

fn tracked_fix() -> &'static Arc<SharedPosition> {
    TRACKED_FIX.get_or_init(|| Arc::new(SharedPosition::new()))
}

/// One-shot provider wrapping a fix obtained by the host platform.
struct ReportedPosition {
    result: Result<Position, GeoError>,
}

impl GeolocationProvider for ReportedPosition {
    fn current_position(&self) -> Result<Position, GeoError> {
        self.result.clone()
    }
}

fn session_slot() -> &'static Mutex<Option<Session>> {
    SESSION.get_or_init(|| Mutex::new(None))
}

fn with_session<R>(f: impl FnOnce(&mut Session) -> R) -> Result<R, String> {
    let mut guard = session_slot()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.as_mut() {
        Some(session) => Ok(f(session)),
        None => Err("no open session; call open_session first".to_string()),
    }
}

fn warning_messages<T>(outcome: &SyncOutcome<T>) -> Vec<String> {
    outcome
        .warnings
        .iter()
        .map(|warning| warning.user_message())
        .collect()
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|err| format!("invalid date `{}`: {err}", raw.trim()))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn to_period_view(record: &PeriodRecord) -> PeriodView {
    PeriodView {
        id: record.id.clone(),
        last_period_start_date: format_date(record.last_period_start_date),
        cycle_length: record.cycle_length,
        period_length: record.period_length,
        symptoms: record.symptoms.clone(),
        notes: record.notes.clone(),
    }
}

fn from_period_view(
    view: &PeriodView,
    existing: Option<PeriodRecord>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<PeriodRecord, String> {
    let start = parse_date(&view.last_period_start_date)?;
    let mut record = existing.unwrap_or_else(|| PeriodRecord::new(view.id.trim(), start, now));
    record.last_period_start_date = start;
    record.cycle_length = view.cycle_length;
    record.period_length = view.period_length;
    record.symptoms.clear();
    for symptom in &view.symptoms {
        record.add_symptom(symptom).map_err(|err| err.to_string())?;
    }
    record.notes = view.notes.clone();
    Ok(record)
}

fn to_contact_view(contact: &EmergencyContact) -> ContactView {
    ContactView {
        id: contact.id.clone(),
        name: contact.name.clone(),
        phone: contact.phone.clone(),
        email: contact.email.clone(),
        relationship: contact.relationship.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        checked_forecast, contacts_list, core_version, cycle_forecast, from_period_view,
        init_logging, ping, tracking_stop, PeriodView, SharedPosition, TrackingResponse,
    };
    use lunaguard_core::ports::geo::{GeoError, GeolocationProvider, Position};
    use lunaguard_core::{DataSource, SyncOutcome};
    use chrono::{NaiveDate, TimeZone, Utc};
    use lunaguard_core::ValidationError;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn cycle_forecast_formats_dates() {
        let response = cycle_forecast(
            "2024-01-01".to_string(),
            28,
            Some("2024-01-10".to_string()),
        );
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.next_period_date, "2024-01-29");
        assert_eq!(response.days_until_next_period, 19);
        assert_eq!(response.fertility_window_start, "2023-12-27");
        assert_eq!(response.fertility_window_end, "2024-01-02");
    }

    #[test]
    fn cycle_forecast_rejects_bad_dates() {
        let response = cycle_forecast("01/01/2024".to_string(), 28, None);
        assert!(!response.ok);
        assert!(response.message.contains("invalid date"));
    }

    #[test]
    fn cycle_forecast_rejects_lengths_outside_range() {
        let huge = cycle_forecast(
            "2024-01-01".to_string(),
            u32::MAX,
            Some("2024-01-10".to_string()),
        );
        assert!(!huge.ok);
        assert!(huge.message.contains("cycle length"), "{}", huge.message);
        assert!(huge.next_period_date.is_empty());

        let short = cycle_forecast("2024-01-01".to_string(), 20, None);
        assert!(!short.ok);
        assert!(cycle_forecast("2024-01-01".to_string(), 21, None).ok);
    }

    #[test]
    fn forecast_at_calendar_edge_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            checked_forecast(NaiveDate::MAX, 28, today),
            Err(ValidationError::DateOutOfRange(NaiveDate::MAX))
        );
    }

    #[test]
    fn contacts_list_without_session_fails_softly() {
        let response = contacts_list();
        if !response.ok {
            assert!(response.message.contains("open_session"));
        }
    }

    #[test]
    fn from_period_view_rejects_blank_symptoms() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let view = PeriodView {
            id: "p-1".to_string(),
            last_period_start_date: "2024-01-01".to_string(),
            cycle_length: 30,
            period_length: 4,
            symptoms: vec!["Cramps".to_string(), " ".to_string()],
            notes: String::new(),
        };
        assert!(from_period_view(&view, None, now).is_err());

        let mut valid = view.clone();
        valid.symptoms = vec!["Cramps".to_string(), "Cramps".to_string()];
        let record = from_period_view(&valid, None, now).unwrap();
        assert_eq!(record.symptoms, vec!["Cramps".to_string()]);
        assert_eq!(record.cycle_length, 30);
        assert_eq!(record.created_at, now);
    }

    #[test]
    fn shared_position_serves_the_latest_report() {
        let fix = SharedPosition::new();
        assert!(matches!(fix.current_position(), Err(GeoError::Unavailable(_))));

        let position = Position {
            latitude: 12.823,
            longitude: 80.0444,
            accuracy: 850.0,
        };
        fix.report(Ok(position));
        assert_eq!(fix.current_position(), Ok(position));
        assert_eq!(
            position.maps_url(),
            "https://www.google.com/maps?q=12.823,80.0444"
        );

        fix.report(Err(GeoError::PermissionDenied));
        assert_eq!(fix.current_position(), Err(GeoError::PermissionDenied));
    }

    #[test]
    fn tracking_response_counts_saved_samples() {
        let outcome = SyncOutcome::new(3, DataSource::Local);
        let response = TrackingResponse::completed(true, &outcome, "");
        assert!(response.ok);
        assert!(response.active);
        assert_eq!(response.saved, 3);
        assert_eq!(response.source.as_deref(), Some("local"));
    }

    #[test]
    fn tracking_stop_without_session_fails_softly() {
        let response = tracking_stop();
        if !response.ok {
            assert!(response.message.contains("open_session"));
            assert_eq!(response.saved, 0);
        }
    }
}
