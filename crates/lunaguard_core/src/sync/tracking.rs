//! Cancellable background position sampler.
//!
//! # Invariants
//! - The first sample is taken immediately, then one per interval.
//! - A provider failure is emitted once and ends sampling.
//! - `stop` prevents further samples; events already emitted stay readable.

use crate::ports::clock::Clock;
use crate::ports::geo::{GeoError, GeolocationProvider, Position};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const DEFAULT_TRACKING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    Sample {
        position: Position,
        sampled_at: DateTime<Utc>,
    },
    Failed(GeoError),
}

/// Owner of a running sampler thread.
pub struct TrackingHandle {
    stop_tx: Option<Sender<()>>,
    events: Receiver<TrackingEvent>,
    worker: Option<JoinHandle<()>>,
}

impl TrackingHandle {
    /// Spawns the sampler thread.
    pub fn start(
        provider: Arc<dyn GeolocationProvider>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (event_tx, events) = mpsc::channel::<TrackingEvent>();

        let worker = thread::Builder::new()
            .name("lunaguard-tracker".to_string())
            .spawn(move || {
                run_sampler(
                    provider.as_ref(),
                    clock.as_ref(),
                    interval,
                    &stop_rx,
                    &event_tx,
                );
            })?;

        info!(
            "event=tracking_start module=sync status=ok interval_ms={}",
            interval.as_millis()
        );
        Ok(Self {
            stop_tx: Some(stop_tx),
            events,
            worker: Some(worker),
        })
    }

    /// True until `stop` is called or the sampler ends on its own.
    pub fn is_active(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stops sampling and waits for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the sender wakes the sampler out of its wait.
        self.stop_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=tracking_stop module=sync status=error error_code=sampler_panicked");
                return;
            }
            info!("event=tracking_stop module=sync status=ok");
        }
    }

    /// Waits up to `timeout` for the next event. `None` on timeout or once
    /// the sampler has ended and every event was read.
    pub fn next_timeout(&self, timeout: Duration) -> Option<TrackingEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// All pending events, oldest first.
    pub fn drain(&self) -> Vec<TrackingEvent> {
        self.events.try_iter().collect()
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_sampler(
    provider: &dyn GeolocationProvider,
    clock: &dyn Clock,
    interval: Duration,
    stop_rx: &Receiver<()>,
    events: &Sender<TrackingEvent>,
) {
    loop {
        let event = match provider.current_position() {
            Ok(position) => TrackingEvent::Sample {
                position,
                sampled_at: clock.now(),
            },
            Err(err) => {
                warn!(
                    "event=tracking_sample module=sync status=error error_code={}",
                    geo_error_code(&err)
                );
                let _ = events.send(TrackingEvent::Failed(err));
                return;
            }
        };
        if events.send(event).is_err() {
            return;
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn geo_error_code(err: &GeoError) -> &'static str {
    match err {
        GeoError::PermissionDenied => "geo_permission_denied",
        GeoError::Unavailable(_) => "geo_unavailable",
    }
}
