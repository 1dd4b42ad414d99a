//! Geolocation contract.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub accuracy: f64,
}

impl Position {
    /// Map link for sharing a fix with contacts.
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    PermissionDenied,
    Unavailable(String),
}

impl Display for GeoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "location permission denied"),
            Self::Unavailable(reason) => write!(f, "location unavailable: {reason}"),
        }
    }
}

impl Error for GeoError {}

pub trait GeolocationProvider: Send + Sync {
    /// Requests a one-shot position fix.
    fn current_position(&self) -> Result<Position, GeoError>;
}
