use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shown when the API sends no condition descriptor.
pub const NO_DESCRIPTION: &str = "No description";

/// A (latitude, longitude) pair in signed degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Best,
}

/// Parameters for one location query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub accuracy: Accuracy,
    pub timeout: Duration,
}

impl LocationRequest {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self { accuracy: Accuracy::Medium, timeout: Self::DEFAULT_TIMEOUT }
    }
}

/// Current conditions parsed from one API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: Option<String>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: i32,
    pub description: String,
    pub wind_speed_ms: f64,
}
