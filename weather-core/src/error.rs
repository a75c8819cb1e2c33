//! Failure types for each pipeline stage.
//!
//! Every variant has two faces: `Display` carries the technical detail for the
//! diagnostic log, `user_message()` the text shown on screen.

use thiserror::Error;

/// Location stage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationFailure {
    #[error("geolocation is not supported by this location source")]
    Unsupported,

    #[error("location service is disabled")]
    Disabled,

    #[error("location permission has not been granted")]
    PermissionDenied,

    #[error("location lookup failed: {0}")]
    Other(String),
}

impl LocationFailure {
    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported => "Geolocation is not supported on this device.".to_string(),
            Self::Disabled => {
                "Geolocation is not enabled. Please enable location services.".to_string()
            }
            Self::PermissionDenied => {
                "Location permission denied. Please grant location permissions.".to_string()
            }
            Self::Other(detail) => format!("Location error: {detail}"),
        }
    }
}

/// Weather fetch failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherFailure {
    #[error("network error: {0}")]
    Network(String),

    #[error("weather request timed out")]
    Timeout,

    #[error("weather API returned an empty body")]
    EmptyBody,

    #[error("could not parse weather response: {0}")]
    Parse(String),

    #[error("weather API error: {0}")]
    Other(String),
}

impl WeatherFailure {
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check internet connection.".to_string(),
            Self::Timeout => "Request timed out. Try again.".to_string(),
            Self::EmptyBody => {
                "Could not get weather data. Please check your internet connection and API key."
                    .to_string()
            }
            Self::Parse(_) => "Error parsing weather data from server.".to_string(),
            Self::Other(detail) => format!("API error: {detail}"),
        }
    }
}

impl From<reqwest::Error> for WeatherFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect()
            || err.is_request()
            || err.is_body()
            || err.is_status()
            || err.is_redirect()
        {
            Self::Network(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// A snapshot could not be turned into display strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot display weather: {0}")]
pub struct DisplayError(pub String);

impl DisplayError {
    pub fn user_message(&self) -> String {
        "Error displaying weather information.".to_string()
    }
}

/// The first failure of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineFailure {
    #[error(transparent)]
    Location(#[from] LocationFailure),

    #[error("location service returned no coordinates")]
    EmptyLocation,

    #[error(transparent)]
    Weather(#[from] WeatherFailure),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

impl PipelineFailure {
    pub fn user_message(&self) -> String {
        match self {
            Self::Location(e) => e.user_message(),
            Self::EmptyLocation => {
                "Could not get your location. Please enable location permissions.".to_string()
            }
            Self::Weather(e) => e.user_message(),
            Self::Display(e) => e.user_message(),
        }
    }
}

/// Returned when a trigger arrives while another run is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a weather request is already in progress")]
pub struct Busy;
