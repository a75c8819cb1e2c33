//! Projection of pipeline results onto display strings.
//!
//! Nothing here touches a widget toolkit: the pipeline produces a [`ViewState`]
//! value and hands it to whatever implements [`Screen`].

use serde::Serialize;

use crate::{
    error::DisplayError,
    model::{Coordinates, NO_DESCRIPTION, WeatherSnapshot},
};

pub const TRIGGER_IDLE_LABEL: &str = "Get Current Weather";
pub const TRIGGER_LOADING_LABEL: &str = "Getting Weather...";

/// The six strings shown in the details section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherDetails {
    pub city_line: String,
    pub temperature: String,
    pub description: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
}

/// Details and error banner never show at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Content {
    #[default]
    Empty,
    Details(WeatherDetails),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ViewState {
    pub location_line: Option<String>,
    pub content: Content,
    pub loading: bool,
}

impl ViewState {
    pub fn details(&self) -> Option<&WeatherDetails> {
        match &self.content {
            Content::Details(d) => Some(d),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.content {
            Content::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn details_visible(&self) -> bool {
        self.details().is_some()
    }

    pub fn error_visible(&self) -> bool {
        self.error().is_some()
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.loading
    }

    pub fn trigger_label(&self) -> &'static str {
        if self.loading { TRIGGER_LOADING_LABEL } else { TRIGGER_IDLE_LABEL }
    }

    /// Enter the loading state; a previous error banner is hidden.
    pub fn begin_loading(&mut self) {
        self.loading = true;
        if self.error_visible() {
            self.content = Content::Empty;
        }
    }

    pub fn end_loading(&mut self) {
        self.loading = false;
    }

    pub fn set_location(&mut self, coords: Coordinates) {
        self.location_line =
            Some(format!("Location: {:.2}, {:.2}", coords.latitude, coords.longitude));
    }

    pub fn show_details(&mut self, details: WeatherDetails) {
        self.content = Content::Details(details);
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.content = Content::Error(message.into());
    }
}

/// Rendering collaborator; called on every state transition.
pub trait Screen {
    fn render(&mut self, view: &ViewState);
}

impl<F: FnMut(&ViewState)> Screen for F {
    fn render(&mut self, view: &ViewState) {
        self(view)
    }
}

/// Map a snapshot to display strings.
pub fn render(snapshot: &WeatherSnapshot) -> Result<WeatherDetails, DisplayError> {
    for (field, value) in [
        ("temperature", snapshot.temperature_c),
        ("feels_like", snapshot.feels_like_c),
        ("wind_speed", snapshot.wind_speed_ms),
    ] {
        if !value.is_finite() {
            return Err(DisplayError(format!("{field} is not a finite number: {value}")));
        }
    }

    let city_line = match snapshot.country.as_deref() {
        Some(country) if !country.is_empty() => {
            format!("{}, {}", snapshot.location_name, country)
        }
        _ => snapshot.location_name.clone(),
    };

    Ok(WeatherDetails {
        city_line,
        temperature: format!("{}°C", round_degrees(snapshot.temperature_c)),
        description: capitalize(&snapshot.description),
        feels_like: format!("Feels like {}°C", round_degrees(snapshot.feels_like_c)),
        humidity: format!("Humidity: {}%", snapshot.humidity_pct),
        wind: format!("Wind: {} m/s", snapshot.wind_speed_ms),
    })
}

/// Half-to-even rounding; negative zero prints as "0".
fn round_degrees(value: f64) -> String {
    let rounded = value.round_ties_even() + 0.0;
    format!("{rounded:.0}")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => NO_DESCRIPTION.to_string(),
    }
}
