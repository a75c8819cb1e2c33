//! Core library for the `geoweather` CLI.
//!
//! This crate defines:
//! - Location providers and the permission/service/timeout guard around them
//! - The OpenWeather client and its response parsing
//! - The presenter that turns results into a widget-free view state
//! - The pipeline tying the three stages together
//! - Configuration handling
//!
//! It is used by `geoweather`, but any host that implements [`Screen`] can drive it.

pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod pipeline;
pub mod presenter;

pub use client::WeatherClient;
pub use config::{Config, LocationConfig, LocationSource};
pub use error::{Busy, DisplayError, LocationFailure, PipelineFailure, WeatherFailure};
pub use location::LocationProvider;
pub use model::{Accuracy, Coordinates, LocationRequest, WeatherSnapshot};
pub use pipeline::WeatherPipeline;
pub use presenter::{Content, Screen, ViewState, WeatherDetails};
