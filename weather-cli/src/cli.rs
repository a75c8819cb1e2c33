use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use geoweather_core::{Config, Coordinates, LocationSource, WeatherPipeline};
use inquire::{Confirm, CustomType, Password, Select};
use std::process::ExitCode;

use crate::screen::TerminalScreen;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoweather", version, about = "Current weather at your location")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and location preferences interactively.
    Configure,

    /// Locate this machine and show the current weather there.
    Show {
        /// Latitude in degrees; overrides the configured location source.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in degrees; overrides the configured location source.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Print the final view state as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, json } => {
                let coords = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(coords, json).await
            }
        }
    }
}

fn configure() -> anyhow::Result<ExitCode> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key (leave empty to keep the current one):")
        .without_confirmation()
        .prompt()?;
    if !key.trim().is_empty() {
        config.api_key = Some(key.trim().to_string());
    }

    let source = Select::new("Location source:", LocationSource::all().to_vec())
        .with_starting_cursor(
            LocationSource::all().iter().position(|s| *s == config.location.source).unwrap_or(0),
        )
        .prompt()?;
    config.location.source = source;

    if source == LocationSource::Fixed {
        let latitude = CustomType::<f64>::new("Latitude (degrees):")
            .with_error_message("Please enter a number")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude (degrees):")
            .with_error_message("Please enter a number")
            .prompt()?;

        let coords = Coordinates::new(latitude, longitude);
        anyhow::ensure!(coords.is_valid(), "Coordinates out of range: {latitude}, {longitude}");
        config.location.use_fixed(coords);
    }

    config.location.enabled = Confirm::new("Enable location services?")
        .with_default(config.location.enabled)
        .prompt()?;

    config.location.permission_granted = Confirm::new("Allow geoweather to access your location?")
        .with_default(config.location.permission_granted)
        .prompt()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(ExitCode::SUCCESS)
}

async fn show(coords: Option<Coordinates>, json: bool) -> anyhow::Result<ExitCode> {
    let mut config = Config::load()?;

    if let Some(coords) = coords {
        // explicit coordinates imply consent
        config.location.use_fixed(coords);
        config.location.enabled = true;
        config.location.permission_granted = true;
    }

    tracing::debug!(source = %config.location.source, "starting weather pipeline");
    let pipeline = WeatherPipeline::from_config(&config)?;
    let mut screen = TerminalScreen::new(!json);

    let view = pipeline.trigger(&mut screen).await?;

    if json {
        let out = serde_json::to_string_pretty(&view).context("Failed to serialize view state")?;
        println!("{out}");
    }

    Ok(if view.error_visible() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
