use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use weatherph::api::AppState;
use weatherph::{WeatherPhConfig, telemetry, web};

#[derive(Parser)]
#[command(author, version, about, long_about, propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[clap(long, short, env = "WEATHERPH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[clap(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the JSON API server.
    Serve {
        /// Overrides `server.port`.
        #[clap(long, short)]
        port: Option<u16>,
    },

    /// Weather and advisories for both ends of a trip.
    Route {
        origin: String,
        destination: String,
    },

    /// Current weather and advisories for one place.
    Weather { location: String },

    /// Official PAGASA advisories, optionally filtered by place.
    Advisories { location: Option<String> },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize result")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = WeatherPhConfig::load_from_path(cli.config)?;
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    if config.openweather.api_key.is_none() {
        tracing::warn!(
            "No OpenWeather API key configured; set WEATHERPH_OPENWEATHER__API_KEY or openweather.api_key"
        );
    }

    let state = AppState::from_config(&config)?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(state, &config.server).await?;
        }
        Command::Route {
            origin,
            destination,
        } => {
            let result = state
                .route
                .build_route_weather_result(&origin, &destination, None, None)
                .await;
            print_json(&result)?;
        }
        Command::Weather { location } => {
            print_json(&state.route.place_weather(&location).await)?;
        }
        Command::Advisories { location } => {
            let advisories = state.official.advisories_for(location.as_deref()).await;
            print_json(&advisories)?;
        }
    }

    Ok(())
}
