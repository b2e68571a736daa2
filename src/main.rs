/// Main application entry point with clean architecture
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod repo;
mod routes;
mod services;
#[cfg(test)]
mod test_support;
mod utils;

use crate::clients::{JolpicaClient, OpenMeteoClient};
use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::repo::WeatherRepo;
use crate::routes::build_router;
use crate::services::{Collaborators, RaceWeekendService};
use crate::utils::{DisplayZone, SystemClock};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully (season {})", config.season);

    let zone = DisplayZone::from_offset_minutes(config.display_utc_offset_minutes).ok_or_else(
        || {
            anyhow::anyhow!(
                "DISPLAY_UTC_OFFSET_MINUTES out of range: {}",
                config.display_utc_offset_minutes
            )
        },
    )?;

    // Initialize clients
    let timeout = config.weekend.fetch_timeout;
    let jolpica = Arc::new(JolpicaClient::new(config.jolpica_base_url.clone(), timeout)?);
    let open_meteo = Arc::new(OpenMeteoClient::new(
        config.open_meteo_base_url.clone(),
        timeout,
    )?);

    // Initialize the weekend engine
    let weekend = Arc::new(RaceWeekendService::new(
        config.season.clone(),
        config.weekend.clone(),
        zone,
        Collaborators {
            calendar: jolpica.clone(),
            results: jolpica,
            weather: open_meteo,
        },
        Arc::new(WeatherRepo::new()),
        Arc::new(SystemClock),
    ));

    // Start background task
    weekend.clone().spawn_periodic();

    // Build router
    let app = build_router(AppState { weekend });

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("race_weekend service listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
