/// Application configuration module
use chrono::{Datelike, Utc};
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub season: String,
    pub jolpica_base_url: String,
    pub open_meteo_base_url: String,
    pub display_utc_offset_minutes: i32,
    pub weekend: WeekendSettings,
}

/// Tunables for the race weekend engine
#[derive(Clone, Debug)]
pub struct WeekendSettings {
    pub tick: Duration,
    pub stale_after: chrono::Duration,
    pub fetch_timeout: Duration,
    pub weekend_overrun: chrono::Duration,
    pub forecast_days: u32,
    pub forecast_max_gap: chrono::Duration,
    pub results_top_n: usize,
}

impl Default for WeekendSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(60),
            stale_after: chrono::Duration::minutes(5),
            fetch_timeout: Duration::from_secs(10),
            weekend_overrun: chrono::Duration::minutes(120),
            forecast_days: 16,
            forecast_max_gap: chrono::Duration::minutes(180),
            results_top_n: 3,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let season = env::var("SEASON").unwrap_or_else(|_| Utc::now().year().to_string());
        if season.trim().is_empty() || !season.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("SEASON must be a year, got {:?}", season);
        }

        let jolpica_base_url = env::var("JOLPICA_BASE_URL")
            .unwrap_or_else(|_| "https://api.jolpi.ca/ergast/f1".to_string());

        let open_meteo_base_url = env::var("OPEN_METEO_BASE_URL")
            .unwrap_or_else(|_| "https://api.open-meteo.com/v1".to_string());

        let defaults = WeekendSettings::default();
        let weekend = WeekendSettings {
            tick: Duration::from_secs(env_u64("TICK_SECONDS", 60)),
            stale_after: env_delta("STALE_AFTER_SECONDS", chrono::Duration::try_seconds, defaults.stale_after),
            fetch_timeout: Duration::from_secs(env_u64("FETCH_TIMEOUT_SECONDS", 10)),
            weekend_overrun: env_delta(
                "WEEKEND_OVERRUN_MINUTES",
                chrono::Duration::try_minutes,
                defaults.weekend_overrun,
            ),
            forecast_days: env_u64("FORECAST_DAYS", defaults.forecast_days as u64) as u32,
            forecast_max_gap: env_delta(
                "FORECAST_MAX_GAP_MINUTES",
                chrono::Duration::try_minutes,
                defaults.forecast_max_gap,
            ),
            results_top_n: env_u64("RESULTS_TOP_N", defaults.results_top_n as u64) as usize,
        };

        Ok(Self {
            bind_addr,
            season,
            jolpica_base_url,
            open_meteo_base_url,
            display_utc_offset_minutes: env_i64("DISPLAY_UTC_OFFSET_MINUTES", 330) as i32, // IST
            weekend,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Span read from `key` in the unit of `unit`; out-of-range values keep `default`
fn env_delta(
    key: &str,
    unit: fn(i64) -> Option<chrono::Duration>,
    default: chrono::Duration,
) -> chrono::Duration {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(unit)
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
