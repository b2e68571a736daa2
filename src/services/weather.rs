/// Per-session weather resolution shared by both state builders
use super::{bounded, SubFetch};
use crate::clients::WeatherSource;
use crate::domain::{HourlyForecast, Location, SessionWeather};
use crate::repo::{WeatherKey, WeatherRepo};
use crate::utils::parse_forecast_hour;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct WeatherResolver {
    source: Arc<dyn WeatherSource>,
    cache: Arc<WeatherRepo>,
    forecast_days: u32,
    max_gap: Duration,
    timeout: std::time::Duration,
}

impl WeatherResolver {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        cache: Arc<WeatherRepo>,
        forecast_days: u32,
        max_gap: Duration,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            source,
            cache,
            forecast_days,
            max_gap,
            timeout,
        }
    }

    /// Forecast for a session starting at `starts_at` (display time).
    ///
    /// `None` means no usable forecast; failures never escape.
    pub async fn resolve(
        &self,
        location: &Location,
        starts_at: DateTime<FixedOffset>,
    ) -> Option<SessionWeather> {
        let start_utc = starts_at.with_timezone(&Utc);
        let key = WeatherKey::new(location.latitude, location.longitude, start_utc);

        if let Some(hit) = self.cache.lookup(&key) {
            debug!("Weather cache hit for session at {}", starts_at);
            return Some(hit);
        }

        let fetch = self.source.hourly_forecast(
            location.latitude,
            location.longitude,
            self.forecast_days,
        );
        let forecast = match bounded(self.timeout, fetch).await {
            SubFetch::Fetched(forecast) => forecast,
            SubFetch::Failed(e) => {
                warn!("Weather fetch failed for {}: {}", location.locality, e);
                return None;
            }
            SubFetch::TimedOut => {
                warn!("Weather fetch timed out for {}", location.locality);
                return None;
            }
        };

        let Some(weather) = closest_forecast(&forecast, start_utc.naive_utc(), self.max_gap)
        else {
            debug!(
                "No forecast hour within {} minutes of {}",
                self.max_gap.num_minutes(),
                start_utc
            );
            return None;
        };

        self.cache.store(key, weather.clone());
        debug!(
            "Cached weather for session at {} ({} entries)",
            starts_at,
            self.cache.len()
        );
        Some(weather)
    }
}

/// Pick the forecast hour nearest to `target` (UTC), accepted only when it
/// is at most `max_gap` away.
pub fn closest_forecast(
    forecast: &HourlyForecast,
    target: NaiveDateTime,
    max_gap: Duration,
) -> Option<SessionWeather> {
    let mut best: Option<(usize, Duration)> = None;

    for (index, raw) in forecast.times.iter().enumerate() {
        let Some(hour) = parse_forecast_hour(raw) else {
            warn!("Unparseable forecast time {:?}", raw);
            continue;
        };
        let diff = (hour - target).abs();
        if best.map_or(true, |(_, min)| diff < min) {
            best = Some((index, diff));
        }
    }

    let (index, diff) = best?;
    if diff > max_gap {
        return None;
    }

    let temperature = forecast.temperatures.get(index).copied().flatten()?;
    let rain_chance = forecast
        .precipitation_probabilities
        .get(index)
        .copied()
        .flatten()
        .unwrap_or(0);
    let weather_code = forecast
        .weather_codes
        .get(index)
        .copied()
        .flatten()
        .unwrap_or(0);

    Some(SessionWeather::new(temperature, rain_chance, weather_code))
}
