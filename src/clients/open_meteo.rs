/// Open-Meteo hourly forecast client
use super::{ensure_success, trim_base, HttpClient, WeatherSource};
use crate::domain::HourlyForecast;
use crate::errors::ApiResult;
use serde::Deserialize;
use std::time::Duration;

const SOURCE_NAME: &str = "open-meteo";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,weather_code";

pub struct OpenMeteoClient {
    http_client: HttpClient,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: String, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            base_url: trim_base(base_url),
        })
    }
}

#[async_trait::async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn hourly_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> ApiResult<HourlyForecast> {
        let url = format!("{}/forecast", self.base_url);
        let resp = self
            .http_client
            .get_client()
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                // keep the timeline in UTC so it lines up with session instants
                ("timezone", "GMT".to_string()),
                ("forecast_days", days.to_string()),
            ])
            .send()
            .await?;

        let body: ForecastResponse = ensure_success(SOURCE_NAME, resp)?.json().await?;
        Ok(body.hourly.into())
    }
}

#[derive(Deserialize)]
struct ForecastResponse {
    hourly: WireHourly,
}

#[derive(Deserialize)]
struct WireHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(rename = "temperature_2m", default)]
    temperature: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<i32>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
}

impl From<WireHourly> for HourlyForecast {
    fn from(wire: WireHourly) -> Self {
        HourlyForecast {
            times: wire.time,
            temperatures: wire.temperature,
            precipitation_probabilities: wire.precipitation_probability,
            weather_codes: wire.weather_code,
        }
    }
}
