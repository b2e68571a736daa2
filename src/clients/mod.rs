/// External API clients module
mod jolpica;
mod open_meteo;

pub use jolpica::JolpicaClient;
pub use open_meteo::OpenMeteoClient;

use crate::domain::{HourlyForecast, RaceEvent, ResultEntry};
use crate::errors::{ApiError, ApiResult};
use reqwest::{Client, Response};
use std::time::Duration;

/// Season calendar collaborator
#[async_trait::async_trait]
pub trait CalendarSource: Send + Sync {
    async fn season_races(&self, season: &str) -> ApiResult<Vec<RaceEvent>>;
}

/// Session classification collaborator. An empty list means "not published yet".
#[async_trait::async_trait]
pub trait ResultsSource: Send + Sync {
    async fn qualifying_results(&self, season: &str, round: u32) -> ApiResult<Vec<ResultEntry>>;
    async fn sprint_results(&self, season: &str, round: u32) -> ApiResult<Vec<ResultEntry>>;
    async fn race_results(&self, season: &str, round: u32) -> ApiResult<Vec<ResultEntry>>;
}

/// Hourly forecast collaborator
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn hourly_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> ApiResult<HourlyForecast>;
}

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("race-weekend-service/1.0")
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Turn a non-2xx response into `ApiError::Upstream`
fn ensure_success(source_name: &'static str, resp: Response) -> ApiResult<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(ApiError::Upstream {
            source_name,
            status: resp.status().as_u16(),
        })
    }
}

fn trim_base(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}
