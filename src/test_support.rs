/// Fixtures and fake collaborators shared by unit tests
use crate::clients::{CalendarSource, ResultsSource, WeatherSource};
use crate::domain::{Circuit, HourlyForecast, Location, RaceEvent, ResultEntry, SessionKind};
use crate::errors::{ApiError, ApiResult};
use crate::utils::Clock;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid test instant")
}

pub fn sample_location() -> Location {
    Location {
        latitude: 26.0325,
        longitude: 50.5106,
        locality: "Sakhir".to_string(),
        country: "Bahrain".to_string(),
    }
}

/// Race with FP1, optional qualifying and the race itself
pub fn sample_race(
    round: u32,
    first_practice: DateTime<Utc>,
    qualifying: Option<DateTime<Utc>>,
    race_start: DateTime<Utc>,
) -> RaceEvent {
    RaceEvent {
        season: "2025".to_string(),
        round,
        name: format!("Round {} Grand Prix", round),
        circuit: Circuit {
            id: "bahrain".to_string(),
            name: "Bahrain International Circuit".to_string(),
            location: sample_location(),
        },
        race_start,
        first_practice: Some(first_practice),
        second_practice: None,
        third_practice: None,
        qualifying,
        sprint: None,
        sprint_qualifying: None,
        results: None,
    }
}

/// Classification in the given finishing order
pub fn entries(codes: &[&str]) -> Vec<ResultEntry> {
    codes
        .iter()
        .enumerate()
        .map(|(index, code)| ResultEntry {
            position: index as u32 + 1,
            driver_code: code.to_string(),
            driver_name: format!("Driver {}", code),
            team: "Team".to_string(),
        })
        .collect()
}

/// Consecutive hourly rows from `start`, as `(temperature, rain %, WMO code)`
pub fn hourly(start: DateTime<Utc>, rows: &[(f64, i32, i32)]) -> HourlyForecast {
    let mut forecast = HourlyForecast {
        times: Vec::new(),
        temperatures: Vec::new(),
        precipitation_probabilities: Vec::new(),
        weather_codes: Vec::new(),
    };
    for (offset, (temperature, rain, code)) in rows.iter().enumerate() {
        let at = start + Duration::hours(offset as i64);
        forecast.times.push(at.format("%Y-%m-%dT%H:%M").to_string());
        forecast.temperatures.push(Some(*temperature));
        forecast.precipitation_probabilities.push(Some(*rain));
        forecast.weather_codes.push(Some(*code));
    }
    forecast
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Calendar that serves a fixed race list; `None` fails every call
pub struct FakeCalendar {
    races: Mutex<Option<Vec<RaceEvent>>>,
    pub calls: AtomicUsize,
}

impl FakeCalendar {
    pub fn with(races: Vec<RaceEvent>) -> Self {
        Self {
            races: Mutex::new(Some(races)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, races: Option<Vec<RaceEvent>>) {
        *self.races.lock().unwrap() = races;
    }
}

#[async_trait::async_trait]
impl CalendarSource for FakeCalendar {
    async fn season_races(&self, _season: &str) -> ApiResult<Vec<RaceEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.races
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Upstream {
                source_name: "calendar",
                status: 503,
            })
    }
}

/// Results per session kind. Unset kinds are "not published yet",
/// `None` fails the fetch.
pub struct FakeResults {
    by_kind: Mutex<HashMap<SessionKind, Option<Vec<ResultEntry>>>>,
    delay: Option<std::time::Duration>,
    panics: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeResults {
    pub fn new() -> Self {
        Self {
            by_kind: Mutex::new(HashMap::new()),
            delay: None,
            panics: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, kind: SessionKind, results: Option<Vec<ResultEntry>>) {
        self.by_kind.lock().unwrap().insert(kind, results);
    }

    pub fn panic_on_fetch(&self, enabled: bool) {
        self.panics.store(enabled, Ordering::SeqCst);
    }

    async fn serve(&self, kind: SessionKind) -> ApiResult<Vec<ResultEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panics.load(Ordering::SeqCst) {
            panic!("results source exploded");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let configured = self.by_kind.lock().unwrap().get(&kind).cloned();
        match configured {
            None => Ok(Vec::new()),
            Some(Some(results)) => Ok(results),
            Some(None) => Err(ApiError::Upstream {
                source_name: "results",
                status: 500,
            }),
        }
    }
}

#[async_trait::async_trait]
impl ResultsSource for FakeResults {
    async fn qualifying_results(&self, _season: &str, _round: u32) -> ApiResult<Vec<ResultEntry>> {
        self.serve(SessionKind::Qualifying).await
    }

    async fn sprint_results(&self, _season: &str, _round: u32) -> ApiResult<Vec<ResultEntry>> {
        self.serve(SessionKind::Sprint).await
    }

    async fn race_results(&self, _season: &str, _round: u32) -> ApiResult<Vec<ResultEntry>> {
        self.serve(SessionKind::Race).await
    }
}

/// Forecast source returning one canned forecast, or failing
pub struct FakeWeather {
    forecast: Option<HourlyForecast>,
    delay: Option<std::time::Duration>,
    pub calls: AtomicUsize,
}

impl FakeWeather {
    pub fn with(forecast: HourlyForecast) -> Self {
        Self {
            forecast: Some(forecast),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            forecast: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl WeatherSource for FakeWeather {
    async fn hourly_forecast(
        &self,
        _latitude: f64,
        _longitude: f64,
        _days: u32,
    ) -> ApiResult<HourlyForecast> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.forecast.clone().ok_or(ApiError::Upstream {
            source_name: "weather",
            status: 502,
        })
    }
}
