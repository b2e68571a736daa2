/// Jolpica (Ergast-compatible) calendar and results client
use super::{ensure_success, trim_base, CalendarSource, HttpClient, ResultsSource};
use crate::domain::{Circuit, Location, RaceEvent, ResultEntry};
use crate::errors::ApiResult;
use crate::utils::{parse_coordinate, parse_wire_instant};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "jolpica";

pub struct JolpicaClient {
    http_client: HttpClient,
    base_url: String,
}

impl JolpicaClient {
    pub fn new(base_url: String, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            base_url: trim_base(base_url),
        })
    }

    async fn fetch_races<T>(&self, path: &str) -> ApiResult<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .http_client
            .get_client()
            .get(&url)
            .query(&[("limit", "100")])
            .send()
            .await?;

        let envelope: MrEnvelope<T> = ensure_success(SOURCE_NAME, resp)?.json().await?;
        Ok(envelope.mr_data.race_table.races)
    }

    async fn fetch_session_results(
        &self,
        season: &str,
        round: u32,
        segment: &str,
        pick: fn(WireResultsRace) -> Vec<WireResult>,
    ) -> ApiResult<Vec<ResultEntry>> {
        let races: Vec<WireResultsRace> = self
            .fetch_races(&format!("{}/{}/{}/", season, round, segment))
            .await?;

        let entries: Vec<ResultEntry> = races
            .into_iter()
            .next()
            .map(pick)
            .unwrap_or_default()
            .into_iter()
            .filter_map(WireResult::into_entry)
            .collect();

        debug!(
            "Fetched {} {} results for {} round {}",
            entries.len(),
            segment,
            season,
            round
        );
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl CalendarSource for JolpicaClient {
    async fn season_races(&self, season: &str) -> ApiResult<Vec<RaceEvent>> {
        let wire: Vec<WireRace> = self.fetch_races(&format!("{}/races/", season)).await?;
        let total = wire.len();

        let mut races: Vec<RaceEvent> = wire.into_iter().filter_map(WireRace::into_event).collect();
        races.sort_by_key(|r| r.race_start);

        if races.len() != total {
            warn!(
                "Dropped {} of {} calendar entries with unusable dates or coordinates",
                total - races.len(),
                total
            );
        }
        Ok(races)
    }
}

#[async_trait::async_trait]
impl ResultsSource for JolpicaClient {
    async fn qualifying_results(&self, season: &str, round: u32) -> ApiResult<Vec<ResultEntry>> {
        self.fetch_session_results(season, round, "qualifying", |r| r.qualifying_results)
            .await
    }

    async fn sprint_results(&self, season: &str, round: u32) -> ApiResult<Vec<ResultEntry>> {
        self.fetch_session_results(season, round, "sprint", |r| r.sprint_results)
            .await
    }

    async fn race_results(&self, season: &str, round: u32) -> ApiResult<Vec<ResultEntry>> {
        self.fetch_session_results(season, round, "results", |r| r.results)
            .await
    }
}

#[derive(Deserialize)]
struct MrEnvelope<T> {
    #[serde(rename = "MRData")]
    mr_data: MrData<T>,
}

#[derive(Deserialize)]
struct MrData<T> {
    #[serde(rename = "RaceTable")]
    race_table: RaceTable<T>,
}

#[derive(Deserialize)]
struct RaceTable<T> {
    #[serde(rename = "Races", default = "Vec::new")]
    races: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRace {
    season: String,
    round: String,
    race_name: String,
    #[serde(rename = "Circuit")]
    circuit: WireCircuit,
    date: String,
    time: Option<String>,
    #[serde(rename = "FirstPractice")]
    first_practice: Option<WireSession>,
    #[serde(rename = "SecondPractice")]
    second_practice: Option<WireSession>,
    #[serde(rename = "ThirdPractice")]
    third_practice: Option<WireSession>,
    #[serde(rename = "Qualifying")]
    qualifying: Option<WireSession>,
    #[serde(rename = "Sprint")]
    sprint: Option<WireSession>,
    #[serde(rename = "SprintQualifying")]
    sprint_qualifying: Option<WireSession>,
    #[serde(rename = "Results")]
    results: Option<Vec<WireResult>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCircuit {
    circuit_id: String,
    circuit_name: String,
    #[serde(rename = "Location")]
    location: WireLocation,
}

#[derive(Deserialize)]
struct WireLocation {
    lat: String,
    long: String,
    #[serde(default)]
    locality: String,
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct WireSession {
    date: String,
    time: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireResultsRace {
    #[serde(rename = "QualifyingResults", default)]
    qualifying_results: Vec<WireResult>,
    #[serde(rename = "SprintResults", default)]
    sprint_results: Vec<WireResult>,
    #[serde(rename = "Results", default)]
    results: Vec<WireResult>,
}

#[derive(Deserialize)]
struct WireResult {
    position: String,
    #[serde(rename = "Driver")]
    driver: WireDriver,
    #[serde(rename = "Constructor")]
    constructor: WireConstructor,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDriver {
    code: Option<String>,
    given_name: String,
    family_name: String,
}

#[derive(Deserialize)]
struct WireConstructor {
    name: String,
}

impl WireRace {
    fn into_event(self) -> Option<RaceEvent> {
        let Some(race_start) = parse_wire_instant(&self.date, self.time.as_deref()) else {
            warn!("Skipping {}: unparseable race date {:?}", self.race_name, self.date);
            return None;
        };
        let (Some(latitude), Some(longitude)) = (
            parse_coordinate(&self.circuit.location.lat),
            parse_coordinate(&self.circuit.location.long),
        ) else {
            warn!("Skipping {}: unparseable circuit coordinates", self.race_name);
            return None;
        };
        let Ok(round) = self.round.trim().parse::<u32>() else {
            warn!("Skipping {}: bad round {:?}", self.race_name, self.round);
            return None;
        };

        let name = self.race_name;
        let session = |s: Option<WireSession>, label: &str| -> Option<_> {
            let s = s?;
            let parsed = parse_wire_instant(&s.date, s.time.as_deref());
            if parsed.is_none() {
                warn!("{}: dropping {} with unparseable time", name, label);
            }
            parsed
        };

        Some(RaceEvent {
            season: self.season,
            round,
            first_practice: session(self.first_practice, "FirstPractice"),
            second_practice: session(self.second_practice, "SecondPractice"),
            third_practice: session(self.third_practice, "ThirdPractice"),
            qualifying: session(self.qualifying, "Qualifying"),
            sprint: session(self.sprint, "Sprint"),
            sprint_qualifying: session(self.sprint_qualifying, "SprintQualifying"),
            circuit: Circuit {
                id: self.circuit.circuit_id,
                name: self.circuit.circuit_name,
                location: Location {
                    latitude,
                    longitude,
                    locality: self.circuit.location.locality,
                    country: self.circuit.location.country,
                },
            },
            race_start,
            results: self
                .results
                .map(|r| r.into_iter().filter_map(WireResult::into_entry).collect()),
            name,
        })
    }
}

impl WireResult {
    fn into_entry(self) -> Option<ResultEntry> {
        let position = self.position.trim().parse::<u32>().ok()?;
        let driver_code = self
            .driver
            .code
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| {
                self.driver
                    .family_name
                    .chars()
                    .take(3)
                    .collect::<String>()
                    .to_uppercase()
            });

        Some(ResultEntry {
            position,
            driver_code,
            driver_name: format!("{} {}", self.driver.given_name, self.driver.family_name),
            team: self.constructor.name,
        })
    }
}
