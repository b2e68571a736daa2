/// Domain models for the application
mod state;
mod weather;

pub use state::{CompletedEvent, LiveSession, RaceWeekendState, UpcomingEvent};
pub use weather::{HourlyForecast, SessionWeather, WeatherIcon};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Circuit location as published by the calendar source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub locality: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: String,
    pub name: String,
    pub location: Location,
}

/// One classified finisher of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub position: u32,
    pub driver_code: String,
    pub driver_name: String,
    pub team: String,
}

/// One calendar entry. All instants are UTC, as published on the wire.
///
/// `(season, round)` is the natural key. Values are never patched in place:
/// attaching results produces a new event via [`RaceEvent::with_results`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEvent {
    pub season: String,
    pub round: u32,
    pub name: String,
    pub circuit: Circuit,
    pub race_start: DateTime<Utc>,
    pub first_practice: Option<DateTime<Utc>>,
    pub second_practice: Option<DateTime<Utc>>,
    pub third_practice: Option<DateTime<Utc>>,
    pub qualifying: Option<DateTime<Utc>>,
    pub sprint: Option<DateTime<Utc>>,
    pub sprint_qualifying: Option<DateTime<Utc>>,
    pub results: Option<Vec<ResultEntry>>,
}

impl RaceEvent {
    /// Scheduled start of the given session, if the event has one
    pub fn session_start(&self, kind: SessionKind) -> Option<DateTime<Utc>> {
        match kind {
            SessionKind::Fp1 => self.first_practice,
            SessionKind::Fp2 => self.second_practice,
            SessionKind::Fp3 => self.third_practice,
            SessionKind::SprintQualifying => self.sprint_qualifying,
            SessionKind::Qualifying => self.qualifying,
            SessionKind::Sprint => self.sprint,
            SessionKind::Race => Some(self.race_start),
        }
    }

    pub fn is_same_round(&self, other: &RaceEvent) -> bool {
        self.season == other.season && self.round == other.round
    }

    pub fn with_results(&self, results: Vec<ResultEntry>) -> RaceEvent {
        RaceEvent {
            results: Some(results),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    Fp1,
    Fp2,
    Fp3,
    SprintQualifying,
    Qualifying,
    Sprint,
    Race,
}

impl SessionKind {
    pub const ALL: [SessionKind; 7] = [
        SessionKind::Fp1,
        SessionKind::Fp2,
        SessionKind::Fp3,
        SessionKind::SprintQualifying,
        SessionKind::Qualifying,
        SessionKind::Sprint,
        SessionKind::Race,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SessionKind::Fp1 => "Practice 1",
            SessionKind::Fp2 => "Practice 2",
            SessionKind::Fp3 => "Practice 3",
            SessionKind::SprintQualifying => "Sprint Qualifying",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::Sprint => "Sprint",
            SessionKind::Race => "Race",
        }
    }

    /// Nominal session length
    pub fn duration(self) -> Duration {
        match self {
            SessionKind::Fp1 | SessionKind::Fp2 | SessionKind::Fp3 => Duration::minutes(75),
            SessionKind::Qualifying => Duration::minutes(75),
            SessionKind::SprintQualifying => Duration::minutes(60),
            SessionKind::Sprint => Duration::minutes(40),
            SessionKind::Race => Duration::minutes(120),
        }
    }

    /// Display tie-break; lower sorts first (race is 1, FP1 is 7)
    pub fn priority(self) -> u8 {
        match self {
            SessionKind::Race => 1,
            SessionKind::Qualifying => 2,
            SessionKind::Sprint => 3,
            SessionKind::SprintQualifying => 4,
            SessionKind::Fp3 => 5,
            SessionKind::Fp2 => 6,
            SessionKind::Fp1 => 7,
        }
    }

    pub fn is_main_event(self) -> bool {
        matches!(
            self,
            SessionKind::SprintQualifying
                | SessionKind::Qualifying
                | SessionKind::Sprint
                | SessionKind::Race
        )
    }

    /// Kinds the results source publishes a classification for
    pub fn has_results(self) -> bool {
        matches!(
            self,
            SessionKind::Qualifying | SessionKind::Sprint | SessionKind::Race
        )
    }
}

/// A scheduled session with its computed end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub kind: SessionKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SessionWindow {
    pub fn new(kind: SessionKind, start: DateTime<Utc>) -> Self {
        Self {
            kind,
            start,
            end: start + kind.duration(),
        }
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }

    pub fn is_completed_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}
