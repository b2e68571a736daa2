use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{RaceEvent, ResultEntry, SessionKind, SessionWeather};

/// A session that has not finished yet, in display time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub kind: SessionKind,
    pub starts_at: DateTime<FixedOffset>,
    pub is_next: bool,
    pub weather: Option<SessionWeather>,
    pub is_completed: bool,
}

/// A finished session. An empty result list is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedEvent {
    pub kind: SessionKind,
    pub results: Vec<ResultEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSession {
    pub kind: SessionKind,
    pub starts_at: DateTime<FixedOffset>,
    pub ends_at: DateTime<FixedOffset>,
}

/// The published view of the current race weekend.
///
/// Every cycle produces a fresh value; nothing patches a published one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RaceWeekendState {
    Loading,
    Error {
        message: String,
    },
    ComingUp {
        race: RaceEvent,
        next_main_event: DateTime<FixedOffset>,
        next_main_event_kind: SessionKind,
        upcoming_events: Vec<UpcomingEvent>,
    },
    Active {
        race: RaceEvent,
        current_live_event: Option<LiveSession>,
        completed_events: Vec<CompletedEvent>,
        upcoming_events: Vec<UpcomingEvent>,
    },
}

impl RaceWeekendState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RaceWeekendState::Loading)
    }

    /// Only computed weekend views are worth keeping as fallback
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self,
            RaceWeekendState::ComingUp { .. } | RaceWeekendState::Active { .. }
        )
    }

    pub fn race(&self) -> Option<&RaceEvent> {
        match self {
            RaceWeekendState::ComingUp { race, .. } | RaceWeekendState::Active { race, .. } => {
                Some(race)
            }
            _ => None,
        }
    }

    /// Completed entry for `kind`, only if this is an Active view of `race`
    pub fn completed_event(&self, race: &RaceEvent, kind: SessionKind) -> Option<&CompletedEvent> {
        match self {
            RaceWeekendState::Active {
                race: cached,
                completed_events,
                ..
            } if cached.is_same_round(race) => completed_events.iter().find(|e| e.kind == kind),
            _ => None,
        }
    }

    /// The instant a countdown display should target
    pub fn countdown_target(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            RaceWeekendState::ComingUp {
                next_main_event, ..
            } => Some(*next_main_event),
            RaceWeekendState::Active {
                current_live_event,
                upcoming_events,
                ..
            } => current_live_event.as_ref().map(|live| live.ends_at).or_else(|| {
                upcoming_events
                    .iter()
                    .find(|e| !e.is_completed)
                    .map(|e| e.starts_at)
            }),
            _ => None,
        }
    }
}
