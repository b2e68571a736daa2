/// Active weekend view: classify sessions, attach results and weather
use super::{bounded, session_catalog, SubFetch, WeatherResolver};
use crate::clients::ResultsSource;
use crate::domain::{
    CompletedEvent, LiveSession, RaceEvent, RaceWeekendState, ResultEntry, SessionKind,
    SessionWindow, UpcomingEvent,
};
use crate::utils::DisplayZone;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sessions of one weekend split relative to "now"
#[derive(Debug, Default, PartialEq)]
pub struct Classification {
    pub live: Option<SessionWindow>,
    pub completed: Vec<SessionWindow>,
    pub upcoming: Vec<SessionWindow>,
}

/// Split `windows` (catalog order) into live, completed and upcoming.
///
/// At most one session is live: when windows overlap the first one in
/// catalog order wins and any later in-window session stays upcoming.
pub fn classify(windows: &[SessionWindow], now: DateTime<Utc>) -> Classification {
    let mut split = Classification::default();

    for window in windows {
        if window.is_completed_at(now) {
            split.completed.push(*window);
        } else if window.is_live_at(now) && split.live.is_none() {
            split.live = Some(*window);
        } else {
            split.upcoming.push(*window);
        }
    }
    split
}

pub struct ActiveStateBuilder {
    results: Arc<dyn ResultsSource>,
    weather: Arc<WeatherResolver>,
    zone: DisplayZone,
    top_n: usize,
    timeout: Duration,
}

impl ActiveStateBuilder {
    pub fn new(
        results: Arc<dyn ResultsSource>,
        weather: Arc<WeatherResolver>,
        zone: DisplayZone,
        top_n: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            results,
            weather,
            zone,
            top_n,
            timeout,
        }
    }

    /// Build the Active view of `race` at `now`.
    ///
    /// `previous` is the last cached state; its completed entries for the
    /// same race stand in for results that cannot be fetched this cycle.
    pub async fn build(
        &self,
        race: &RaceEvent,
        now: DateTime<Utc>,
        previous: Option<&RaceWeekendState>,
    ) -> RaceWeekendState {
        let catalog = session_catalog(race);
        let Classification {
            live,
            completed,
            upcoming,
        } = classify(&catalog, now);

        let completed_events = join_all(
            completed
                .iter()
                .map(|window| self.completed_event(race, window.kind, previous)),
        );
        let upcoming_events = join_all(
            upcoming
                .iter()
                .enumerate()
                .map(|(index, window)| self.upcoming_event(race, window, index == 0)),
        );
        let (completed_events, upcoming_events) =
            futures::join!(completed_events, upcoming_events);

        let current_live_event = live.map(|window| LiveSession {
            kind: window.kind,
            starts_at: self.zone.to_display(window.start),
            ends_at: self.zone.to_display(window.end),
        });

        info!(
            "{} is live: current={:?}, {} completed, {} upcoming",
            race.name,
            current_live_event.as_ref().map(|l| l.kind),
            completed_events.len(),
            upcoming_events.len()
        );

        // classified race finishers travel with the event itself
        let race = match completed_events
            .iter()
            .find(|e| e.kind == SessionKind::Race && !e.results.is_empty())
        {
            Some(finished) => race.with_results(finished.results.clone()),
            None => race.clone(),
        };

        RaceWeekendState::Active {
            race,
            current_live_event,
            completed_events,
            upcoming_events,
        }
    }

    async fn completed_event(
        &self,
        race: &RaceEvent,
        kind: SessionKind,
        previous: Option<&RaceWeekendState>,
    ) -> CompletedEvent {
        if !kind.has_results() {
            return CompletedEvent {
                kind,
                results: Vec::new(),
            };
        }

        let fetched = self.fetch_results(race, kind).await;
        let cached = previous.and_then(|state| state.completed_event(race, kind));
        settle_results(kind, fetched, cached, self.top_n)
    }

    async fn fetch_results(&self, race: &RaceEvent, kind: SessionKind) -> SubFetch<Vec<ResultEntry>> {
        let season = race.season.as_str();
        let round = race.round;
        match kind {
            SessionKind::Qualifying => {
                bounded(self.timeout, self.results.qualifying_results(season, round)).await
            }
            SessionKind::Sprint => {
                bounded(self.timeout, self.results.sprint_results(season, round)).await
            }
            SessionKind::Race => {
                bounded(self.timeout, self.results.race_results(season, round)).await
            }
            _ => SubFetch::Fetched(Vec::new()),
        }
    }

    async fn upcoming_event(
        &self,
        race: &RaceEvent,
        window: &SessionWindow,
        is_next: bool,
    ) -> UpcomingEvent {
        let starts_at = self.zone.to_display(window.start);
        let weather = self.weather.resolve(&race.circuit.location, starts_at).await;

        UpcomingEvent {
            kind: window.kind,
            starts_at,
            is_next,
            weather,
            is_completed: false,
        }
    }
}

/// Decide what a completed results-bearing session shows this cycle
fn settle_results(
    kind: SessionKind,
    fetched: SubFetch<Vec<ResultEntry>>,
    cached: Option<&CompletedEvent>,
    top_n: usize,
) -> CompletedEvent {
    let reuse = |reason: &str| match cached {
        Some(entry) => {
            debug!("{}: {}, reusing {} cached results", kind.display_name(), reason, entry.results.len());
            entry.clone()
        }
        None => CompletedEvent {
            kind,
            results: Vec::new(),
        },
    };

    match fetched {
        SubFetch::Fetched(mut entries) if !entries.is_empty() => {
            entries.sort_by_key(|e| e.position);
            entries.truncate(top_n);
            CompletedEvent {
                kind,
                results: entries,
            }
        }
        SubFetch::Fetched(_) => match cached {
            Some(entry) if !entry.results.is_empty() => reuse("results not published"),
            _ => CompletedEvent {
                kind,
                results: Vec::new(),
            },
        },
        SubFetch::Failed(e) => {
            warn!("{} results fetch failed: {}", kind.display_name(), e);
            reuse("fetch failed")
        }
        SubFetch::TimedOut => {
            warn!("{} results fetch timed out", kind.display_name());
            reuse("fetch timed out")
        }
    }
}
