/// Race weekend orchestrator: picks the relevant race, runs a builder per
/// cycle and publishes the result with cache fallback
use super::{bounded, session_catalog, ActiveStateBuilder, ComingUpStateBuilder, SubFetch, WeatherResolver};
use crate::clients::{CalendarSource, ResultsSource, WeatherSource};
use crate::config::WeekendSettings;
use crate::domain::{RaceEvent, RaceWeekendState, SessionKind};
use crate::errors::{ApiError, ApiResult};
use crate::repo::{CalendarRepo, StateRepo, WeatherRepo};
use crate::utils::{countdown_between, Clock, DisplayZone};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const NO_UPCOMING_RACES: &str = "no upcoming races found";

/// A weekend is live from its first session until the race window plus
/// `overrun` has passed.
pub fn is_weekend_active(race: &RaceEvent, now: DateTime<Utc>, overrun: Duration) -> bool {
    let catalog = session_catalog(race);
    let Some(first) = catalog.first() else {
        return false;
    };
    let Some(race_window) = catalog.iter().find(|w| w.kind == SessionKind::Race) else {
        return false;
    };
    now >= first.start && now < race_window.end + overrun
}

/// First race, by start, that is either still ahead or currently running
pub fn select_current_or_next(
    races: &[RaceEvent],
    now: DateTime<Utc>,
    overrun: Duration,
) -> Option<&RaceEvent> {
    let mut ordered: Vec<&RaceEvent> = races.iter().collect();
    ordered.sort_by_key(|race| race.race_start);
    ordered
        .into_iter()
        .find(|race| race.race_start > now || is_weekend_active(race, now, overrun))
}

/// External sources the service depends on
pub struct Collaborators {
    pub calendar: Arc<dyn CalendarSource>,
    pub results: Arc<dyn ResultsSource>,
    pub weather: Arc<dyn WeatherSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Last success is recent enough; nothing ran
    Fresh,
    /// Cached state republished without recomputation
    Restored,
    Recomputed,
    Reloaded,
}

/// The loaded season split around "now"
#[derive(Debug, Clone, Serialize)]
pub struct CalendarOverview {
    pub season: String,
    pub upcoming: Vec<RaceEvent>,
    /// Most recent first
    pub completed: Vec<RaceEvent>,
}

pub struct RaceWeekendService {
    season: String,
    settings: WeekendSettings,
    calendar_source: Arc<dyn CalendarSource>,
    results_source: Arc<dyn ResultsSource>,
    active: ActiveStateBuilder,
    coming_up: ComingUpStateBuilder,
    calendar: CalendarRepo,
    states: StateRepo,
    published: watch::Sender<RaceWeekendState>,
    cycle: Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl RaceWeekendService {
    pub fn new(
        season: String,
        settings: WeekendSettings,
        zone: DisplayZone,
        collaborators: Collaborators,
        weather_cache: Arc<WeatherRepo>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let weather = Arc::new(WeatherResolver::new(
            collaborators.weather,
            weather_cache,
            settings.forecast_days,
            settings.forecast_max_gap,
            settings.fetch_timeout,
        ));
        let active = ActiveStateBuilder::new(
            collaborators.results.clone(),
            weather.clone(),
            zone,
            settings.results_top_n,
            settings.fetch_timeout,
        );
        let coming_up = ComingUpStateBuilder::new(weather, zone);
        let (published, _) = watch::channel(RaceWeekendState::Loading);

        Self {
            season,
            settings,
            calendar_source: collaborators.calendar,
            results_source: collaborators.results,
            active,
            coming_up,
            calendar: CalendarRepo::new(),
            states: StateRepo::new(),
            published,
            cycle: Mutex::new(()),
            clock,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RaceWeekendState> {
        self.published.subscribe()
    }

    pub fn current(&self) -> RaceWeekendState {
        self.published.borrow().clone()
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.states.last_success()
    }

    pub fn countdown_to<Tz: TimeZone>(&self, target: &DateTime<Tz>) -> String {
        countdown_between(self.clock.now(), target)
    }

    /// Fetch the season calendar, replace the loaded one and run a cycle.
    ///
    /// A failed fetch leaves the previous calendar and cached state alone.
    pub async fn reload_calendar(&self) -> ApiResult<usize> {
        let _cycle = self.cycle.lock().await;

        let fetch = self.calendar_source.season_races(&self.season);
        let races = match bounded(self.settings.fetch_timeout, fetch).await {
            SubFetch::Fetched(races) => races,
            SubFetch::Failed(e) => {
                error!("Calendar fetch for {} failed: {}", self.season, e);
                self.publish_fallback(e.state_message());
                return Err(e);
            }
            SubFetch::TimedOut => {
                let e = ApiError::Timeout(format!("calendar for season {}", self.season));
                error!("{}", e);
                self.publish_fallback(e.state_message());
                return Err(e);
            }
        };

        let count = races.len();
        let races = self.attach_race_results(races, self.clock.now()).await;
        self.calendar.replace(races);
        info!("Loaded {} races for season {}", count, self.season);

        self.cycle_locked().await;
        Ok(count)
    }

    /// One full recomputation against the loaded calendar
    pub async fn run_cycle(&self) {
        let _cycle = self.cycle.lock().await;
        self.cycle_locked().await;
    }

    /// Periodic trigger. Without a calendar there is nothing to compute, so
    /// only the cached state is republished.
    pub async fn tick(&self) {
        if self.calendar.is_loaded() {
            self.run_cycle().await;
        } else if let Some(cached) = self.states.latest() {
            debug!("Calendar not loaded, republishing cached state");
            self.publish(cached);
        }
    }

    pub async fn refresh_if_stale(&self) -> RefreshOutcome {
        let now = self.clock.now();
        let stale = match self.states.last_success() {
            Some(at) => now - at > self.settings.stale_after,
            None => true,
        };
        let loading = self.published.borrow().is_loading();

        if !stale && loading {
            if let Some(cached) = self.states.latest() {
                info!("Restoring cached state while loading");
                self.publish(cached);
                return RefreshOutcome::Restored;
            }
        }
        if stale || loading {
            return self.recompute().await;
        }
        RefreshOutcome::Fresh
    }

    /// Recompute regardless of how recent the last success is
    pub async fn force_refresh(&self) -> RefreshOutcome {
        self.recompute().await
    }

    pub fn calendar_overview(&self) -> Option<CalendarOverview> {
        let races = self.calendar.snapshot()?;
        let now = self.clock.now();

        let (mut upcoming, mut completed): (Vec<RaceEvent>, Vec<RaceEvent>) = races
            .iter()
            .cloned()
            .partition(|race| race.race_start > now);
        upcoming.sort_by_key(|race| race.race_start);
        completed.sort_by_key(|race| std::cmp::Reverse(race.race_start));

        Some(CalendarOverview {
            season: self.season.clone(),
            upcoming,
            completed,
        })
    }

    /// Latest finished race that has a published classification
    pub fn last_race_result(&self) -> Option<RaceEvent> {
        let races = self.calendar.snapshot()?;
        let now = self.clock.now();
        races
            .iter()
            .filter(|race| race.race_start <= now && race.results.is_some())
            .max_by_key(|race| race.race_start)
            .cloned()
    }

    /// Drive the service: initial calendar load, then one tick per interval.
    pub fn spawn_periodic(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Starting race weekend task (interval: {}s)",
                self.settings.tick.as_secs()
            );
            if let Err(e) = self.reload_calendar().await {
                error!("Initial calendar load failed: {}", e);
            }
            loop {
                tokio::time::sleep(self.settings.tick).await;
                self.tick().await;
            }
        })
    }

    /// Fetch race classifications for every race that has already started.
    /// A failed or empty fetch leaves that race as it was.
    async fn attach_race_results(&self, races: Vec<RaceEvent>, now: DateTime<Utc>) -> Vec<RaceEvent> {
        join_all(races.into_iter().map(|race| async move {
            if race.results.is_some() || race.race_start > now {
                return race;
            }
            let fetch = self.results_source.race_results(&race.season, race.round);
            let fetched = bounded(self.settings.fetch_timeout, fetch).await;
            match fetched {
                SubFetch::Fetched(mut entries) if !entries.is_empty() => {
                    entries.sort_by_key(|e| e.position);
                    debug!("Round {}: {} race results", race.round, entries.len());
                    race.with_results(entries)
                }
                SubFetch::Fetched(_) => {
                    debug!("Round {}: no race results published", race.round);
                    race
                }
                SubFetch::Failed(e) => {
                    warn!("Round {} race results fetch failed: {}", race.round, e);
                    race
                }
                SubFetch::TimedOut => {
                    warn!("Round {} race results fetch timed out", race.round);
                    race
                }
            }
        }))
        .await
    }

    async fn recompute(&self) -> RefreshOutcome {
        if self.calendar.is_loaded() {
            self.run_cycle().await;
            return RefreshOutcome::Recomputed;
        }
        if let Err(e) = self.reload_calendar().await {
            warn!("Calendar reload during refresh failed: {}", e);
        }
        RefreshOutcome::Reloaded
    }

    /// Caller must hold the cycle lock
    async fn cycle_locked(&self) {
        let now = self.clock.now();
        let computed = AssertUnwindSafe(self.compute(now)).catch_unwind().await;

        match computed {
            Ok(Ok(state)) => {
                if let Some(race) = state.race().filter(|race| race.results.is_some()) {
                    self.calendar.record_results(race);
                }
                self.states.save(&state, now);
                self.publish(state);
            }
            Ok(Err(e)) => {
                warn!("Weekend cycle failed: {}", e);
                self.publish_fallback(e.state_message());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Weekend cycle panicked: {}", message);
                self.publish_fallback(message);
            }
        }
    }

    async fn compute(&self, now: DateTime<Utc>) -> ApiResult<RaceWeekendState> {
        let races = self
            .calendar
            .snapshot()
            .ok_or_else(|| ApiError::Internal("race calendar not loaded".to_string()))?;
        let overrun = self.settings.weekend_overrun;

        let race = select_current_or_next(&races, now, overrun)
            .ok_or_else(|| ApiError::NotFound(NO_UPCOMING_RACES.to_string()))?;

        if is_weekend_active(race, now, overrun) {
            let previous = self.states.latest();
            Ok(self.active.build(race, now, previous.as_ref()).await)
        } else {
            self.coming_up.build(race, now).await
        }
    }

    fn publish(&self, state: RaceWeekendState) {
        self.published.send_replace(state);
    }

    fn publish_fallback(&self, message: String) {
        match self.states.latest() {
            Some(cached) => {
                info!("Republishing cached state after failure: {}", message);
                self.publish(cached);
            }
            None => self.publish(RaceWeekendState::Error { message }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "weekend computation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        entries, sample_race, utc, FakeCalendar, FakeResults, FakeWeather, ManualClock,
    };
    use std::sync::atomic::Ordering;

    struct Harness {
        service: Arc<RaceWeekendService>,
        clock: Arc<ManualClock>,
        calendar: Arc<FakeCalendar>,
        results: Arc<FakeResults>,
    }

    fn harness(races: Vec<RaceEvent>, now: DateTime<Utc>, overrun_minutes: i64) -> Harness {
        let settings = WeekendSettings {
            fetch_timeout: std::time::Duration::from_millis(200),
            weekend_overrun: Duration::minutes(overrun_minutes),
            ..WeekendSettings::default()
        };
        harness_with(races, now, settings)
    }

    fn harness_with(races: Vec<RaceEvent>, now: DateTime<Utc>, settings: WeekendSettings) -> Harness {
        let clock = Arc::new(ManualClock::at(now));
        let calendar = Arc::new(FakeCalendar::with(races));
        let results = Arc::new(FakeResults::new());
        let service = RaceWeekendService::new(
            "2025".to_string(),
            settings,
            DisplayZone::from_offset_minutes(330).unwrap(),
            Collaborators {
                calendar: calendar.clone(),
                results: results.clone(),
                weather: Arc::new(FakeWeather::failing()),
            },
            Arc::new(WeatherRepo::new()),
            clock.clone(),
        );
        Harness {
            service: Arc::new(service),
            clock,
            calendar,
            results,
        }
    }

    /// Round 1: FP1 day0 09:00, qualifying day0 13:00, race day1 15:00
    fn round_one() -> RaceEvent {
        sample_race(
            1,
            utc(2025, 3, 14, 9, 0),
            Some(utc(2025, 3, 14, 13, 0)),
            utc(2025, 3, 15, 15, 0),
        )
    }

    fn round_two() -> RaceEvent {
        sample_race(
            2,
            utc(2025, 3, 21, 9, 0),
            Some(utc(2025, 3, 21, 13, 0)),
            utc(2025, 3, 22, 15, 0),
        )
    }

    #[test]
    fn test_weekend_active_boundary() {
        // FP1 at T, race end at T+5h
        let t = utc(2025, 6, 1, 10, 0);
        let race = sample_race(5, t, None, t + Duration::hours(3));
        let buffer = Duration::minutes(120);
        let second = Duration::seconds(1);

        assert!(!is_weekend_active(&race, t - second, buffer));
        assert!(is_weekend_active(&race, t, buffer));
        assert!(is_weekend_active(&race, t + Duration::hours(5) - second, buffer));
        assert!(is_weekend_active(&race, t + Duration::hours(5) + buffer - second, buffer));
        assert!(!is_weekend_active(&race, t + Duration::hours(5) + buffer, buffer));
    }

    #[test]
    fn test_selection_skips_finished_weekends() {
        let races = vec![round_two(), round_one()];
        let overrun = Duration::minutes(120);

        let picked = select_current_or_next(&races, utc(2025, 3, 1, 0, 0), overrun).unwrap();
        assert_eq!(picked.round, 1);

        // race started but weekend still running
        let picked = select_current_or_next(&races, utc(2025, 3, 15, 16, 0), overrun).unwrap();
        assert_eq!(picked.round, 1);

        let picked = select_current_or_next(&races, utc(2025, 3, 16, 0, 0), overrun).unwrap();
        assert_eq!(picked.round, 2);

        assert!(select_current_or_next(&races, utc(2025, 4, 1, 0, 0), overrun).is_none());
        assert!(select_current_or_next(&[], utc(2025, 4, 1, 0, 0), overrun).is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_weekend() {
        let h = harness(vec![round_one(), round_two()], utc(2025, 3, 14, 8, 0), 0);
        let mut updates = h.service.subscribe();
        assert!(updates.borrow().is_loading());

        assert_eq!(h.service.reload_calendar().await.unwrap(), 2);
        assert!(updates.has_changed().unwrap());
        match updates.borrow_and_update().clone() {
            RaceWeekendState::ComingUp {
                race,
                next_main_event_kind,
                ..
            } => {
                assert_eq!(race.round, 1);
                assert_eq!(next_main_event_kind, SessionKind::Qualifying);
            }
            other => panic!("expected ComingUp, got {:?}", other),
        }

        h.clock.set(utc(2025, 3, 14, 13, 30));
        h.service.run_cycle().await;
        match h.service.current() {
            RaceWeekendState::Active {
                race,
                current_live_event,
                completed_events,
                upcoming_events,
            } => {
                assert_eq!(race.round, 1);
                assert_eq!(current_live_event.map(|l| l.kind), Some(SessionKind::Qualifying));
                let completed: Vec<_> = completed_events.iter().map(|e| e.kind).collect();
                assert_eq!(completed, vec![SessionKind::Fp1]);
                let upcoming: Vec<_> = upcoming_events.iter().map(|e| e.kind).collect();
                assert_eq!(upcoming, vec![SessionKind::Race]);
            }
            other => panic!("expected Active, got {:?}", other),
        }

        h.clock.set(utc(2025, 3, 15, 17, 30));
        h.service.tick().await;
        match h.service.current() {
            RaceWeekendState::ComingUp { race, .. } => assert_eq!(race.round, 2),
            other => panic!("expected ComingUp, got {:?}", other),
        }
        assert_eq!(h.service.last_success(), Some(utc(2025, 3, 15, 17, 30)));
    }

    #[tokio::test]
    async fn test_refresh_if_stale() {
        let start = utc(2025, 3, 10, 12, 0);
        let h = harness(vec![round_one()], start, 120);

        // never loaded: reload
        assert_eq!(h.service.refresh_if_stale().await, RefreshOutcome::Reloaded);
        assert_eq!(h.calendar.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.service.last_success(), Some(start));

        h.clock.advance(Duration::minutes(1));
        assert_eq!(h.service.refresh_if_stale().await, RefreshOutcome::Fresh);
        assert_eq!(h.service.last_success(), Some(start));

        h.clock.set(start + Duration::minutes(6));
        assert_eq!(h.service.refresh_if_stale().await, RefreshOutcome::Recomputed);
        assert_eq!(h.service.last_success(), Some(start + Duration::minutes(6)));
        assert_eq!(h.calendar.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_restores_cache_while_loading() {
        let start = utc(2025, 3, 10, 12, 0);
        let h = harness(vec![round_one()], start, 120);
        h.service.reload_calendar().await.unwrap();
        let computed = h.service.current();

        h.service.publish(RaceWeekendState::Loading);
        h.clock.advance(Duration::minutes(1));

        assert_eq!(h.service.refresh_if_stale().await, RefreshOutcome::Restored);
        assert_eq!(h.service.current(), computed);
        assert_eq!(h.service.last_success(), Some(start));
    }

    #[tokio::test]
    async fn test_calendar_failure_without_cache_publishes_error() {
        let h = harness(vec![], utc(2025, 3, 10, 12, 0), 120);
        h.calendar.set(None);

        assert!(h.service.reload_calendar().await.is_err());
        assert!(matches!(h.service.current(), RaceWeekendState::Error { .. }));
        assert!(h.service.last_success().is_none());
        assert!(h.service.calendar_overview().is_none());
    }

    #[tokio::test]
    async fn test_calendar_failure_keeps_cached_state() {
        let start = utc(2025, 3, 10, 12, 0);
        let h = harness(vec![round_one()], start, 120);
        h.service.reload_calendar().await.unwrap();
        let computed = h.service.current();

        h.calendar.set(None);
        h.clock.advance(Duration::minutes(10));
        assert!(h.service.reload_calendar().await.is_err());

        assert_eq!(h.service.current(), computed);
        assert_eq!(h.service.last_success(), Some(start));
        // previous calendar still drives ticks
        h.service.tick().await;
        assert_eq!(h.service.last_success(), Some(start + Duration::minutes(10)));
    }

    #[tokio::test]
    async fn test_no_upcoming_races() {
        let h = harness(vec![round_one()], utc(2025, 12, 1, 0, 0), 120);
        h.service.reload_calendar().await.unwrap();
        assert_eq!(
            h.service.current(),
            RaceWeekendState::Error {
                message: NO_UPCOMING_RACES.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_season_over_republishes_cache() {
        let h = harness(vec![round_one()], utc(2025, 3, 10, 0, 0), 120);
        h.service.reload_calendar().await.unwrap();
        let computed = h.service.current();

        h.clock.set(utc(2025, 12, 1, 0, 0));
        h.service.tick().await;
        assert_eq!(h.service.current(), computed);
    }

    #[tokio::test]
    async fn test_panicking_cycle_falls_back() {
        let h = harness(vec![round_one()], utc(2025, 3, 14, 15, 0), 120);
        h.results.set(SessionKind::Qualifying, Some(entries(&["NOR", "PIA", "VER"])));
        h.service.reload_calendar().await.unwrap();
        let computed = h.service.current();
        assert!(matches!(computed, RaceWeekendState::Active { .. }));

        h.results.panic_on_fetch(true);
        h.clock.advance(Duration::minutes(1));
        h.service.run_cycle().await;
        assert_eq!(h.service.current(), computed);
    }

    #[tokio::test]
    async fn test_panicking_cycle_without_cache_is_error() {
        let h = harness(vec![round_one()], utc(2025, 3, 14, 15, 0), 120);
        h.results.panic_on_fetch(true);
        h.service.reload_calendar().await.unwrap();

        match h.service.current() {
            RaceWeekendState::Error { message } => assert!(message.contains("results source")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tick_without_calendar_keeps_loading() {
        let h = harness(vec![round_one()], utc(2025, 3, 10, 0, 0), 120);
        h.service.tick().await;
        assert!(h.service.current().is_loading());
        assert_eq!(h.calendar.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_triggers_serialize() {
        let h = harness(vec![round_one(), round_two()], utc(2025, 3, 14, 15, 0), 120);
        let h_results = h.results.clone();
        h_results.set(SessionKind::Qualifying, Some(entries(&["LEC"])));
        h.service.reload_calendar().await.unwrap();

        let a = h.service.clone();
        let b = h.service.clone();
        let c = h.service.clone();
        tokio::join!(a.run_cycle(), b.force_refresh(), c.reload_calendar());

        match h.service.current() {
            RaceWeekendState::Active {
                completed_events, ..
            } => {
                assert_eq!(completed_events.len(), 2);
                assert_eq!(completed_events[1].results.len(), 1);
            }
            other => panic!("expected Active, got {:?}", other),
        }
        assert_eq!(h_results.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_calendar_overview_splits_season() {
        let h = harness(vec![round_one(), round_two()], utc(2025, 3, 18, 0, 0), 120);
        h.service.reload_calendar().await.unwrap();

        let overview = h.service.calendar_overview().unwrap();
        assert_eq!(overview.season, "2025");
        assert_eq!(overview.upcoming.len(), 1);
        assert_eq!(overview.upcoming[0].round, 2);
        assert_eq!(overview.completed[0].round, 1);
    }

    #[tokio::test]
    async fn test_countdown_uses_service_clock() {
        let h = harness(vec![], utc(2025, 3, 14, 8, 0), 120);
        let target = utc(2025, 3, 16, 13, 0);
        assert_eq!(h.service.countdown_to(&target), "2d 5h");
        assert_eq!(h.service.countdown_to(&utc(2025, 3, 14, 7, 0)), "0s");
    }

    #[tokio::test]
    async fn test_reload_attaches_results_to_finished_races() {
        let h = harness(vec![round_one(), round_two()], utc(2025, 3, 18, 0, 0), 120);
        h.results.set(SessionKind::Race, Some(entries(&["NOR", "VER", "LEC"])));
        h.service.reload_calendar().await.unwrap();

        let overview = h.service.calendar_overview().unwrap();
        let finished = overview.completed[0].results.clone().unwrap();
        let codes: Vec<_> = finished.iter().map(|e| e.driver_code.as_str()).collect();
        assert_eq!(codes, vec!["NOR", "VER", "LEC"]);
        assert!(overview.upcoming[0].results.is_none());

        let last = h.service.last_race_result().unwrap();
        assert_eq!(last.round, 1);
        // only the finished round is asked for
        assert_eq!(h.results.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_results_leave_race_unchanged() {
        let h = harness(vec![round_one(), round_two()], utc(2025, 3, 18, 0, 0), 120);
        h.results.set(SessionKind::Race, None);
        h.service.reload_calendar().await.unwrap();

        let overview = h.service.calendar_overview().unwrap();
        assert_eq!(overview.completed[0], round_one());
        assert!(h.service.last_race_result().is_none());
        assert!(matches!(h.service.current(), RaceWeekendState::ComingUp { .. }));
    }

    #[tokio::test]
    async fn test_finished_weekend_results_reach_calendar() {
        // loaded on Saturday before the race has run
        let h = harness(vec![round_one(), round_two()], utc(2025, 3, 15, 12, 0), 120);
        h.service.reload_calendar().await.unwrap();
        assert!(h.service.last_race_result().is_none());

        h.results.set(SessionKind::Race, Some(entries(&["PIA", "NOR", "RUS", "VER"])));
        h.clock.set(utc(2025, 3, 15, 17, 30));
        h.service.run_cycle().await;

        let last = h.service.last_race_result().unwrap();
        assert_eq!(last.round, 1);
        assert_eq!(last.results.map(|r| r.len()), Some(3));
    }

    #[tokio::test]
    async fn test_periodic_task_does_not_retry_calendar() {
        let settings = WeekendSettings {
            tick: std::time::Duration::from_millis(10),
            fetch_timeout: std::time::Duration::from_millis(200),
            ..WeekendSettings::default()
        };
        let h = harness_with(vec![round_one()], utc(2025, 3, 10, 0, 0), settings);
        h.calendar.set(None);

        let task = h.service.clone().spawn_periodic();
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        task.abort();

        assert_eq!(h.calendar.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(h.service.current(), RaceWeekendState::Error { .. }));
    }
}
