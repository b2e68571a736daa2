/// In-memory stores owned by the race weekend service
use crate::domain::{RaceEvent, RaceWeekendState, SessionWeather};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Season race list, replaced wholesale on every successful load
#[derive(Default)]
pub struct CalendarRepo {
    races: RwLock<Option<Arc<Vec<RaceEvent>>>>,
}

impl CalendarRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, races: Vec<RaceEvent>) {
        let mut guard = self.races.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(races));
    }

    /// `None` until the first successful load
    pub fn snapshot(&self) -> Option<Arc<Vec<RaceEvent>>> {
        self.races
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Swap in `race` for its round when it carries results
    pub fn record_results(&self, race: &RaceEvent) {
        if race.results.is_none() {
            return;
        }
        let mut guard = self.races.write().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = guard.as_ref() else {
            return;
        };
        if !current.iter().any(|r| r.is_same_round(race) && r.results != race.results) {
            return;
        }
        let updated = current
            .iter()
            .map(|r| if r.is_same_round(race) { race.clone() } else { r.clone() })
            .collect();
        *guard = Some(Arc::new(updated));
    }
}

/// Cache key: circuit coordinates plus the exact session start
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeatherKey {
    latitude_bits: u64,
    longitude_bits: u64,
    starts_at: DateTime<Utc>,
}

impl WeatherKey {
    pub fn new(latitude: f64, longitude: f64, starts_at: DateTime<Utc>) -> Self {
        Self {
            latitude_bits: latitude.to_bits(),
            longitude_bits: longitude.to_bits(),
            starts_at,
        }
    }
}

/// Resolved per-session forecasts. Lives for the whole process; a season
/// only ever adds one entry per session.
#[derive(Default)]
pub struct WeatherRepo {
    entries: Mutex<HashMap<WeatherKey, SessionWeather>>,
}

impl WeatherRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &WeatherKey) -> Option<SessionWeather> {
        lock(&self.entries).get(key).cloned()
    }

    pub fn store(&self, key: WeatherKey, weather: SessionWeather) {
        lock(&self.entries).insert(key, weather);
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }
}

struct CachedState {
    state: RaceWeekendState,
    saved_at: DateTime<Utc>,
}

/// Last successfully computed weekend state
#[derive(Default)]
pub struct StateRepo {
    cached: Mutex<Option<CachedState>>,
}

impl StateRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `state` as the fallback. Loading and Error are never kept.
    pub fn save(&self, state: &RaceWeekendState, at: DateTime<Utc>) -> bool {
        if !state.is_cacheable() {
            return false;
        }
        *lock(&self.cached) = Some(CachedState {
            state: state.clone(),
            saved_at: at,
        });
        true
    }

    pub fn latest(&self) -> Option<RaceWeekendState> {
        lock(&self.cached).as_ref().map(|c| c.state.clone())
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        lock(&self.cached).as_ref().map(|c| c.saved_at)
    }
}
