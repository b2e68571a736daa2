/// Pre-weekend view: headline main event plus weather for remaining sessions
use super::{session_catalog, WeatherResolver};
use crate::domain::{RaceEvent, RaceWeekendState, UpcomingEvent};
use crate::errors::{ApiError, ApiResult};
use crate::utils::DisplayZone;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

pub struct ComingUpStateBuilder {
    weather: Arc<WeatherResolver>,
    zone: DisplayZone,
}

impl ComingUpStateBuilder {
    pub fn new(weather: Arc<WeatherResolver>, zone: DisplayZone) -> Self {
        Self { weather, zone }
    }

    pub async fn build(&self, race: &RaceEvent, now: DateTime<Utc>) -> ApiResult<RaceWeekendState> {
        let catalog = session_catalog(race);

        let headline = catalog
            .iter()
            .filter(|w| w.kind.is_main_event())
            .find(|w| !w.is_completed_at(now))
            .or_else(|| catalog.iter().find(|w| w.kind.is_main_event()))
            .ok_or_else(|| {
                ApiError::Internal(format!("{} has no main event scheduled", race.name))
            })?;

        let next_index = catalog.iter().position(|w| !w.is_completed_at(now));

        let upcoming_events = join_all(catalog.iter().enumerate().map(|(index, window)| {
            let completed = window.is_completed_at(now);
            async move {
                let starts_at = self.zone.to_display(window.start);
                let weather = if completed {
                    None
                } else {
                    self.weather.resolve(&race.circuit.location, starts_at).await
                };
                UpcomingEvent {
                    kind: window.kind,
                    starts_at,
                    is_next: Some(index) == next_index,
                    weather,
                    is_completed: completed,
                }
            }
        }))
        .await;

        info!(
            "{} coming up: next main event {} at {}",
            race.name,
            headline.kind.display_name(),
            headline.start
        );

        Ok(RaceWeekendState::ComingUp {
            race: race.clone(),
            next_main_event: self.zone.to_display(headline.start),
            next_main_event_kind: headline.kind,
            upcoming_events,
        })
    }
}
