/// Race weekend engine services
mod active;
mod catalog;
mod coming_up;
mod orchestrator;
mod weather;

pub use active::ActiveStateBuilder;
pub use catalog::session_catalog;
pub use coming_up::ComingUpStateBuilder;
pub use orchestrator::{CalendarOverview, Collaborators, RaceWeekendService, RefreshOutcome};
pub use weather::WeatherResolver;

use crate::errors::{ApiError, ApiResult};
use std::future::Future;
use std::time::Duration;

/// Outcome of one bounded collaborator call inside a cycle
#[derive(Debug)]
pub enum SubFetch<T> {
    Fetched(T),
    Failed(ApiError),
    TimedOut,
}

/// Run `fut` with a deadline, folding errors and timeouts into `SubFetch`
pub async fn bounded<T, F>(limit: Duration, fut: F) -> SubFetch<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => SubFetch::Fetched(value),
        Ok(Err(e)) => SubFetch::Failed(e),
        Err(_) => SubFetch::TimedOut,
    }
}
