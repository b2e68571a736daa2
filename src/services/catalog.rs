/// Session catalog: the ordered sessions of one race weekend
use crate::domain::{RaceEvent, SessionKind, SessionWindow};

/// Every session present on `race`, ascending by start.
///
/// Absent optional sessions are skipped; the race itself is always present.
/// Equal starts fall back to kind priority.
pub fn session_catalog(race: &RaceEvent) -> Vec<SessionWindow> {
    let mut windows: Vec<SessionWindow> = SessionKind::ALL
        .into_iter()
        .filter_map(|kind| {
            race.session_start(kind)
                .map(|start| SessionWindow::new(kind, start))
        })
        .collect();

    windows.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.kind.priority().cmp(&b.kind.priority()))
    });
    windows
}
