/// Time and zone utilities
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Source of "now" for the weekend engine
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed-offset zone used for everything shown to users
#[derive(Clone, Copy, Debug)]
pub struct DisplayZone {
    offset: FixedOffset,
}

impl DisplayZone {
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn to_display(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }
}

/// Combine the calendar's `date` and optional `time` fields into a UTC instant.
///
/// Times are Zulu on the wire; a missing `Z` is tolerated and a missing time
/// means midnight.
pub fn parse_wire_instant(date: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    let time = time.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("00:00:00Z");
    let combined = format!("{}T{}", date.trim(), time);

    if let Ok(dt) = combined.parse::<DateTime<Utc>>() {
        return Some(dt);
    }
    let naive = combined.trim_end_matches('Z');
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

/// Parse an hourly forecast timestamp (`2025-03-15T14:00`, UTC)
pub fn parse_forecast_hour(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Parse a coordinate published as a string or number
pub fn parse_coordinate(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Human countdown from `now` to `target`: the two largest non-zero units
/// among days, hours, minutes and seconds. `0s` once the target has passed.
pub fn countdown_between<Tz: TimeZone>(now: DateTime<Utc>, target: &DateTime<Tz>) -> String {
    let remaining = target.with_timezone(&Utc) - now;
    let total = remaining.num_seconds();
    if total <= 0 {
        return "0s".to_string();
    }

    let units = [
        (total / 86_400, "d"),
        ((total % 86_400) / 3_600, "h"),
        ((total % 3_600) / 60, "m"),
        (total % 60, "s"),
    ];

    units
        .iter()
        .filter(|(value, _)| *value > 0)
        .take(2)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect::<Vec<_>>()
        .join(" ")
}
