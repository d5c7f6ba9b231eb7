use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::fmt::Display;
use std::sync::OnceLock;

const DISPLAY_FORMAT: &str = "%b %-d, %Y, %H:%M";

fn timestamp_re() -> &'static Regex {
    static TS_RE: OnceLock<Regex> = OnceLock::new();
    TS_RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4}-\d{2}-\d{2})(?:[T ](\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?))?\s*(Z|z|[+-]\d{2}:?\d{2})?$",
        )
        .expect("valid timestamp regex")
    })
}

/// Parse a server timestamp; a missing zone marker means UTC.
pub fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let caps = timestamp_re().captures(raw.trim())?;

    let date = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()?;
    let time = match caps.get(2) {
        Some(time) => parse_time(time.as_str())?,
        None => NaiveTime::MIN,
    };
    let naive = NaiveDateTime::new(date, time);

    let offset = match caps.get(3).map(|m| m.as_str()) {
        None | Some("Z") | Some("z") => FixedOffset::east_opt(0)?,
        Some(marker) => parse_offset(marker)?,
    };

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn parse_offset(marker: &str) -> Option<FixedOffset> {
    let sign = if marker.starts_with('-') { -1 } else { 1 };
    let digits: String = marker[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4)?.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub fn format_in<Tz>(instant: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(zone).format(DISPLAY_FORMAT).to_string()
}

/// Render for the viewer's local zone. Empty input stays empty and anything
/// unparseable is shown as received.
pub fn format_local(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    match parse_server_timestamp(raw) {
        Some(instant) => format_in(&instant, &Local),
        None => {
            tracing::debug!("Unrecognized timestamp from server: {}", raw);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: &str) -> String {
        parse_server_timestamp(raw).unwrap().to_rfc3339()
    }

    #[test]
    fn naive_timestamps_are_utc() {
        assert_eq!(utc("2025-10-16T15:38:00"), "2025-10-16T15:38:00+00:00");
        assert_eq!(utc("2025-10-16 15:38:00.123456"), "2025-10-16T15:38:00.123456+00:00");
        assert_eq!(utc("2025-10-16T15:38"), "2025-10-16T15:38:00+00:00");
    }

    #[test]
    fn explicit_zones_are_honored() {
        assert_eq!(utc("2025-10-16T15:38:00Z"), "2025-10-16T15:38:00+00:00");
        assert_eq!(utc("2025-10-16T15:38:00+02:00"), "2025-10-16T13:38:00+00:00");
        assert_eq!(utc("2025-10-16T15:38:00-0530"), "2025-10-16T21:08:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_server_timestamp("yesterday").is_none());
        assert!(parse_server_timestamp("2025-13-01T00:00:00").is_none());
        assert_eq!(format_local("yesterday"), "yesterday");
        assert_eq!(format_local(""), "");
    }

    #[test]
    fn formats_in_viewer_zone() {
        let instant = parse_server_timestamp("2025-10-16T15:38:00").unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let new_york = FixedOffset::west_opt(4 * 3600).unwrap();

        assert_eq!(format_in(&instant, &Utc), "Oct 16, 2025, 15:38");
        assert_eq!(format_in(&instant, &tokyo), "Oct 17, 2025, 00:38");
        assert_eq!(format_in(&instant, &new_york), "Oct 16, 2025, 11:38");
    }
}
