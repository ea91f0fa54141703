//! Conversions between stored strings, filesystem times and `DateTime<Utc>`

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use filetime::FileTime;

/// The "never synced" threshold.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(std::time::UNIX_EPOCH)
}

/// Render a timestamp for the state file.
///
/// RFC 3339 in UTC with as many fractional digits as needed, so that the
/// exact directory mtime round-trips and strict comparisons stay exact.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 with any offset, and naive ISO-8601 without an offset
/// (interpreted as local time).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
}

/// Convert a filesystem time, keeping nanosecond precision.
pub fn from_file_time(time: FileTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(time.unix_seconds(), time.nanoseconds()).unwrap_or_else(epoch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn format_roundtrips_nanoseconds() {
        let ts = DateTime::<Utc>::from_timestamp(1_714_557_600, 123_456_789).unwrap();
        let text = format_timestamp(ts);
        assert_eq!(text, "2024-05-01T10:00:00.123456789Z");
        assert_eq!(parse_timestamp(&text), Some(ts));
    }

    #[test]
    fn whole_seconds_have_no_fraction() {
        let ts = DateTime::<Utc>::from_timestamp(1_714_557_600, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-05-01T10:00:00Z");
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed, DateTime::<Utc>::from_timestamp(1_714_557_600, 0).unwrap());
    }

    #[rstest]
    #[case("2024-05-01T10:00:00.123456")]
    #[case("2024-05-01T10:00:00")]
    #[case("2024-05-01 10:00:00")]
    fn naive_values_are_read_as_local_time(#[case] raw: &str) {
        let parsed = parse_timestamp(raw).unwrap();
        let local = parsed.with_timezone(&Local).naive_local();
        assert_eq!(local.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-05-01 10:00:00");
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2024-13-01T00:00:00Z")]
    fn garbage_does_not_parse(#[case] raw: &str) {
        assert_eq!(parse_timestamp(raw), None);
    }

    #[test]
    fn file_time_conversion_is_exact() {
        let ft = FileTime::from_unix_time(1_600_000_000, 42);
        let ts = from_file_time(ft);
        assert_eq!(ts.timestamp(), 1_600_000_000);
        assert_eq!(ts.timestamp_subsec_nanos(), 42);
    }
}
