//! Conversion between date-times and the API's wire timestamp format.
//!
//! Carvoyant writes every date/time field as `yyyyMMddTHHmmss±HHmm`, for
//! example `20130526T204840+0000`. The offset is the encoding side's UTC
//! offset: `+` when local time is ahead of UTC, `-` when behind.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

const WIRE_PATTERN: &str = r"^(\d{4})(\d{2})(\d{2})T(\d{2})(\d{2})(\d{2})([+-])(\d{4})";

const FORMAT_MISMATCH: &str = "timestamp did not match expected format (yyyyMMddTHHmmssZ).";

/// Length of a wire timestamp such as `20130526T204840+0000`.
const WIRE_LENGTH: usize = 20;

/// Formats the server has been seen to write into action URIs. `%.f` also
/// matches when there are no fractional seconds.
const LENIENT_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

fn wire_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(WIRE_PATTERN).expect("wire timestamp pattern compiles"))
}

/// Encodes a date-time using its own offset.
///
/// Offset hours and minutes are truncated from the whole number of offset
/// minutes; sub-minute offsets are dropped.
#[must_use]
pub fn encode<Tz: TimeZone>(value: &DateTime<Tz>) -> String {
    let value = value.fixed_offset();
    let offset_minutes = value.offset().local_minus_utc() / 60;
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let offset_minutes = offset_minutes.abs();

    format!(
        "{}{sign}{:02}{:02}",
        value.format("%Y%m%dT%H%M%S"),
        offset_minutes / 60,
        offset_minutes % 60
    )
}

/// Encodes an instant in the process-local timezone.
#[must_use]
pub fn encode_local(value: &DateTime<Utc>) -> String {
    encode(&value.with_timezone(&Local))
}

/// Returns true when `value` starts with a wire timestamp.
#[must_use]
pub fn is_wire_timestamp(value: &str) -> bool {
    wire_pattern().is_match(value)
}

/// Returns true when `value` is exactly one wire timestamp naming a real date.
#[must_use]
pub fn is_exact_wire_timestamp(value: &str) -> bool {
    value.len() == WIRE_LENGTH && decode(value).is_ok()
}

/// Decodes a wire timestamp.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] when the input does not match the wire
/// pattern or names an impossible date.
pub fn decode(timestamp: &str) -> Result<DateTime<FixedOffset>> {
    let captures = wire_pattern()
        .captures(timestamp)
        .ok_or_else(|| Error::InvalidTimestamp(FORMAT_MISMATCH.to_string()))?;

    let iso = format!(
        "{}-{}-{}T{}:{}:{}{}{}",
        &captures[1],
        &captures[2],
        &captures[3],
        &captures[4],
        &captures[5],
        &captures[6],
        &captures[7],
        &captures[8]
    );

    DateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S%z")
        .map_err(|err| Error::InvalidTimestamp(format!("{FORMAT_MISMATCH} ({err})")))
}

/// Parses a timestamp found in a server-provided URI.
///
/// Accepts the wire format, RFC 3339, and the `yyyy-MM-dd HH:mm:ss±HHmm`
/// form that appears once a `+` in a query string has been decoded to a space.
/// The ISO forms may carry fractional seconds.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] when no known format matches.
pub fn parse_lenient(value: &str) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();

    if is_wire_timestamp(value) {
        return decode(value);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed);
    }

    LENIENT_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| Error::InvalidTimestamp(format!("unrecognized timestamp `{value}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_utc_timestamp() {
        let decoded = decode("20130526T204840+0000").unwrap();
        let expected = Utc.with_ymd_and_hms(2013, 5, 26, 20, 48, 40).unwrap();
        assert_eq!(decoded, expected);
        assert_eq!(decoded.timestamp_millis(), 1_369_601_320_000);
    }

    #[test]
    fn decode_keeps_offset() {
        let decoded = decode("20130526T204840-0500").unwrap();
        assert_eq!(decoded.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(
            decoded.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2013, 5, 27, 1, 48, 40).unwrap()
        );
    }

    #[test]
    fn decode_rejects_other_formats() {
        for value in ["", "2013-05-26T20:48:40Z", "Sun May 26 2013 20:48:40", "20130526T2048+0000"] {
            let err = decode(value).unwrap_err();
            assert_eq!(err.to_string(), FORMAT_MISMATCH, "input: {value:?}");
        }
    }

    #[test]
    fn decode_rejects_impossible_dates() {
        let err = decode("20131326T204840+0000").unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp(_)));
    }

    #[test]
    fn encode_zero_pads_fields() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let value = offset.with_ymd_and_hms(2014, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(encode(&value), "20140102T030405+0000");
    }

    #[test]
    fn encode_offset_sign() {
        let behind = FixedOffset::west_opt(5 * 3600).unwrap();
        let value = behind.with_ymd_and_hms(2013, 5, 26, 15, 48, 40).unwrap();
        assert_eq!(encode(&value), "20130526T154840-0500");

        let ahead = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();
        let value = ahead.with_ymd_and_hms(2013, 5, 27, 2, 33, 40).unwrap();
        assert_eq!(encode(&value), "20130527T023340+0545");
    }

    #[test]
    fn encode_truncates_sub_minute_offsets() {
        let odd = FixedOffset::east_opt(3600 + 59).unwrap();
        let value = odd.with_ymd_and_hms(2013, 5, 26, 21, 48, 40).unwrap();
        assert_eq!(encode(&value), "20130526T214840+0100");
    }

    #[test]
    fn round_trip_whole_minute_offsets() {
        for wire in [
            "20130526T204840+0000",
            "20130627T090000-0700",
            "20201231T235959+0530",
            "19991231T000000-0930",
        ] {
            assert_eq!(encode(&decode(wire).unwrap()), wire);
        }
    }

    #[test]
    fn encode_local_matches_local_offset() {
        let instant = Utc.with_ymd_and_hms(2013, 5, 26, 20, 48, 40).unwrap();
        let encoded = encode_local(&instant);
        assert!(is_wire_timestamp(&encoded));
        assert_eq!(decode(&encoded).unwrap(), instant);
    }

    #[test]
    fn parse_lenient_accepts_action_uri_forms() {
        let expected = Utc.with_ymd_and_hms(2013, 6, 27, 9, 0, 0).unwrap();
        for value in [
            "2013-06-27 09:00:00+0000",
            "2013-06-27T09:00:00+0000",
            "2013-06-27T09:00:00Z",
            "20130627T090000+0000",
            "2013-06-27T09:00:00.000+0000",
            "2013-06-27 09:00:00.000+0000",
            "2013-06-27T09:00:00.000Z",
        ] {
            assert_eq!(parse_lenient(value).unwrap(), expected, "input: {value:?}");
        }

        assert!(parse_lenient("yesterday").is_err());
    }

    #[test]
    fn parse_lenient_keeps_fractional_seconds() {
        let parsed = parse_lenient("2013-06-27T09:00:00.250-0500").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
        assert_eq!(parsed.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(encode(&parsed), "20130627T090000-0500");
    }

    #[test]
    fn exact_wire_timestamp_requires_whole_input() {
        assert!(is_exact_wire_timestamp("20130526T204840+0000"));
        assert!(is_wire_timestamp("20130526T204840+0000junk"));
        assert!(!is_exact_wire_timestamp("20130526T204840+0000junk"));
        assert!(!is_exact_wire_timestamp("20131326T204840+0000"));
        assert!(!is_exact_wire_timestamp("2013052"));
    }
}
