// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Conversions between the date, time and duration formats produced by
//! `ExifTool`, Google sidecars and the filesystem.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

static DATE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^([0-9]{4}[-:][0-9]{2}[-:][0-9]{2}[T ][0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]{1,9})?)(Z|[+-][0-9]{2}:[0-9]{2})?$")
    .unwrap()
});
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}$").unwrap());
static HMS_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(?:([0-9]+):)?([0-9]+):([0-9]+(?:\.[0-9]+)?)$").unwrap());
static SECONDS_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)\s*(?:s|sec|secs|seconds)?(?:\s*\(approx\))?$").unwrap());

/// Format `ExifTool` expects when writing date & time tags.
pub const EXIF_WRITE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Converts a date & time string to a `NaiveDateTime` and an optional
/// `FixedOffset`. Accepts RFC3339 as produced by `ExifTool`'s `-d` option, and
/// raw EXIF (`YYYY:MM:DD HH:MM:SS`), both optionally without a time zone.
pub fn parse_date_time(date_time: &str) -> Result<(NaiveDateTime, Option<FixedOffset>), String> {
  let caps = DATE_TIME_RE.captures(date_time.trim()).ok_or(format!(
    "Date Time string `{date_time}` did not match regex."
  ))?;

  // Normalize EXIF separators so one format string covers both.
  let mut normalized = caps[1].to_string();
  normalized.replace_range(4..5, "-");
  normalized.replace_range(7..8, "-");
  normalized.replace_range(10..11, "T");

  let naive = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
    .map_err(|e| format!("Unable to parse date & time `{date_time}` ({e})."))?;

  let offset = match caps.get(2).map(|m| m.as_str()) {
    None => None,
    Some("Z") => Some(Utc.fix()),
    Some(offset) => Some(parse_offset(offset)?),
  };

  Ok((naive, offset))
}

/// Parses `+HH:MM` / `-HH:MM`.
pub fn parse_offset(offset: &str) -> Result<FixedOffset, String> {
  let invalid = || format!("Invalid time zone offset `{offset}`.");

  let sign = match offset.chars().next() {
    Some('+') => 1,
    Some('-') => -1,
    _ => return Err(invalid()),
  };
  let (hours, minutes) = offset[1..].split_once(':').ok_or_else(invalid)?;
  let hours = hours.parse::<i32>().map_err(|_| invalid())?;
  let minutes = minutes.parse::<i32>().map_err(|_| invalid())?;

  FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Determines the time zone offset at a given date and time, within the named
/// time zone. Times skipped by a clock change take the offset in effect at the
/// same reading in UTC.
pub fn get_offset_for_time_zone(date_time: &NaiveDateTime, time_zone: Tz) -> FixedOffset {
  time_zone
    .offset_from_local_datetime(date_time)
    .earliest()
    .map_or_else(
      || time_zone.offset_from_utc_datetime(date_time).fix(),
      |o| o.fix(),
    )
}

/// Attaches an offset to a naive wall-clock time, using `offset` if the source
/// carried one, else the rules of `time_zone`.
pub fn localize(
  date_time: NaiveDateTime,
  offset: Option<FixedOffset>,
  time_zone: Tz,
) -> Option<DateTime<FixedOffset>> {
  let offset = offset.unwrap_or_else(|| get_offset_for_time_zone(&date_time, time_zone));
  date_time.and_local_timezone(offset).single()
}

/// Converts Unix epoch seconds to wall-clock time in `time_zone`.
pub fn from_epoch(seconds: i64, time_zone: Tz) -> Option<DateTime<FixedOffset>> {
  DateTime::<Utc>::from_timestamp(seconds, 0).map(|d| d.with_timezone(&time_zone).fixed_offset())
}

/// Placeholder instant for media only known to belong to `year`: July 1st,
/// noon.
pub fn mid_year(year: i32, time_zone: Tz) -> Option<DateTime<FixedOffset>> {
  let date_time = NaiveDate::from_ymd_opt(year, 7, 1)?.and_hms_opt(12, 0, 0)?;
  localize(date_time, None, time_zone)
}

/// Whether `year` renders as exactly four digits.
pub fn is_valid_year(year: i32) -> bool {
  YEAR_RE.is_match(&year.to_string())
}

/// Parses a video duration in seconds from the free-text forms `ExifTool`
/// reports: `H:M:S`, `M:S`, `<n> s` or a bare number.
pub fn parse_duration(text: &str) -> Option<f64> {
  let text = text.trim();

  if let Some(caps) = HMS_RE.captures(text) {
    let hours = caps
      .get(1)
      .map_or(Some(0.0), |h| h.as_str().parse::<f64>().ok())?;
    let minutes = caps[2].parse::<f64>().ok()?;
    let seconds = caps[3].parse::<f64>().ok()?;
    return Some(hours * 3600.0 + minutes * 60.0 + seconds);
  }

  SECONDS_RE
    .captures(text)
    .and_then(|caps| caps[1].parse::<f64>().ok())
}




#[cfg(test)]
mod test_mid_year {
  use super::*;
  use crate::testing::*;

  #[test]
  fn returns_july_first_noon() {
    assert_eq!(
      mid_year(2018, Tz::UTC).unwrap(),
      make_date(2018, 7, 1, 12, 0, 0, 0, 0)
    );
  }
}


#[cfg(test)]
mod test_parse_duration {
  use super::*;

  #[test]
  fn parses_hours_minutes_seconds() {
    assert_eq!(parse_duration("0:01:05"), Some(65.0));
    assert_eq!(parse_duration("1:00:00"), Some(3600.0));
  }

  #[test]
  fn parses_minutes_seconds() {
    assert_eq!(parse_duration("0:02"), Some(2.0));
  }

  #[test]
  fn parses_seconds_with_unit() {
    assert_eq!(parse_duration("2.53 s"), Some(2.53));
    assert_eq!(parse_duration("1.5 s (approx)"), Some(1.5));
  }

  #[test]
  fn parses_bare_number() {
    assert_eq!(parse_duration("2.5"), Some(2.5));
  }

  #[test]
  fn rejects_unknown_format() {
    assert_eq!(parse_duration("two seconds"), None);
    assert_eq!(parse_duration(""), None);
  }
}
