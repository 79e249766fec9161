// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Resolved capture times and the year buckets they sort media into.

use core::fmt;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, FixedOffset};

use crate::config::constants::UNKNOWN_BUCKET;

/// Which tier of the resolution cascade produced a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provenance {
  Sidecar,
  EmbeddedMetadata,
  FolderYear,
  Unresolved,
}

impl Display for Provenance {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Provenance::Sidecar => write!(f, "sidecar"),
      Provenance::EmbeddedMetadata => write!(f, "embedded-metadata"),
      Provenance::FolderYear => write!(f, "folder-year"),
      Provenance::Unresolved => write!(f, "unresolved"),
    }
  }
}

/// Year subdirectory of the canonical library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
  Year(i32),
  Unknown,
}

impl Bucket {
  /// Parses a bucket directory name, e.g. `2015` or `Unknown`.
  pub fn from_dir_name(name: &str) -> Option<Self> {
    if name == UNKNOWN_BUCKET {
      return Some(Bucket::Unknown);
    }
    name
      .parse::<i32>()
      .ok()
      .filter(|y| super::is_valid_year(*y) && y.to_string() == name)
      .map(Bucket::Year)
  }

  pub fn year(self) -> Option<i32> {
    match self {
      Bucket::Year(year) => Some(year),
      Bucket::Unknown => None,
    }
  }
}

impl Display for Bucket {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Bucket::Year(year) => write!(f, "{year}"),
      Bucket::Unknown => write!(f, "{UNKNOWN_BUCKET}"),
    }
  }
}

/// Best-effort capture time of a media file, with where it came from. Only
/// `Unresolved` lacks a date & time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
  date_time:  Option<DateTime<FixedOffset>>,
  provenance: Provenance,
}

impl ResolvedTimestamp {
  /// Creates a resolved timestamp. Date & times whose year is not four digits
  /// are rejected.
  pub fn new(date_time: DateTime<FixedOffset>, provenance: Provenance) -> Option<Self> {
    if provenance == Provenance::Unresolved || !super::is_valid_year(date_time.year()) {
      return None;
    }
    Some(Self {
      date_time: Some(date_time),
      provenance,
    })
  }

  pub fn unresolved() -> Self {
    Self {
      date_time:  None,
      provenance: Provenance::Unresolved,
    }
  }

  pub fn bucket(&self) -> Bucket {
    self
      .date_time
      .map_or(Bucket::Unknown, |d| Bucket::Year(d.year()))
  }

  pub fn date_time(&self) -> Option<DateTime<FixedOffset>> {
    self.date_time
  }

  pub fn provenance(&self) -> Provenance {
    self.provenance
  }

}

impl Display for ResolvedTimestamp {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.date_time {
      Some(date_time) => write!(f, "{} ({})", date_time.to_rfc3339(), self.provenance),
      None => write!(f, "{}", self.provenance),
    }
  }
}


#[cfg(test)]
mod test_resolved_timestamp {
  use super::*;
  use crate::testing::*;

  #[test]
  fn buckets_by_year() {
    let resolved =
      ResolvedTimestamp::new(make_date(2015, 1, 1, 0, 0, 0, 0, 0), Provenance::Sidecar).unwrap();

    assert_eq!(resolved.bucket(), Bucket::Year(2015));
  }

  #[test]
  fn buckets_unresolved_as_unknown() {
    let resolved = ResolvedTimestamp::unresolved();

    assert_eq!(resolved.bucket(), Bucket::Unknown);
    assert_eq!(resolved.provenance(), Provenance::Unresolved);
  }

  #[test]
  fn rejects_years_without_four_digits() {
    let date_time = make_date(999, 1, 1, 0, 0, 0, 0, 0);

    assert!(ResolvedTimestamp::new(date_time, Provenance::EmbeddedMetadata).is_none());
  }
}
