// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! `ExifTool` metadata handling for media files.

use core::fmt;
use std::{
  fmt::{Display, Formatter},
  path::{Path, PathBuf},
};

use chrono::{FixedOffset, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

/// File types whose container stores date & time tags in UTC.
const QUICKTIME_FILE_TYPES: [&str; 5] = ["MOV", "MP4", "M4V", "3GP", "3G2"];

/// What `QuickTime:*Date` tags report after being cleared.
const QUICKTIME_ZERO_DATE: &str = "0000:00:00 00:00:00";

/// Metadata for an image or video file.
///
/// Names are from `ExifTool`'s tags: <https://exiftool.org/TagNames/>.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Metadata {
  // General.
  pub source_file: PathBuf,
  pub file_type:   String,

  // Date & Time.
  //
  // SubSec* fields are composite tags joining the base *Date* tag with its
  // OffsetTime* and SubSecTime* tags. They are only present if the base tag
  // is, *and* either of the others.

  // Most recent system file modification.
  pub file_modify_date: Option<String>,

  // Date of most recent edit.
  pub modify_date:         Option<String>,
  pub sub_sec_modify_date: Option<String>,

  // Date of media file creation. For QuickTime, the only capture time.
  pub create_date:         Option<String>,
  pub sub_sec_create_date: Option<String>,
  pub media_create_date:   Option<String>,

  // Date of media capture (e.g. actuating the shutter).
  pub date_time_original:         Option<String>,
  pub sub_sec_date_time_original: Option<String>,

  // Video.
  //
  // Reported either as a number of seconds or as text (`0:00:05`, `2.53 s`).
  pub duration: Option<Value>,
}

impl Metadata {
  /// Gets the capture time, falling back through the tags that can hold it.
  pub fn get_date_time_original(&self) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    [
      &self.sub_sec_date_time_original,
      &self.date_time_original,
      &self.sub_sec_create_date,
      &self.create_date,
      &self.media_create_date,
    ]
    .into_iter()
    .find_map(|tag| parse_tag(tag.as_deref()))
  }

  /// Gets any embedded time: capture, then creation, then modification.
  pub fn get_embedded_date_time(&self) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    self.get_date_time_original().or_else(|| {
      [&self.sub_sec_modify_date, &self.modify_date]
        .into_iter()
        .find_map(|tag| parse_tag(tag.as_deref()))
    })
  }

  /// Returns the duration as reported, if numeric.
  pub fn get_duration_seconds(&self) -> Option<f64> {
    self.duration.as_ref()?.as_f64()
  }

  /// Returns the duration as reported, if text.
  pub fn get_duration_text(&self) -> Option<&str> {
    self.duration.as_ref()?.as_str()
  }

  /// Whether naive date & time tags in this file are UTC rather than local.
  pub fn is_quicktime(&self) -> bool {
    QUICKTIME_FILE_TYPES.contains(&self.file_type.as_str())
  }
}

fn parse_tag(tag: Option<&str>) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
  let tag = tag.filter(|d| *d != QUICKTIME_ZERO_DATE)?;
  super::parse_date_time(tag)
    .map_err(|e| log::debug!("{e}"))
    .ok()
}

impl AsRef<Path> for Metadata {
  fn as_ref(&self) -> &Path {
    &self.source_file
  }
}

impl Display for Metadata {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}", self.source_file.display())
  }
}
