// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Google Photos JSON sidecar handling.
//!
//! Each exported media file may be accompanied by a JSON document holding the
//! authoritative capture time and location. Missing keys and JSON `null` are
//! always treated as absent, never as zero.

use core::fmt;
use std::{
  fmt::{Display, Formatter},
  fs,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Subset of a Google Photos sidecar consumed by the migration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sidecar {
  #[serde(skip)]
  path: PathBuf,

  pub title:            Option<String>,
  pub photo_taken_time: Option<TimestampField>,
  pub creation_time:    Option<TimestampField>,
  pub geo_data:         Option<GeoData>,
  pub geo_data_exif:    Option<GeoData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimestampField {
  /// Epoch seconds. Google writes a string, but numbers are accepted too.
  #[serde(deserialize_with = "string_or_number")]
  pub timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeoData {
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

impl Sidecar {
  /// Reads and parses the sidecar at `path`.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
    let path = path.as_ref();
    let bytes =
      fs::read(path).map_err(|e| format!("{}: Failed to read sidecar ({e}).", path.display()))?;
    Self::parse(path, &bytes)
  }

  /// Parses sidecar JSON `bytes` read from `path`.
  pub fn parse(path: impl AsRef<Path>, bytes: &[u8]) -> Result<Self, String> {
    let mut sidecar = serde_json::from_slice::<Sidecar>(bytes).map_err(|e| {
      format!(
        "{}: Failed to parse sidecar JSON ({e}).",
        path.as_ref().display()
      )
    })?;
    sidecar.path = path.as_ref().to_path_buf();
    Ok(sidecar)
  }

  /// Capture time in epoch seconds: `photoTakenTime`, else `creationTime`.
  pub fn get_timestamp(&self) -> Option<i64> {
    [&self.photo_taken_time, &self.creation_time]
      .into_iter()
      .find_map(|field| parse_timestamp(field.as_ref()?.timestamp.as_deref()?))
  }

  /// Location in degrees from `geoData`, else `geoDataExif`. A zero
  /// coordinate marks the location as unknown.
  pub fn get_lat_lon(&self) -> Option<(f64, f64)> {
    [&self.geo_data, &self.geo_data_exif]
      .into_iter()
      .find_map(|geo| {
        let geo = geo.as_ref()?;
        let (latitude, longitude) = (geo.latitude?, geo.longitude?);
        (latitude != 0.0 && longitude != 0.0).then_some((latitude, longitude))
      })
  }
}

fn parse_timestamp(timestamp: &str) -> Option<i64> {
  let timestamp = timestamp.trim();
  if timestamp.is_empty() || timestamp == "null" {
    return None;
  }
  timestamp.parse::<i64>().ok()
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
  Ok(match Option::<Value>::deserialize(deserializer)? {
    Some(Value::String(s)) => Some(s),
    Some(Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

impl AsRef<Path> for Sidecar {
  fn as_ref(&self) -> &Path {
    &self.path
  }
}

impl Display for Sidecar {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}", self.path.display())
  }
}
