// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Structure for holding configuration.

use std::{
  collections::HashMap,
  fs,
  path::{Path, PathBuf},
  sync::LazyLock,
};

use chrono::{Datelike, Local};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

use crate::prim::MediaKind;

pub mod constants;

static EXTENSIONS: LazyLock<HashMap<&'static str, ExtensionConfig>> = LazyLock::new(|| {
  constants::EXTENSIONS
    .iter()
    .map(|&(extension, video)| (extension, ExtensionConfig { video }))
    .collect()
});

pub struct ExtensionConfig {
  pub video: bool,
}

/// Run configuration. Every key is optional in the JSON file; missing keys
/// take the values from `constants`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// `ExifTool` executable, looked up in `PATH` unless absolute.
  pub exiftool:              PathBuf,
  /// Optional `ffprobe` executable, used as a last resort for video duration.
  pub ffprobe:               Option<PathBuf>,
  pub root_names:            Vec<String>,
  pub date_folder_pattern:   String,
  pub reserved_prefixes:     Vec<String>,
  pub edited_suffixes:       Vec<String>,
  pub companion_max_bytes:   u64,
  pub companion_max_seconds: f64,
  pub dedup_prefix_bytes:    u64,
  /// IANA name of the zone used for wall-clock times without an offset.
  /// Defaults to UTC.
  pub time_zone:             Option<String>,
  /// Derive the wall-clock zone of sidecar timestamps from their GPS position.
  pub time_zone_from_gps:    bool,
  /// Year treated as "no timestamp was ever found". Defaults to the current
  /// year.
  pub threshold_year:        Option<i32>,
  pub stale_warning_limit:   usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      exiftool:              PathBuf::from("exiftool"),
      ffprobe:               None,
      root_names:            to_strings(&constants::ROOT_NAMES),
      date_folder_pattern:   constants::DATE_FOLDER_PATTERN.to_string(),
      reserved_prefixes:     to_strings(&constants::RESERVED_PREFIXES),
      edited_suffixes:       to_strings(&constants::EDITED_SUFFIXES),
      companion_max_bytes:   constants::COMPANION_MAX_BYTES,
      companion_max_seconds: constants::COMPANION_MAX_SECONDS,
      dedup_prefix_bytes:    constants::DEDUP_PREFIX_BYTES,
      time_zone:             None,
      time_zone_from_gps:    true,
      threshold_year:        None,
      stale_warning_limit:   constants::STALE_WARNING_LIMIT,
    }
  }
}

impl Config {
  /// Reads configuration from a JSON file at `path`.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
    let path = path.as_ref();

    let text = fs::read_to_string(path)
      .map_err(|e| format!("{}: Failed to read configuration ({e}).", path.display()))?;

    let config = serde_json::from_str::<Config>(&text)
      .map_err(|e| format!("{}: Failed to parse configuration ({e}).", path.display()))?;

    config.validate()?;
    Ok(config)
  }

  /// Checks values that can only be checked after parsing.
  pub fn validate(&self) -> Result<(), String> {
    let re = self.date_folder_regex()?;
    if re.captures_len() != 2 {
      return Err(format!(
        "Date folder pattern `{}` must have exactly one capture group.",
        self.date_folder_pattern
      ));
    }

    self.get_time_zone()?;

    if self.companion_max_seconds < 0.0 {
      return Err("Companion clip duration limit must not be negative.".to_string());
    }

    Ok(())
  }

  pub fn date_folder_regex(&self) -> Result<Regex, String> {
    Regex::new(&self.date_folder_pattern).map_err(|e| {
      format!(
        "Invalid date folder pattern `{}` ({e}).",
        self.date_folder_pattern
      )
    })
  }

  // Gets the ExtensionConfig for the given extension, if present.
  // This is case-insensitive.
  pub fn get_extension(&self, extension: &str) -> Option<&'static ExtensionConfig> {
    EXTENSIONS.get(extension.to_lowercase().as_str())
  }

  /// Working time zone for wall-clock conversions.
  pub fn get_time_zone(&self) -> Result<Tz, String> {
    match self.time_zone.as_deref() {
      Some(name) => name
        .parse::<Tz>()
        .map_err(|e| format!("Unknown time zone `{name}` ({e}).")),
      None => Ok(Tz::UTC),
    }
  }

  pub fn get_threshold_year(&self) -> i32 {
    self.threshold_year.unwrap_or_else(|| Local::now().year())
  }

  /// Whether a source subfolder should be skipped entirely.
  pub fn is_reserved(&self, folder_name: &str) -> bool {
    let folder_name = folder_name.to_lowercase();
    self
      .reserved_prefixes
      .iter()
      .any(|p| folder_name.starts_with(&p.to_lowercase()))
  }

  pub fn is_root_name(&self, name: &str) -> bool {
    self.root_names.iter().any(|r| r == name)
  }

  pub fn media_kind(&self, path: &Path) -> Option<MediaKind> {
    let extension = path.extension().and_then(|e| e.to_str())?;
    self.get_extension(extension).map(|e| {
      if e.video {
        MediaKind::Video
      } else {
        MediaKind::Image
      }
    })
  }

  pub fn path_is_sidecar(path: &Path) -> bool {
    path
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|e| e.eq_ignore_ascii_case("json"))
  }
}

fn to_strings(values: &[&str]) -> Vec<String> {
  values.iter().map(ToString::to_string).collect()
}
