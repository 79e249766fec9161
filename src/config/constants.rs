// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Constants for media extensions, Google Photos export conventions and output
//! layout.

// Extension, is video?
pub const EXTENSIONS: [(&str, bool); 26] = [
  ("3gp", true),
  ("arw", false),
  ("avi", true),
  ("bmp", false),
  ("cr2", false),
  ("cr3", false),
  ("dng", false),
  ("gif", false),
  ("heic", false),
  ("heif", false),
  ("jpeg", false),
  ("jpg", false),
  ("m4v", true),
  ("mkv", true),
  ("mov", true),
  ("mp4", true),
  ("mpg", true),
  ("mts", true),
  ("nef", false),
  ("png", false),
  ("raw", false),
  ("tif", false),
  ("tiff", false),
  ("webm", true),
  ("webp", false),
  ("wmv", true),
];

/// Containers that can hold the video half of an Apple motion photo. Any other
/// video container is always kept.
pub const COMPANION_CONTAINERS: [&str; 1] = ["mov"];

/// Names of export roots, one per language Google has been seen to use.
pub const ROOT_NAMES: [&str; 4] = ["Google Photos", "Google Fotos", "Google Foto", "Google Photos Backup"];

/// Date folders are named e.g. `Photos from 2015`. The single capture group is
/// the year.
pub const DATE_FOLDER_PATTERN: &str = r"^Photos from ([0-9]{4})$";

/// Subfolders starting with these (case-insensitive) are leftovers from failed
/// or incomplete exports.
pub const RESERVED_PREFIXES: [&str; 3] = [".", "failed", "incomplete"];

/// Suffixes Google appends to the stem of edited copies, which share the
/// original's sidecar.
pub const EDITED_SUFFIXES: [&str; 5] = ["-edited", "-bearbeitet", "-modifié", "-editado", "-modificato"];

/// Google truncates sidecar names so that `<name>.json` fits in 51 characters.
pub const SIDECAR_TRUNCATE_LEN: usize = 46;

pub const COMPANION_MAX_BYTES: u64 = 5_000_000;
pub const COMPANION_MAX_SECONDS: f64 = 3.0;

pub const DEDUP_PREFIX_BYTES: u64 = 1024 * 1024;

/// More than this many files still carrying a threshold-year modification
/// time at the end of a run is reported as a likely matching failure.
pub const STALE_WARNING_LIMIT: usize = 50;

// Output layout.
pub const CANONICAL_DIR: &str = "ALL_PHOTOS";
pub const ALBUM_DIR: &str = "ALBUMS";
pub const REPORT_FILE: &str = "MIGRATION_REPORT.txt";
pub const DUPLICATES_LOG: &str = "duplicates.log";
pub const UNKNOWN_BUCKET: &str = "Unknown";
