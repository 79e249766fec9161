// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Functions for manipulating files, and the `ExifTool` wrapper used to read
//! and write embedded metadata.

use std::{
  ffi::{OsStr, OsString},
  fs::{self, File, OpenOptions},
  io::{self, Read, Write},
  path::{Path, PathBuf},
  process::Command,
};

use chrono::{DateTime, FixedOffset, Utc};
use filetime::FileTime;
use walkdir::WalkDir;

use crate::{
  config::Config,
  prim::{self, Fingerprint, Metadata},
};

/// All `ExifTool` operations will use this format when extracting date & time.
/// Follows RFC 3339 format for easy parsing with `chrono`.
pub const DATETIME_READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%f%:z";

/// When using `ExifTool` to read metadata, this converts dates to RFC 3339
/// format, and puts the output into JSON for easy parsing with `serde_json`.
const READ_ARGS: [&str; 3] = ["-d", DATETIME_READ_FORMAT, "-json"];

/// Tags read from media files. Reading everything is much slower on videos.
/// `Duration#` reports duration as plain seconds.
const READ_TAGS: [&str; 10] = [
  "-FileType",
  "-FileModifyDate",
  "-ModifyDate",
  "-SubSecModifyDate",
  "-CreateDate",
  "-SubSecCreateDate",
  "-MediaCreateDate",
  "-DateTimeOriginal",
  "-SubSecDateTimeOriginal",
  "-Duration#",
];

/// Arguments applied to every write: no backup copies, quiet, and minor
/// errors (e.g. unknown maker notes) don't fail the write.
const WRITE_ARGS: [&str; 3] = ["-overwrite_original", "-q", "-m"];

/// Minimum supported (tested) version of `ExifTool`.
const EXIFTOOL_MIN_VERSION: (u32, u32) = (12, 0);

/// A single tag assignment for `MetadataStore::write`.
#[derive(Debug, Clone, PartialEq)]
pub struct TagUpdate {
  /// Tag name, optionally with group (e.g. `QuickTime:CreateDate`).
  pub tag:   &'static str,
  pub value: TagValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
  /// Written as wall-clock time in its own offset.
  DateTime(DateTime<FixedOffset>),
  Number(f64),
  Text(String),
}

impl TagUpdate {
  pub fn new(tag: &'static str, value: TagValue) -> Self {
    Self { tag, value }
  }

  /// Formats as an `ExifTool` assignment argument, e.g. `-Tag=Value`.
  fn to_arg(&self) -> OsString {
    let value = match &self.value {
      TagValue::DateTime(date_time) => date_time.format(prim::EXIF_WRITE_FORMAT).to_string(),
      TagValue::Number(number) => format!("{number:.7}"),
      TagValue::Text(text) => text.clone(),
    };
    OsString::from(format!("-{}={value}", self.tag))
  }
}

/// Narrow interface over whatever reads and writes embedded metadata.
pub trait MetadataStore {
  /// Reads the date & time and duration tags of `file`.
  fn read(&self, file: &Path) -> Result<Metadata, String>;

  /// Writes `updates` into `file` in place, without re-encoding it.
  fn write(&self, file: &Path, updates: &[TagUpdate]) -> Result<(), String>;

  /// Measures video duration with a tool other than the store itself, if one
  /// is available.
  fn probe_duration(&self, _file: &Path) -> Option<f64> {
    None
  }
}

/// `MetadataStore` backed by the `ExifTool` executable, with `ffprobe` as an
/// optional duration fallback.
pub struct ExifTool {
  program: PathBuf,
  ffprobe: Option<PathBuf>,
}

impl ExifTool {
  /// Checks that `ExifTool` is present and new enough.
  pub fn new(config: &Config) -> Result<Self, String> {
    let exiftool = Self {
      program: config.exiftool.clone(),
      ffprobe: config.ffprobe.clone(),
    };
    version_check(exiftool.run(["-ver"])?, EXIFTOOL_MIN_VERSION)?;
    Ok(exiftool)
  }

  /// Runs `ExifTool` with `args`.
  fn run<I: IntoIterator<Item = S>, S: AsRef<OsStr>>(&self, args: I) -> Result<Vec<u8>, String> {
    run_command(&self.program, args)
  }
}

impl MetadataStore for ExifTool {
  fn read(&self, file: &Path) -> Result<Metadata, String> {
    let mut args = Vec::from(READ_ARGS.map(OsStr::new));
    args.extend(READ_TAGS.map(OsStr::new));
    args.push(file.as_os_str());

    let mut metadata = parse_vec(self.run(args)?)?;
    if metadata.is_empty() {
      return Err(format!("{}: ExifTool returned no metadata.", file.display()));
    }
    Ok(metadata.remove(0))
  }

  fn write(&self, file: &Path, updates: &[TagUpdate]) -> Result<(), String> {
    if updates.is_empty() {
      return Ok(());
    }

    let mut args = WRITE_ARGS.map(OsString::from).to_vec();
    args.extend(updates.iter().map(TagUpdate::to_arg));
    args.push(file.as_os_str().to_os_string());

    log::trace!("{}: ExifTool args {args:?}", file.display());
    self.run(args).map(|_| ())
  }

  fn probe_duration(&self, file: &Path) -> Option<f64> {
    let ffprobe = self.ffprobe.as_ref()?;
    let args = [
      OsStr::new("-v"),
      OsStr::new("error"),
      OsStr::new("-show_entries"),
      OsStr::new("format=duration"),
      OsStr::new("-of"),
      OsStr::new("default=noprint_wrappers=1:nokey=1"),
      file.as_os_str(),
    ];

    let stdout = run_command(ffprobe, args)
      .map_err(|e| log::debug!("{}: {e}", file.display()))
      .ok()?;
    String::from_utf8_lossy(&stdout).trim().parse::<f64>().ok()
  }
}

/// Copies `src` to `dst`, creating parent directories. Never overwrites.
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<(), String> {
  let (src, dst) = (src.as_ref(), dst.as_ref());

  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent)
      .map_err(|e| format!("{}: Failed to create directory ({e}).", parent.display()))?;
  }

  let copy = || -> io::Result<()> {
    let mut reader = File::open(src)?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(dst)?;
    io::copy(&mut reader, &mut writer)?;
    writer.flush()
  };

  copy().map_err(|e| {
    // Don't leave a partial copy behind to be mistaken for a real file.
    if e.kind() != io::ErrorKind::AlreadyExists {
      let _ = fs::remove_file(dst);
    }
    format!(
      "{}: Failed to copy to {} ({e}).",
      src.display(),
      dst.display()
    )
  })
}

/// Creates `dir` and its parents if needed.
pub fn create_dir(dir: impl AsRef<Path>) -> Result<(), String> {
  let dir = dir.as_ref();
  fs::create_dir_all(dir)
    .map_err(|e| format!("{}: Failed to create directory ({e}).", dir.display()))
}

/// Fingerprint over the full contents of `file`.
pub fn fingerprint(file: impl AsRef<Path>) -> Result<Fingerprint, String> {
  fingerprint_prefix(file, u64::MAX)
}

/// Fingerprint over at most the first `prefix_len` bytes of `file`, combined
/// with its total size.
pub fn fingerprint_prefix(file: impl AsRef<Path>, prefix_len: u64) -> Result<Fingerprint, String> {
  let file = file.as_ref();
  let error = |e: io::Error| format!("{}: Failed to fingerprint ({e}).", file.display());

  let reader = File::open(file).map_err(error)?;
  let size = reader.metadata().map_err(error)?.len();

  let mut hasher = blake3::Hasher::new();
  io::copy(&mut reader.take(prefix_len), &mut hasher).map_err(error)?;

  Ok(Fingerprint::new(hasher.finalize(), size))
}

/// Gets the filesystem modification time of `file`.
pub fn get_modify_time(file: impl AsRef<Path>) -> Result<DateTime<Utc>, String> {
  let file = file.as_ref();
  let metadata = fs::metadata(file)
    .map_err(|e| format!("{}: Failed to read file times ({e}).", file.display()))?;
  let mtime = FileTime::from_last_modification_time(&metadata);

  DateTime::<Utc>::from_timestamp(mtime.unix_seconds(), mtime.nanoseconds()).ok_or(format!(
    "{}: Modification time out of range.",
    file.display()
  ))
}

/// Sets the filesystem modification time of `file` to `date_time`.
pub fn set_modify_time(
  file: impl AsRef<Path>,
  date_time: DateTime<FixedOffset>,
) -> Result<(), String> {
  let file = file.as_ref();
  let mtime = FileTime::from_unix_time(date_time.timestamp(), date_time.timestamp_subsec_nanos());

  filetime::set_file_mtime(file, mtime)
    .map_err(|e| format!("{}: Failed to set modification time ({e}).", file.display()))
}

/// Lists subdirectories of `dir`, sorted by name.
pub fn list_dirs(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, String> {
  list(dir, |t| t.is_dir())
}

/// Lists regular files directly in `dir`, sorted by name.
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, String> {
  list(dir, |t| t.is_file())
}

fn list(dir: impl AsRef<Path>, keep: fn(&fs::FileType) -> bool) -> Result<Vec<PathBuf>, String> {
  let dir = dir.as_ref();

  WalkDir::new(dir)
    .min_depth(1)
    .max_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter(|e| e.as_ref().map_or(true, |e| keep(&e.file_type())))
    .map(|e| {
      e.map(walkdir::DirEntry::into_path)
        .map_err(|e| format!("{}: Failed to list directory ({e}).", dir.display()))
    })
    .collect()
}

/// Recursively finds files below `dir` matching `keep`, sorted by path.
/// Unreadable entries are logged and skipped.
pub fn find_files(dir: impl AsRef<Path>, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
  WalkDir::new(dir)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.map_err(|e| log::warn!("{e}")).ok())
    .filter(|e| e.file_type().is_file() && keep(e.path()))
    .map(walkdir::DirEntry::into_path)
    .collect()
}

/// Appends `line` to the text file at `path`, creating it if needed.
pub fn append_line(path: impl AsRef<Path>, line: &str) -> Result<(), String> {
  let path = path.as_ref();

  OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .and_then(|mut f| writeln!(f, "{line}"))
    .map_err(|e| format!("{}: Failed to append ({e}).", path.display()))
}

/// Creates an empty file at `path` unless one exists.
pub fn touch(path: impl AsRef<Path>) -> Result<(), String> {
  let path = path.as_ref();

  OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .map(|_| ())
    .map_err(|e| format!("{}: Failed to create ({e}).", path.display()))
}

/// Deletes a file from the output.
pub fn remove_file(file: impl AsRef<Path>) -> Result<(), String> {
  let file = file.as_ref();
  fs::remove_file(file).map_err(|e| format!("{}: Failed to remove ({e}).", file.display()))
}

/// Runs `program` with `args`, returning stdout.
fn run_command<I: IntoIterator<Item = S>, S: AsRef<OsStr>>(
  program: &Path,
  args: I,
) -> Result<Vec<u8>, String> {
  let mut cmd = Command::new(program);
  cmd.args(args);

  let output = cmd.output().map_err(|e| {
    format!(
      "{} failed to run.\nArgs:\n{}\nError:\n{e}",
      program.display(),
      cmd
        .get_args()
        .collect::<Vec<_>>()
        .join(OsStr::new(" "))
        .display(),
    )
  })?;

  if !output.status.success() {
    return Err(format!(
      "{} did not run successfully.\nArgs:\n{}\nstderr:\n{}",
      program.display(),
      cmd
        .get_args()
        .collect::<Vec<_>>()
        .join(OsStr::new(" "))
        .display(),
      String::from_utf8_lossy(&output.stderr)
    ));
  }

  Ok(output.stdout)
}

/// Parses `ExifTool`'s JSON-formatted output `metadata` into Rust types.
fn parse_vec(metadata: impl AsRef<[u8]>) -> Result<Vec<Metadata>, String> {
  // `serde_json` doesn't handle the empty case.
  if metadata.as_ref().is_empty() {
    return Ok(Vec::new());
  }

  serde_json::from_slice(metadata.as_ref()).map_err(|e| {
    format!(
      "Failed to parsed ExifTool output as metadata ({e}).\nstdout:\n{}",
      String::from_utf8_lossy(metadata.as_ref())
    )
  })
}

/// Returns whether `version` is as new or newer than `version_required_min`,
/// where `version` is from `ExifTool`'s stdout.
fn version_check(version: Vec<u8>, version_required_min: (u32, u32)) -> Result<(), String> {
  let version = String::from_utf8_lossy(&version);
  let Some((major, minor)) = version.trim().split_once('.') else {
    return Err(format!("Unexpected ExifTool version string: \"{version}\""));
  };

  let major = major.parse::<u32>();
  let minor = minor.parse::<u32>();
  let (Ok(major), Ok(minor)) = (major, minor) else {
    return Err(format!("Unexpected ExifTool version: {version}"));
  };

  if major > version_required_min.0
    || (major == version_required_min.0 && minor >= version_required_min.1)
  {
    Ok(())
  } else {
    Err(format!(
      "ExifTool version {major}.{minor} is too old (needs {}.{} or newer).",
      version_required_min.0, version_required_min.1
    ))
  }
}

#[cfg(test)]
mod test_copy_file {
  use super::*;
  use crate::testing::*;

  #[test]
  fn creates_parent_directories() {
    let d = test_dir!(
      "src/photo.jpg": { "Content": "bytes" },
    );

    copy_file(d.get_path("src/photo.jpg"), d.get_path("out/2015/photo.jpg")).unwrap();

    assert_dir!(d, ["src/photo.jpg", "out/2015/photo.jpg"]);
    assert_eq!(fs::read(d.get_path("out/2015/photo.jpg")).unwrap(), b"bytes");
  }

  #[test]
  fn errors_if_destination_exists() {
    let d = test_dir!(
      "src/photo.jpg": { "Content": "new" },
      "out/photo.jpg": { "Content": "old" },
    );

    assert_err!(
      copy_file(d.get_path("src/photo.jpg"), d.get_path("out/photo.jpg")),
      "Failed to copy"
    );
    assert_eq!(fs::read(d.get_path("out/photo.jpg")).unwrap(), b"old");
  }
}





#[cfg(test)]
mod test_tag_update {
  use super::*;
  use crate::testing::*;

  #[test]
  fn formats_date_time_as_exif() {
    let update = TagUpdate::new(
      "DateTimeOriginal",
      TagValue::DateTime(make_date(2015, 1, 1, 9, 30, 0, 0, -8)),
    );

    assert_eq!(update.to_arg(), "-DateTimeOriginal=2015:01:01 09:30:00");
  }

  #[test]
  fn formats_number() {
    let update = TagUpdate::new("GPSLatitude", TagValue::Number(47.6061));

    assert_eq!(update.to_arg(), "-GPSLatitude=47.6061000");
  }
}
