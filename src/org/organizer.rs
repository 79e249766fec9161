// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Core migration type, and the placement and lookup helpers shared by the
//! stages.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use chrono::Datelike;
use regex::Regex;
use walkdir::WalkDir;

use super::{RunReport, locate::SidecarIndex, resolve::Resolver};
use crate::{
  config::{Config, constants},
  io::{self, MetadataStore},
  prim::{Bucket, Fingerprint, ResolvedTimestamp, Sidecar},
};

/// How deep below each input path source roots are searched for.
const SOURCE_ROOT_MAX_DEPTH: usize = 4;

/// Where each part of the output lives.
#[derive(Debug, Clone)]
pub struct Layout {
  pub root:           PathBuf,
  pub canonical:      PathBuf,
  pub albums:         PathBuf,
  pub report:         PathBuf,
  pub duplicates_log: PathBuf,
}

impl Layout {
  pub fn new(root: impl AsRef<Path>) -> Self {
    let root = root.as_ref();
    Self {
      root:           root.to_path_buf(),
      canonical:      root.join(constants::CANONICAL_DIR),
      albums:         root.join(constants::ALBUM_DIR),
      report:         root.join(constants::REPORT_FILE),
      duplicates_log: root.join(constants::DUPLICATES_LOG),
    }
  }
}

/// Result of placing a file into the canonical library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
  Copied(PathBuf),
  /// Copied under a disambiguated name, as different content held the name.
  Renamed(PathBuf),
  /// Identical content already sits at this path.
  AlreadyPresent(PathBuf),
}

impl Placement {
  pub fn path(&self) -> &Path {
    match self {
      Placement::Copied(path) | Placement::Renamed(path) | Placement::AlreadyPresent(path) => path,
    }
  }
}

/// Migrates Google Photos export trees into a canonical by-year library plus
/// album mirror.
///
/// Stages run in order: `collect`, `write_metadata`, `validate`,
/// `deduplicate`. Each returns its own summary. `run` does all of them.
pub struct Organizer<'a, S: MetadataStore> {
  pub(super) config:      &'a Config,
  pub(super) store:       &'a S,
  pub(super) layout:      Layout,
  pub(super) sources:     Vec<PathBuf>,
  pub(super) sidecars:    SidecarIndex,
  pub(super) resolver:    Resolver,
  pub(super) date_folder: Regex,
  /// Source file of each output file copied during this run.
  pub(super) origins:     HashMap<PathBuf, PathBuf>,
}

impl<'a, S: MetadataStore> Organizer<'a, S> {
  /// Prepares a migration of `sources` into `output`, creating the output
  /// structure.
  pub fn new(
    config: &'a Config,
    store: &'a S,
    sources: Vec<PathBuf>,
    output: impl AsRef<Path>,
  ) -> Result<Self, String> {
    let layout = Layout::new(output);
    io::create_dir(&layout.canonical)?;
    io::create_dir(&layout.albums)?;

    let sidecars = SidecarIndex::build(&sources, config);

    Ok(Self {
      config,
      store,
      layout,
      sources,
      sidecars,
      resolver: Resolver::new(config)?,
      date_folder: config.date_folder_regex()?,
      origins: HashMap::new(),
    })
  }

  /// Runs every stage, then writes the migration report.
  pub fn run(&mut self) -> Result<RunReport, String> {
    let collection = self.collect();
    log::info!("{collection}");

    let metadata = self.write_metadata();
    log::info!("{metadata}");

    let validation = self.validate();
    log::info!("{validation}");

    let dedup = self.deduplicate()?;
    log::info!("{dedup}");

    let report = RunReport {
      sources: self.sources.clone(),
      output: self.layout.root.clone(),
      threshold_year: self.config.get_threshold_year(),
      collection,
      metadata,
      validation,
      dedup,
      stale: self.count_stale(),
    };
    if report.exceeds_stale_limit(self.config.stale_warning_limit) {
      log::warn!(
        "{} files still have a {} modification time. Their capture time was likely lost.",
        report.stale,
        report.threshold_year
      );
    }

    report.write(&self.layout.report)?;
    log::info!("Report written to {}.", self.layout.report.display());

    Ok(report)
  }

  /// Copies `src` into `bucket` of the canonical library. A different file
  /// already holding the name leads to `<stem>_<epoch>.<ext>`, then
  /// `<stem>_<epoch>_<n>.<ext>`, where `epoch` comes from `resolved` or the
  /// source's modification time.
  pub(super) fn place_in_canonical(
    &self,
    src: &Path,
    bucket: Bucket,
    resolved: impl FnOnce() -> ResolvedTimestamp,
  ) -> Result<Placement, String> {
    let dir = self.layout.canonical.join(bucket.to_string());
    let name = src
      .file_name()
      .ok_or(format!("{}: Not a file.", src.display()))?;

    let dst = dir.join(name);
    if !dst.exists() {
      io::copy_file(src, &dst)?;
      return Ok(Placement::Copied(dst));
    }

    let fingerprint = io::fingerprint(src)?;
    if same_content(&dst, fingerprint)? {
      return Ok(Placement::AlreadyPresent(dst));
    }

    let epoch = match resolved().date_time() {
      Some(date_time) => date_time.timestamp(),
      None => io::get_modify_time(src)?.timestamp(),
    };
    let stem = src.file_stem().unwrap_or_default().to_string_lossy();
    let extension = src
      .extension()
      .map(|e| format!(".{}", e.to_string_lossy()))
      .unwrap_or_default();

    let mut n = 0;
    loop {
      let name = if n == 0 {
        format!("{stem}_{epoch}{extension}")
      } else {
        format!("{stem}_{epoch}_{n}{extension}")
      };
      let dst = dir.join(name);

      if !dst.exists() {
        io::copy_file(src, &dst)?;
        log::debug!("{}: Renamed to {} on collision.", src.display(), dst.display());
        return Ok(Placement::Renamed(dst));
      }
      if same_content(&dst, fingerprint)? {
        return Ok(Placement::AlreadyPresent(dst));
      }
      n += 1;
    }
  }

  /// Finds and loads the sidecar for `media`, looking it up by the name of the
  /// source it was copied from.
  pub(super) fn find_sidecar(&self, media: &Path) -> Option<Sidecar> {
    let origin = self.origins.get(media).map_or(media, PathBuf::as_path);
    let name = origin.file_name()?.to_string_lossy();

    let path = self.sidecars.locate(&name, origin.parent())?;
    Sidecar::load(path)
      .map_err(|e| log::warn!("{e}"))
      .ok()
  }

  /// Resolves the capture time of `media`.
  pub(super) fn resolve(&self, media: &Path, folder_year: Option<i32>) -> ResolvedTimestamp {
    let sidecar = self.find_sidecar(media);
    self
      .resolver
      .resolve(self.store, media, sidecar.as_ref(), folder_year)
  }

  /// Records `src` as the origin of `dst`, keeping the first one seen.
  pub(super) fn record_origin(&mut self, dst: &Path, src: &Path) {
    let src = self
      .origins
      .get(src)
      .cloned()
      .unwrap_or_else(|| src.to_path_buf());
    self.origins.entry(dst.to_path_buf()).or_insert(src);
  }

  /// Counts output files whose modification time falls in the threshold
  /// year.
  pub fn count_stale(&self) -> usize {
    let threshold_year = self.config.get_threshold_year();
    let time_zone = self.resolver.time_zone();

    [&self.layout.canonical, &self.layout.albums]
      .into_iter()
      .flat_map(|root| io::find_files(root, |_| true))
      .filter(|path| {
        io::get_modify_time(path)
          .map_err(|e| log::warn!("{e}"))
          .is_ok_and(|mtime| mtime.with_timezone(&time_zone).year() == threshold_year)
      })
      .count()
  }
}

/// Lists every file below the subdirectories of `root`, along with the bucket
/// named by its subdirectory if `buckets` is set.
pub(super) fn list_structure(root: &Path, buckets: bool) -> Vec<(Option<Bucket>, PathBuf)> {
  let dirs = io::list_dirs(root).unwrap_or_else(|e| {
    log::error!("{e}");
    Vec::new()
  });

  dirs
    .into_iter()
    .flat_map(|dir| {
      let bucket = buckets
        .then(|| Bucket::from_dir_name(&dir.file_name().unwrap_or_default().to_string_lossy()))
        .flatten();
      io::find_files(&dir, |_| true)
        .into_iter()
        .map(move |file| (bucket, file))
    })
    .collect()
}

fn same_content(path: &Path, fingerprint: Fingerprint) -> Result<bool, String> {
  Ok(io::fingerprint(path)? == fingerprint)
}

/// Finds every source root (e.g. `Google Photos`) at or below `inputs`,
/// sorted and without repeats.
pub fn find_source_roots(inputs: &[PathBuf], config: &Config) -> Vec<PathBuf> {
  let mut roots = Vec::new();

  for input in inputs {
    let mut entries = WalkDir::new(input)
      .max_depth(SOURCE_ROOT_MAX_DEPTH)
      .sort_by_file_name()
      .into_iter();

    while let Some(entry) = entries.next() {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          log::warn!("{e}");
          continue;
        }
      };

      if entry.file_type().is_dir()
        && config.is_root_name(&entry.file_name().to_string_lossy())
      {
        log::debug!("Found source root {}.", entry.path().display());
        roots.push(entry.into_path());
        entries.skip_current_dir();
      }
    }
  }

  roots.sort();
  roots.dedup();
  roots
}
