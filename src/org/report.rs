// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Per-stage summaries and the migration report assembled from them.

use core::fmt;
use std::{
  collections::BTreeMap,
  fmt::{Display, Formatter},
  fs,
  ops::AddAssign,
  path::{Path, PathBuf},
};

use crate::prim::Provenance;

/// Outcome of collecting source files into the output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
  pub copied:             usize,
  pub already_present:    usize,
  pub renamed:            usize,
  pub companions_skipped: usize,
  pub failures:           usize,
  pub albums:             usize,
  pub album_copies:       usize,
  /// Which tier decided the bucket of each canonical file.
  pub provenance:         BTreeMap<Provenance, usize>,
}

/// Outcome of writing resolved times into files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetadataSummary {
  pub fixed:         usize,
  pub not_fixed:     usize,
  pub failed_writes: usize,
  pub mtime_synced:  usize,
  pub forced:        usize,
  /// Files still carrying a modification time in the threshold year.
  pub stale:         usize,
}

/// Outcome of checking every album file against the canonical library.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
  pub validated:  usize,
  pub backfilled: usize,
  pub failures:   usize,
}

/// Outcome of removing duplicate content.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DedupSummary {
  pub scanned:  usize,
  pub removed:  usize,
  pub failures: usize,
}

impl AddAssign for DedupSummary {
  fn add_assign(&mut self, rhs: Self) {
    self.scanned += rhs.scanned;
    self.removed += rhs.removed;
    self.failures += rhs.failures;
  }
}

/// Everything a full migration did, rendered into `MIGRATION_REPORT.txt`.
#[derive(Debug, Clone)]
pub struct RunReport {
  pub sources:        Vec<PathBuf>,
  pub output:         PathBuf,
  pub threshold_year: i32,
  pub collection:     CollectionSummary,
  pub metadata:       MetadataSummary,
  pub validation:     ValidationSummary,
  pub dedup:          DedupSummary,
  /// Threshold-year files left after every stage.
  pub stale:          usize,
}

impl RunReport {
  /// Whether more than `limit` files were left with a threshold-year
  /// modification time.
  pub fn exceeds_stale_limit(&self, limit: usize) -> bool {
    self.stale > limit
  }

  pub fn write(&self, path: impl AsRef<Path>) -> Result<(), String> {
    let path = path.as_ref();
    fs::write(path, self.to_string())
      .map_err(|e| format!("{}: Failed to write report ({e}).", path.display()))
  }
}

impl Display for CollectionSummary {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    writeln!(f, "Collection")?;
    writeln!(f, "  Copied:                  {}", self.copied)?;
    writeln!(f, "  Already present:         {}", self.already_present)?;
    writeln!(f, "  Renamed on collision:    {}", self.renamed)?;
    writeln!(f, "  Companion clips skipped: {}", self.companions_skipped)?;
    writeln!(f, "  Copy failures:           {}", self.failures)?;
    writeln!(f, "  Albums:                  {}", self.albums)?;
    writeln!(f, "  Album copies:            {}", self.album_copies)?;
    for (provenance, count) in &self.provenance {
      writeln!(f, "  Year from {provenance}: {count}")?;
    }
    Ok(())
  }
}

impl Display for MetadataSummary {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    writeln!(f, "Metadata")?;
    writeln!(f, "  Fixed:                   {}", self.fixed)?;
    writeln!(f, "  Not fixed (no time):     {}", self.not_fixed)?;
    writeln!(f, "  Failed writes:           {}", self.failed_writes)?;
    writeln!(f, "  Modify time synced:      {}", self.mtime_synced)?;
    writeln!(f, "  Forced to mid-year:      {}", self.forced)?;
    writeln!(f, "  Threshold-year files:    {}", self.stale)
  }
}

impl Display for ValidationSummary {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    writeln!(f, "Validation")?;
    writeln!(f, "  Album files validated:   {}", self.validated)?;
    writeln!(f, "  Backfilled:              {}", self.backfilled)?;
    writeln!(f, "  Failures:                {}", self.failures)
  }
}

impl Display for DedupSummary {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    writeln!(f, "Deduplication")?;
    writeln!(f, "  Files scanned:           {}", self.scanned)?;
    writeln!(f, "  Duplicates removed:      {}", self.removed)?;
    writeln!(f, "  Failures:                {}", self.failures)
  }
}

impl Display for RunReport {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    writeln!(f, "Migration report for {}", self.output.display())?;
    writeln!(f)?;
    writeln!(f, "Sources")?;
    for source in &self.sources {
      writeln!(f, "  {}", source.display())?;
    }
    writeln!(f)?;
    writeln!(f, "{}", self.collection)?;
    writeln!(f, "{}", self.metadata)?;
    writeln!(f, "{}", self.validation)?;
    writeln!(f, "{}", self.dedup)?;
    write!(
      f,
      "Files with a {} modification time: {}",
      self.threshold_year, self.stale
    )?;
    writeln!(f)
  }
}
