// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Organizer Stage 4: Removal of duplicate content within each year bucket and
//! each album.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use super::{DedupSummary, Organizer, stage_1_collection::PROGRESS_INTERVAL};
use crate::{
  io::{self, MetadataStore},
  prim::Fingerprint,
};

/// A file kept so far, with its full fingerprint once needed.
struct Kept {
  path:        PathBuf,
  fingerprint: Option<Fingerprint>,
}

impl<S: MetadataStore> Organizer<'_, S> {
  /// Deduplicates the canonical library and the album mirror separately,
  /// logging every removal to `duplicates.log`.
  pub fn deduplicate(&self) -> Result<DedupSummary, String> {
    io::touch(&self.layout.duplicates_log)?;

    let prefix_len = self.config.dedup_prefix_bytes;
    let mut summary = DedupSummary::default();
    summary += deduplicate_tree(&self.layout.canonical, &self.layout.duplicates_log, prefix_len);
    summary += deduplicate_tree(&self.layout.albums, &self.layout.duplicates_log, prefix_len);
    Ok(summary)
  }
}

/// Removes files with duplicate content below `root`. Each immediate
/// subdirectory is its own scope, so the same photo in two albums stays.
/// Files are visited in sorted order and the first one seen is kept.
///
/// Candidates are grouped by a fingerprint over the first `prefix_len` bytes
/// and confirmed with a full fingerprint before removal.
pub fn deduplicate_tree(root: &Path, duplicates_log: &Path, prefix_len: u64) -> DedupSummary {
  log::info!("Deduplicating {}.", root.display());

  let mut summary = DedupSummary::default();

  let dirs = match io::list_dirs(root) {
    Ok(dirs) => dirs,
    Err(e) => {
      log::error!("{e}");
      summary.failures += 1;
      return summary;
    }
  };

  for dir in dirs {
    let mut kept: HashMap<Fingerprint, Vec<Kept>> = HashMap::new();

    for file in io::find_files(&dir, |_| true) {
      summary.scanned += 1;
      if summary.scanned % PROGRESS_INTERVAL == 0 {
        log::info!("Scanned {} files for duplicates.", summary.scanned);
      }

      match check_file(&file, prefix_len, &mut kept) {
        Ok(None) => {}
        Ok(Some(original)) => match remove_duplicate(&file, &original, duplicates_log) {
          Ok(()) => summary.removed += 1,
          Err(e) => {
            log::error!("{e}");
            summary.failures += 1;
          }
        },
        Err(e) => {
          log::error!("{e}");
          summary.failures += 1;
        }
      }
    }
  }

  summary
}

/// Returns the kept file `file` duplicates, or records `file` as kept.
fn check_file(
  file: &Path,
  prefix_len: u64,
  kept: &mut HashMap<Fingerprint, Vec<Kept>>,
) -> Result<Option<PathBuf>, String> {
  let key = io::fingerprint_prefix(file, prefix_len)?;
  let candidates = kept.entry(key).or_default();

  if candidates.is_empty() {
    candidates.push(Kept {
      path:        file.to_path_buf(),
      fingerprint: None,
    });
    return Ok(None);
  }

  let fingerprint = io::fingerprint(file)?;
  for candidate in candidates.iter_mut() {
    let full = match candidate.fingerprint {
      Some(full) => full,
      None => *candidate.fingerprint.insert(io::fingerprint(&candidate.path)?),
    };
    if full == fingerprint {
      return Ok(Some(candidate.path.clone()));
    }
  }

  log::debug!("{}: Prefix matches but content differs, keeping.", file.display());
  candidates.push(Kept {
    path:        file.to_path_buf(),
    fingerprint: Some(fingerprint),
  });
  Ok(None)
}

fn remove_duplicate(file: &Path, original: &Path, duplicates_log: &Path) -> Result<(), String> {
  io::remove_file(file)?;
  log::warn!(
    "{}: Duplicate of {}, removed.",
    file.display(),
    original.display()
  );
  io::append_line(duplicates_log, &format!("Duplicate: {}", file.display()))
}
