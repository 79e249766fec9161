// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Organizer Stage 3: Integrity validation. Every album file must have a
//! byte-identical copy in the canonical library.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use super::{Organizer, ValidationSummary, organizer, organizer::Placement};
use crate::{
  io::{self, MetadataStore},
  prim::Fingerprint,
};

impl<S: MetadataStore> Organizer<'_, S> {
  /// Checks every album file against the canonical library, copying in any
  /// that are missing.
  pub fn validate(&mut self) -> ValidationSummary {
    log::info!("Validating album files against {}.", self.layout.canonical.display());

    let mut summary = ValidationSummary::default();
    let mut index = self.index_canonical(&mut summary);

    for (_, file) in organizer::list_structure(&self.layout.albums, false) {
      if self.config.media_kind(&file).is_none() {
        continue;
      }

      let fingerprint = match io::fingerprint(&file) {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
          log::error!("{e}");
          summary.failures += 1;
          continue;
        }
      };

      if index.contains_key(&fingerprint) {
        summary.validated += 1;
        continue;
      }

      match self.backfill(&file) {
        Ok(dst) => {
          index.insert(fingerprint, dst);
          summary.backfilled += 1;
        }
        Err(e) => {
          log::error!("{e}");
          summary.failures += 1;
        }
      }
    }

    summary
  }

  fn index_canonical(&self, summary: &mut ValidationSummary) -> HashMap<Fingerprint, PathBuf> {
    let mut index = HashMap::new();

    for file in io::find_files(&self.layout.canonical, |_| true) {
      match io::fingerprint(&file) {
        Ok(fingerprint) => {
          index.entry(fingerprint).or_insert(file);
        }
        Err(e) => {
          log::error!("{e}");
          summary.failures += 1;
        }
      }
    }

    log::debug!("Indexed {} canonical files.", index.len());
    index
  }

  /// Copies the album file `file` into the canonical library, bucketed by its
  /// own capture time.
  fn backfill(&mut self, file: &Path) -> Result<PathBuf, String> {
    let resolved = self.resolve(file, None);
    let placement = self.place_in_canonical(file, resolved.bucket(), || resolved)?;

    if let Placement::Copied(dst) | Placement::Renamed(dst) = &placement
      && let Some(date_time) = resolved.date_time()
    {
      io::set_modify_time(dst, date_time)?;
    }

    log::warn!(
      "{}: Missing from canonical library, backfilled to {}.",
      file.display(),
      placement.path().display()
    );
    self.record_origin(placement.path(), file);
    Ok(placement.path().to_path_buf())
  }
}
