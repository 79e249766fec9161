// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Organizer Stage 1: Collection of source media into the canonical library
//! and album mirror.

use std::path::Path;

use super::{CollectionSummary, Organizer, classify, organizer::Placement};
use crate::{
  io::{self, MetadataStore},
  prim::{self, Bucket, Media, Provenance},
};

/// How often progress is logged, in files.
pub(super) const PROGRESS_INTERVAL: usize = 500;

/// Kind of source subfolder.
enum Folder {
  /// `Photos from <year>`: the bucket is fixed.
  Date(i32),
  /// Anything else: items are resolved one by one and also mirrored.
  Album(String),
}

impl<S: MetadataStore> Organizer<'_, S> {
  /// Walks every subfolder of every source root, in sorted order, copying
  /// media into the canonical library and albums into the album mirror.
  pub fn collect(&mut self) -> CollectionSummary {
    log::info!("Collecting media from {} source roots.", self.sources.len());

    let mut summary = CollectionSummary::default();
    let mut processed = 0;

    for root in self.sources.clone() {
      let dirs = match io::list_dirs(&root) {
        Ok(dirs) => dirs,
        Err(e) => {
          log::error!("{e}");
          summary.failures += 1;
          continue;
        }
      };

      for dir in dirs {
        let name = dir.file_name().unwrap_or_default().to_string_lossy().into_owned();
        if self.config.is_reserved(&name) {
          log::info!("{}: Reserved folder, skipping.", dir.display());
          continue;
        }

        let folder = self.classify_folder(&name);
        if matches!(folder, Folder::Album(_)) {
          summary.albums += 1;
        }

        let files = match io::list_files(&dir) {
          Ok(files) => files,
          Err(e) => {
            log::error!("{e}");
            summary.failures += 1;
            continue;
          }
        };

        for file in files {
          self.collect_file(&file, &folder, &mut summary);

          processed += 1;
          if processed % PROGRESS_INTERVAL == 0 {
            log::info!("Collected {processed} files.");
          }
        }
      }
    }

    summary
  }

  fn classify_folder(&self, name: &str) -> Folder {
    self
      .date_folder
      .captures(name)
      .and_then(|caps| caps.get(1)?.as_str().parse::<i32>().ok())
      .filter(|year| prim::is_valid_year(*year))
      .map_or_else(|| Folder::Album(name.to_string()), Folder::Date)
  }

  fn collect_file(&mut self, file: &Path, folder: &Folder, summary: &mut CollectionSummary) {
    let media = match Media::load(file, self.config) {
      Ok(Some(media)) => media,
      Ok(None) => {
        log::trace!("{}: Not media, skipping.", file.display());
        return;
      }
      Err(e) => {
        log::error!("{e}");
        summary.failures += 1;
        return;
      }
    };

    if !classify::should_keep(&media, self.config, self.store) {
      summary.companions_skipped += 1;
      return;
    }

    let placement = match folder {
      Folder::Date(year) => {
        *summary.provenance.entry(Provenance::FolderYear).or_default() += 1;
        self.place_in_canonical(file, Bucket::Year(*year), || {
          self.resolve(file, Some(*year))
        })
      }
      Folder::Album(_) => {
        let resolved = self.resolve(file, None);
        *summary.provenance.entry(resolved.provenance()).or_default() += 1;
        self.place_in_canonical(file, resolved.bucket(), || resolved)
      }
    };

    match placement {
      Ok(placement) => {
        match &placement {
          Placement::Copied(dst) => {
            log::debug!("{}: Copied to {}.", file.display(), dst.display());
            summary.copied += 1;
          }
          Placement::Renamed(_) => summary.renamed += 1,
          Placement::AlreadyPresent(dst) => {
            log::debug!("{}: Already present as {}.", file.display(), dst.display());
            summary.already_present += 1;
          }
        }
        self.record_origin(placement.path(), file);
      }
      Err(e) => {
        log::error!("{e}");
        summary.failures += 1;
      }
    }

    if let Folder::Album(album) = folder {
      self.mirror(file, album, summary);
    }
  }

  /// Copies `file` to `ALBUMS/<album>/`, unless that name is taken.
  fn mirror(&mut self, file: &Path, album: &str, summary: &mut CollectionSummary) {
    let Some(name) = file.file_name() else {
      return;
    };
    let dst = self.layout.albums.join(album).join(name);

    if dst.exists() {
      log::debug!("{}: Already in album {album}.", file.display());
      return;
    }

    match io::copy_file(file, &dst) {
      Ok(()) => {
        summary.album_copies += 1;
        self.record_origin(&dst, file);
      }
      Err(e) => {
        log::error!("{e}");
        summary.failures += 1;
      }
    }
  }
}
