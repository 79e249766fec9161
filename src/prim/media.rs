// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Media file handling.

use core::fmt;
use std::{
  ffi::OsStr,
  fmt::{Display, Formatter},
  fs,
  path::{Path, PathBuf},
};

use crate::config::Config;

/// Whether a media file is a still image or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
  Image,
  Video,
}

impl Display for MediaKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      MediaKind::Image => write!(f, "image"),
      MediaKind::Video => write!(f, "video"),
    }
  }
}

/// A single media file on disk, identified by path. Content identity is
/// established separately through `Fingerprint`.
#[derive(Debug, Clone)]
pub struct Media {
  path: PathBuf,
  kind: MediaKind,
  size: u64,
}

impl Media {
  /// Loads size and kind for `path`. Returns `Ok(None)` for files that are not
  /// media.
  pub fn load(path: impl AsRef<Path>, config: &Config) -> Result<Option<Self>, String> {
    let path = path.as_ref();

    let Some(kind) = config.media_kind(path) else {
      return Ok(None);
    };

    let size = fs::metadata(path)
      .map_err(|e| format!("{}: Failed to read file size ({e}).", path.display()))?
      .len();

    Ok(Some(Self {
      path: path.to_path_buf(),
      kind,
      size,
    }))
  }

  /// Lowercase extension, without the dot.
  pub fn extension(&self) -> String {
    self
      .path
      .extension()
      .map(|e| e.to_string_lossy().to_lowercase())
      .unwrap_or_default()
  }

  pub fn kind(&self) -> MediaKind {
    self.kind
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn size(&self) -> u64 {
    self.size
  }

  pub fn stem(&self) -> &OsStr {
    self.path.file_stem().unwrap_or_default()
  }

  /// Finds a still image next to this file sharing its stem, e.g.
  /// `IMG_01.HEIC` for `IMG_01.MOV`.
  pub fn find_sibling_image(&self, config: &Config) -> Option<PathBuf> {
    let dir = self.path.parent()?;
    let mut siblings = fs::read_dir(dir)
      .map_err(|e| log::debug!("{}: Failed to list directory ({e}).", dir.display()))
      .ok()?
      .filter_map(Result::ok)
      .map(|e| e.path())
      .filter(|p| {
        p.file_stem() == Some(self.stem())
          && p.is_file()
          && config.media_kind(p) == Some(MediaKind::Image)
      })
      .collect::<Vec<_>>();
    siblings.sort();
    siblings.into_iter().next()
  }
}

impl AsRef<Path> for Media {
  fn as_ref(&self) -> &Path {
    &self.path
  }
}

impl Display for Media {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}", self.path.display())
  }
}

#[cfg(test)]
mod test_load {
  use super::*;
  use crate::testing::*;

  #[test]
  fn loads_kind_and_size() {
    let d = test_dir!(
      "IMG_01.MOV": { "Content": "0123456789" },
    );

    let media = Media::load(d.get_path("IMG_01.MOV"), &Config::default())
      .unwrap()
      .unwrap();

    assert_eq!(media.kind(), MediaKind::Video);
    assert_eq!(media.size(), 10);
    assert_eq!(media.extension(), "mov");
    assert_eq!(media.stem(), "IMG_01");
  }

  #[test]
  fn skips_non_media() {
    let d = test_dir!(
      "IMG_01.jpg.json": {},
    );

    assert!(
      Media::load(d.get_path("IMG_01.jpg.json"), &Config::default())
        .unwrap()
        .is_none()
    );
  }
}
