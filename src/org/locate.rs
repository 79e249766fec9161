// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Sidecar lookup for media files.
//!
//! Google names sidecars inconsistently: `IMG.jpg.json`, `IMG.json`,
//! `IMG.jpg.supplemental-metadata.json`, `IMG.jpg(1).json` for `IMG(1).jpg`,
//! and names cut to fit a length limit. Lookup tries each convention in turn
//! and the first one with a hit wins.

use std::{
  cmp::Reverse,
  collections::BTreeMap,
  ops::Bound,
  path::{Path, PathBuf},
  sync::LazyLock,
};

use regex::Regex;

use crate::{
  config::{Config, constants::SIDECAR_TRUNCATE_LEN},
  io,
};

/// `<base>(<n>).<ext>`, as Google names the n-th file sharing a name.
static NUMBERED_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(.*)\(([0-9]+)\)(\.[^.]+)$").unwrap());

const SIDECAR_SUFFIX: &str = ".json";

/// Every JSON file below the source roots, by file name.
pub struct SidecarIndex {
  by_name:         BTreeMap<String, Vec<PathBuf>>,
  edited_suffixes: Vec<String>,
}

impl SidecarIndex {
  /// Indexes every `*.json` file below `roots`.
  pub fn build(roots: &[PathBuf], config: &Config) -> Self {
    let mut by_name = BTreeMap::<String, Vec<PathBuf>>::new();

    for root in roots {
      for path in io::find_files(root, Config::path_is_sidecar) {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
          continue;
        };
        by_name.entry(name).or_default().push(path);
      }
    }

    log::debug!(
      "Indexed {} sidecars under {} source roots.",
      by_name.values().map(Vec::len).sum::<usize>(),
      roots.len()
    );

    Self {
      by_name,
      edited_suffixes: config.edited_suffixes.clone(),
    }
  }

  /// Finds the sidecar for a media file named `media_name`. Among several
  /// candidates of the same kind, those in `near_dir` win, then the shortest
  /// name, then the lowest name, then the lowest path.
  pub fn locate(&self, media_name: &str, near_dir: Option<&Path>) -> Option<&Path> {
    let (stem, extension) = split_name(media_name);

    let found = self
      .locate_direct(media_name, near_dir)
      .or_else(|| self.locate_numbered(media_name, near_dir))
      .or_else(|| {
        self.edited_suffixes.iter().find_map(|suffix| {
          let base = strip_suffix_ignore_case(stem, suffix)?;
          self.locate_direct(&format!("{base}{extension}"), near_dir)
        })
      })
      .or_else(|| self.locate_truncated(media_name, near_dir));

    match found {
      Some(sidecar) => log::trace!("{media_name}: Sidecar {}.", sidecar.display()),
      None => log::trace!("{media_name}: No sidecar."),
    }
    found
  }

  /// `<name>.json`, `<stem>.json`, then `<stem>.*.json`.
  fn locate_direct(&self, media_name: &str, near_dir: Option<&Path>) -> Option<&Path> {
    let (stem, _) = split_name(media_name);

    self
      .exact(&format!("{media_name}{SIDECAR_SUFFIX}"), near_dir)
      .or_else(|| self.exact(&format!("{stem}{SIDECAR_SUFFIX}"), near_dir))
      .or_else(|| {
        let prefix = format!("{stem}.");
        best(
          self
            .with_prefix(&prefix)
            .filter(|(name, _)| name[prefix.len()..].len() > SIDECAR_SUFFIX.len())
            .flat_map(|(_, paths)| paths),
          near_dir,
        )
      })
  }

  /// `IMG(1).jpg` => `IMG.jpg(1).json`.
  fn locate_numbered(&self, media_name: &str, near_dir: Option<&Path>) -> Option<&Path> {
    let caps = NUMBERED_RE.captures(media_name)?;
    self.exact(
      &format!("{}{}({}){SIDECAR_SUFFIX}", &caps[1], &caps[3], &caps[2]),
      near_dir,
    )
  }

  /// `<stem cut to length>*.json`. Only names long enough to have been cut
  /// are considered, so `IMG_1.jpg` never picks up `IMG_10.jpg.json`.
  fn locate_truncated(&self, media_name: &str, near_dir: Option<&Path>) -> Option<&Path> {
    if media_name.chars().count() <= SIDECAR_TRUNCATE_LEN {
      return None;
    }

    let (stem, _) = split_name(media_name);
    let truncated = stem.chars().take(SIDECAR_TRUNCATE_LEN).collect::<String>();
    best(
      self.with_prefix(&truncated).flat_map(|(_, paths)| paths),
      near_dir,
    )
  }

  fn exact(&self, name: &str, near_dir: Option<&Path>) -> Option<&Path> {
    best(self.by_name.get(name)?, near_dir)
  }

  fn with_prefix<'a, 'p>(
    &'a self,
    prefix: &'p str,
  ) -> impl Iterator<Item = (&'a String, &'a Vec<PathBuf>)> {
    self
      .by_name
      .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
      .take_while(move |(name, _)| name.starts_with(prefix))
  }
}

/// Picks the preferred candidate.
fn best<'a>(
  candidates: impl IntoIterator<Item = &'a PathBuf>,
  near_dir: Option<&Path>,
) -> Option<&'a Path> {
  candidates
    .into_iter()
    .min_by_key(|path: &&'a PathBuf| {
      let path: &'a PathBuf = *path;
      let name = path.file_name().unwrap_or_default();
      (
        Reverse(near_dir.is_some() && path.parent() == near_dir),
        name.len(),
        name,
        path.as_path(),
      )
    })
    .map(PathBuf::as_path)
}

/// Splits `name` into stem and extension (with dot), at the last dot.
fn split_name(name: &str) -> (&str, &str) {
  match name.rfind('.') {
    Some(i) if i > 0 => name.split_at(i),
    _ => (name, ""),
  }
}

fn strip_suffix_ignore_case<'a>(stem: &'a str, suffix: &str) -> Option<&'a str> {
  let split = stem.len().checked_sub(suffix.len())?;
  let (base, tail) = (stem.get(..split)?, stem.get(split..)?);
  (!base.is_empty() && tail.to_lowercase() == suffix.to_lowercase()).then_some(base)
}
