// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Helper for settings up test directories with media files and sidecars.

use std::{
  collections::{HashMap, HashSet, VecDeque},
  env,
  fs,
  path::{Path, PathBuf},
  sync::LazyLock,
};

use chrono::DateTime;

use super::FakeStore;
use crate::io;

static TEST_ROOT: LazyLock<PathBuf> =
  LazyLock::new(|| env::temp_dir().join(format!("{}_tests", env!("CARGO_PKG_NAME"))));

/// File bytes. Defaults to the file name, so same-named files are identical.
const CONTENT_TAG: &str = "Content";
/// Pads the file with zeros up to this many bytes.
const SIZE_TAG: &str = "Size";
/// Filesystem modification time, RFC 3339.
const MTIME_TAG: &str = "MTime";

/// Helper for creating directories for tests needing actual files.
pub struct TestDir {
  root:  PathBuf,
  store: FakeStore,
}

impl TestDir {
  /// Creates a new directory under `TEST_ROOT` for tests involving file
  /// operations. Every tag that isn't a pseudo-tag (`Content`, `Size`,
  /// `MTime`) is registered with the directory's `FakeStore`.
  /// Note: Prefer using `test_dir!()` macro.
  pub fn new(
    test_path: PathBuf,
    files: Vec<(&'static str, HashMap<&'static str, &'static str>)>,
  ) -> Self {
    let root_rel = TEST_ROOT.join(test_path);
    if root_rel.exists() {
      fs::remove_dir_all(&root_rel).unwrap();
    }
    fs::create_dir_all(&root_rel).unwrap();

    let root = root_rel.canonicalize().unwrap();
    let store = FakeStore::new();

    for (file, tags) in files {
      create_file(&root, &store, file, tags);
    }

    Self { root, store }
  }

  pub fn files(&self) -> HashSet<PathBuf> {
    traverse_dir(&self.root)
  }

  pub fn get_path(&self, file: impl AsRef<Path>) -> PathBuf {
    self.root.join(file)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn store(&self) -> &FakeStore {
    &self.store
  }
}

fn create_file(
  working_dir: impl AsRef<Path>,
  store: &FakeStore,
  path: impl AsRef<Path>,
  mut tags: HashMap<&str, &str>,
) {
  let full_path = working_dir.as_ref().join(path.as_ref());

  assert!(!full_path.exists(), "File already exists: {full_path:?}");
  fs::create_dir_all(full_path.parent().unwrap()).unwrap();

  let mut content = tags
    .remove(CONTENT_TAG)
    .map_or_else(
      || full_path.file_name().unwrap().as_encoded_bytes().to_vec(),
      |c| c.as_bytes().to_vec(),
    );
  if let Some(size) = tags.remove(SIZE_TAG) {
    content.resize(size.parse().unwrap(), 0);
  }
  fs::write(&full_path, &content).unwrap();

  if let Some(mtime) = tags.remove(MTIME_TAG) {
    io::set_modify_time(&full_path, DateTime::parse_from_rfc3339(mtime).unwrap()).unwrap();
  }

  store.register(
    &content,
    tags
      .into_iter()
      .map(|(k, v)| (k.to_string(), v.to_string())),
  );
}

fn traverse_dir(root: impl AsRef<Path>) -> HashSet<PathBuf> {
  let mut dirs = VecDeque::from([root.as_ref().to_owned()]);
  let mut files = HashSet::new();

  while let Some(dir) = dirs.pop_front() {
    for entry in fs::read_dir(dir).unwrap().map(Result::unwrap) {
      let file_type = entry.file_type().unwrap();
      if file_type.is_dir() {
        dirs.push_back(entry.path());
      } else if file_type.is_file() {
        files.insert(entry.path());
      } else {
        panic!("Unexpected file type: {file_type:?}");
      }
    }
  }

  files
}

#[macro_export]
macro_rules! test_path {
  () => {{
    // HACK: Get module hierarchy for caller.
    let mut function = $crate::testing::type_of(|| ()).rsplit("::");
    // 0th element is `{closure}`.
    let case = function.nth(1).unwrap();
    let suite = function.next().unwrap();
    let module = function.next().unwrap();

    std::path::PathBuf::from(format!("{module}/{suite}/{case}"))
  }};
}

#[macro_export]
macro_rules! test_dir {
  ($($file:literal: {$($key:literal: $value:literal),* $(,)?}),* $(,)?) => {{
    let files = vec![
      $(($file, std::collections::HashMap::from([$(($key, $value)),*]))),*
    ];
    $crate::testing::TestDir::new($crate::test_path!(), files)
  }};
}
