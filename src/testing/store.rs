// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! In-memory stand-in for `ExifTool`.
//!
//! Tags are keyed by file content, so a copy of a file reports the same tags
//! as its source. Writes are kept per path and layered on top, unless the
//! store rewrites content, in which case written tags follow the new bytes.

use std::{
  cell::RefCell,
  collections::HashMap,
  fs,
  path::{Path, PathBuf},
};

use serde_json::{Map, Number, Value};

use crate::{
  io::{MetadataStore, TagUpdate, TagValue},
  prim::Metadata,
};

/// Tag marking content whose writes should fail.
const WRITE_ERROR_TAG: &str = "WriteError";

/// Tag holding what `probe_duration` reports.
const PROBE_DURATION_TAG: &str = "ProbeDuration";

#[derive(Default)]
pub struct FakeStore {
  state: RefCell<State>,
}

#[derive(Default)]
struct State {
  by_content:       HashMap<Vec<u8>, HashMap<String, String>>,
  written:          HashMap<PathBuf, HashMap<String, String>>,
  rewrites_content: bool,
}

impl FakeStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Associates `tags` with every file holding `content`.
  pub fn register(&self, content: &[u8], tags: impl IntoIterator<Item = (String, String)>) {
    self
      .state
      .borrow_mut()
      .by_content
      .entry(content.to_vec())
      .or_default()
      .extend(tags);
  }

  /// Makes every write change the file's bytes the way `ExifTool` does. The
  /// new bytes depend only on the old bytes and the updates, so identical
  /// files given identical updates stay identical.
  pub fn rewrite_content(&self) {
    self.state.borrow_mut().rewrites_content = true;
  }

  /// Current value of `tag` for `file`, as `read` would see it.
  pub fn read_tag(&self, file: impl AsRef<Path>, tag: &str) -> Option<String> {
    self.tags_of(file.as_ref()).ok()?.remove(tag)
  }

  fn tags_of(&self, file: &Path) -> Result<HashMap<String, String>, String> {
    let content =
      fs::read(file).map_err(|e| format!("{}: Failed to read ({e}).", file.display()))?;

    let state = self.state.borrow();
    let mut tags = state.by_content.get(&content).cloned().unwrap_or_default();
    if let Some(written) = state.written.get(file) {
      tags.extend(written.clone());
    }
    Ok(tags)
  }
}

impl MetadataStore for FakeStore {
  fn read(&self, file: &Path) -> Result<Metadata, String> {
    let tags = self.tags_of(file)?;

    let file_type = file
      .extension()
      .map(|e| e.to_string_lossy().to_uppercase())
      .unwrap_or_default();

    let mut json = Map::new();
    json.insert("SourceFile".to_string(), Value::from(file.display().to_string()));
    json.insert("FileType".to_string(), Value::from(file_type));
    for (tag, value) in tags {
      let value = match value.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(number) if tag == "Duration" => Value::Number(number),
        _ => Value::String(value),
      };
      json.insert(tag, value);
    }

    serde_json::from_value(Value::Object(json))
      .map_err(|e| format!("{}: Failed to parse metadata ({e}).", file.display()))
  }

  fn write(&self, file: &Path, updates: &[TagUpdate]) -> Result<(), String> {
    let tags = self.tags_of(file)?;
    if tags.contains_key(WRITE_ERROR_TAG) {
      return Err(format!("{}: Error writing file.", file.display()));
    }

    let updates = updates.iter().map(|update| {
      // Group prefixes (`QuickTime:`) aren't kept on read.
      let tag = update.tag.rsplit(':').next().unwrap_or(update.tag);
      let value = match &update.value {
        TagValue::DateTime(date_time) => date_time.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        TagValue::Number(number) => number.to_string(),
        TagValue::Text(text) => text.clone(),
      };
      (tag.to_string(), value)
    });

    let mut state = self.state.borrow_mut();
    if !state.rewrites_content {
      state
        .written
        .entry(file.to_path_buf())
        .or_default()
        .extend(updates);
      return Ok(());
    }

    let mut content =
      fs::read(file).map_err(|e| format!("{}: Failed to read ({e}).", file.display()))?;
    let mut tags = tags;
    for (tag, value) in updates {
      content.extend(format!("\n{tag}={value}").into_bytes());
      tags.insert(tag, value);
    }
    fs::write(file, &content).map_err(|e| format!("{}: Failed to write ({e}).", file.display()))?;
    state.by_content.entry(content).or_default().extend(tags);
    Ok(())
  }

  fn probe_duration(&self, file: &Path) -> Option<f64> {
    self.read_tag(file, PROBE_DURATION_TAG)?.parse().ok()
  }
}
