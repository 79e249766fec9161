// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Program subcommands for migrating a Google Photos export.

use std::{
  fs,
  path::{Path, PathBuf},
};

use crate::{
  config::Config,
  io::{self, ExifTool, MetadataStore},
  org::{self, DedupSummary, Layout, Organizer},
  setup,
};

/// Migrates every source root found under `inputs` into `output`, running
/// every stage and writing the report.
pub fn migrate(
  config: &Config,
  inputs: &[PathBuf],
  output: &Path,
  assume_yes: bool,
) -> Result<(), String> {
  let store = ExifTool::new(config)?;
  migrate_with(config, &store, inputs, output, assume_yes)
}

fn migrate_with(
  config: &Config,
  store: &impl MetadataStore,
  inputs: &[PathBuf],
  output: &Path,
  assume_yes: bool,
) -> Result<(), String> {
  let sources = get_sources(config, inputs, assume_yes)?;

  if has_entries(output)
    && !setup::confirm(
      &format!("{} is not empty. Merge into it?", output.display()),
      assume_yes,
    )
  {
    return Err("Aborted.".to_string());
  }

  log::info!("Migrating {} source roots into {}.", sources.len(), output.display());

  let report = Organizer::new(config, store, sources, output)?.run()?;

  log::info!(
    "Done: {} copied, {} backfilled, {} duplicates removed.",
    report.collection.copied,
    report.validation.backfilled,
    report.dedup.removed
  );
  Ok(())
}

/// Checks an existing output for album files missing from the canonical
/// library, then deduplicates it. `inputs` are only used to find sidecars for
/// backfilled files.
pub fn validate(config: &Config, inputs: &[PathBuf], output: &Path) -> Result<(), String> {
  check_output(output)?;
  let store = ExifTool::new(config)?;
  validate_with(config, &store, inputs, output)
}

fn validate_with(
  config: &Config,
  store: &impl MetadataStore,
  inputs: &[PathBuf],
  output: &Path,
) -> Result<(), String> {
  let sources = org::find_source_roots(inputs, config);
  let mut organizer = Organizer::new(config, store, sources, output)?;

  let validation = organizer.validate();
  log::info!("{validation}");

  let dedup = organizer.deduplicate()?;
  log::info!("{dedup}");

  Ok(())
}

/// Removes duplicate content from an existing output.
pub fn dedupe(config: &Config, output: &Path) -> Result<(), String> {
  check_output(output)?;

  let layout = Layout::new(output);
  io::touch(&layout.duplicates_log)?;

  let mut summary = DedupSummary::default();
  for root in [&layout.canonical, &layout.albums] {
    if root.is_dir() {
      summary += org::deduplicate_tree(root, &layout.duplicates_log, config.dedup_prefix_bytes);
    }
  }

  log::info!("{summary}");
  Ok(())
}

/// Finds source roots below `inputs`. Without any, offers to treat `inputs`
/// themselves as source roots.
fn get_sources(
  config: &Config,
  inputs: &[PathBuf],
  assume_yes: bool,
) -> Result<Vec<PathBuf>, String> {
  for input in inputs {
    if !input.is_dir() {
      return Err(format!("{}: Input is not a directory.", input.display()));
    }
  }

  let sources = org::find_source_roots(inputs, config);
  if !sources.is_empty() {
    return Ok(sources);
  }

  log::warn!(
    "No folder named any of {:?} found in the inputs.",
    config.root_names
  );
  if setup::confirm("Use the inputs themselves as source folders?", assume_yes) {
    let mut sources = inputs.to_vec();
    sources.sort();
    sources.dedup();
    Ok(sources)
  } else {
    Err("No source folders.".to_string())
  }
}

fn check_output(output: &Path) -> Result<(), String> {
  if output.is_dir() {
    Ok(())
  } else {
    Err(format!("{}: Output is not a directory.", output.display()))
  }
}

fn has_entries(dir: &Path) -> bool {
  fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}
