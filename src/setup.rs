// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Program setup functions.

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
};

use env_logger::Builder;
use log::LevelFilter;

use crate::config::Config;

/// Directory under `XDG_CONFIG_HOME` searched for `config.json`.
const XDG_PREFIX: &str = "takeout_library";
const CONFIG_FILE: &str = "config.json";

/// Sets up `env_logger` with the format "LEVEL\tmessage" (e.g. "WARN\tsomething
/// went wrong").
///
/// Log levels:
/// Error: Program errors.
/// Warn: Skipped or removed files, and suspicious state.
/// Info: General program flow and progress.
/// Debug: Per-file operations.
/// Trace: `ExifTool` arguments and output.
pub fn configure_logging(verbosity: u8) {
  let level = match verbosity {
    0 => LevelFilter::Info,
    1 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };

  Builder::new()
    .filter_level(level)
    .format(|buf, record| {
      let style = buf.default_level_style(record.level());
      writeln!(buf, "{style}{}{style:#}\t{}", record.level(), record.args())
    })
    .init();
}

/// Loads configuration from `path` if given, else from
/// `XDG_CONFIG_HOME/takeout_library/config.json` if present, else defaults.
pub fn load_config(path: Option<PathBuf>) -> Result<Config, String> {
  let path = path.or_else(|| {
    xdg::BaseDirectories::with_prefix(XDG_PREFIX).find_config_file(CONFIG_FILE)
  });

  match path {
    Some(path) => {
      log::debug!("Loading configuration from {}.", path.display());
      Config::load(path)
    }
    None => Ok(Config::default()),
  }
}

/// Asks `question` on stdin, accepting `y` or `yes`. Always true if
/// `assume_yes`.
pub fn confirm(question: &str, assume_yes: bool) -> bool {
  if assume_yes {
    return true;
  }

  print!("{question} [y/N] ");
  if io::stdout().flush().is_err() {
    return false;
  }

  let mut answer = String::new();
  if io::stdin().lock().read_line(&mut answer).is_err() {
    return false;
  }

  matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
