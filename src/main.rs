//! Migrates Google Photos Takeout exports into a by-year library with an album
//! mirror, repairing capture times with `exiftool`.
//!
//! Copyright 2023-5 Seth Pendergrass. See LICENSE.

use std::{path::PathBuf, process};

use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod config;
mod io;
mod org;
mod prim;
mod setup;

#[cfg(test)]
mod testing;

#[derive(Parser)]
struct Args {
  /// Configuration file. Defaults to XDG_CONFIG_HOME/takeout_library/config.json.
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Verbosity level. Max: 2.
  #[arg(short, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Migrate Takeout exports into an output library.
  Migrate {
    /// Extracted Takeout folders, or folders containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output library.
    #[arg(short, long)]
    output: PathBuf,

    /// Answer yes to every prompt.
    #[arg(short, long)]
    yes: bool,

    /// IANA time zone for times without an offset (e.g. America/Los_Angeles).
    #[arg(long)]
    time_zone: Option<String>,

    /// Year meaning "no capture time found". Defaults to the current year.
    #[arg(long)]
    threshold_year: Option<i32>,
  },
  /// Backfill album files missing from the library, then deduplicate.
  Validate {
    /// Output library.
    #[arg(short, long)]
    output: PathBuf,

    /// Takeout folders to find sidecars in.
    inputs: Vec<PathBuf>,
  },
  /// Remove duplicate content from an output library.
  Dedupe {
    /// Output library.
    #[arg(short, long)]
    output: PathBuf,
  },
}

fn main() {
  let args = Args::parse();
  setup::configure_logging(args.verbose);

  if let Err(e) = run(args) {
    log::error!("{e}");
    process::exit(1);
  }
}

fn run(args: Args) -> Result<(), String> {
  let mut config = setup::load_config(args.config)?;

  match args.command {
    Commands::Migrate {
      inputs,
      output,
      yes,
      time_zone,
      threshold_year,
    } => {
      if time_zone.is_some() {
        config.time_zone = time_zone;
      }
      if threshold_year.is_some() {
        config.threshold_year = threshold_year;
      }
      config.validate()?;
      commands::migrate(&config, &inputs, &output, yes)
    }
    Commands::Validate { output, inputs } => commands::validate(&config, &inputs, &output),
    Commands::Dedupe { output } => commands::dedupe(&config, &output),
  }
}
