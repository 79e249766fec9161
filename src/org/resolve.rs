// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Capture time resolution: sidecar, then embedded metadata, then the year of
//! the containing date folder.

use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use tzf_rs::DefaultFinder;

use crate::{
  config::Config,
  io::MetadataStore,
  prim::{self, Metadata, Provenance, ResolvedTimestamp, Sidecar},
};

pub struct Resolver {
  time_zone: Tz,
  finder:    Option<DefaultFinder>,
}

impl Resolver {
  pub fn new(config: &Config) -> Result<Self, String> {
    Ok(Self {
      time_zone: config.get_time_zone()?,
      finder:    config.time_zone_from_gps.then(DefaultFinder::new),
    })
  }

  /// Working time zone for wall-clock times without an offset.
  pub fn time_zone(&self) -> Tz {
    self.time_zone
  }

  /// Resolves the capture time of `media`. Embedded metadata is only read if
  /// the sidecar doesn't settle it.
  pub fn resolve(
    &self,
    store: &impl MetadataStore,
    media: &Path,
    sidecar: Option<&Sidecar>,
    folder_year: Option<i32>,
  ) -> ResolvedTimestamp {
    if let Some(resolved) = sidecar.and_then(|s| self.from_sidecar(s)) {
      return resolved;
    }

    let embedded = store
      .read(media)
      .map_err(|e| log::debug!("{e}"))
      .ok()
      .and_then(|m| {
        let date_time = self.localize_embedded(&m, m.get_date_time_original()?)?;
        ResolvedTimestamp::new(date_time, Provenance::EmbeddedMetadata)
      });
    if let Some(resolved) = embedded {
      return resolved;
    }

    folder_year
      .and_then(|year| prim::mid_year(year, self.time_zone))
      .and_then(|date_time| ResolvedTimestamp::new(date_time, Provenance::FolderYear))
      .unwrap_or_else(ResolvedTimestamp::unresolved)
  }

  /// Attaches a time zone to an embedded time read from `metadata`. QuickTime
  /// times without an offset are UTC, everything else is wall-clock time in
  /// the working time zone.
  pub fn localize_embedded(
    &self,
    metadata: &Metadata,
    (date_time, offset): (NaiveDateTime, Option<FixedOffset>),
  ) -> Option<DateTime<FixedOffset>> {
    if offset.is_none() && metadata.is_quicktime() {
      return Some(date_time.and_utc().with_timezone(&self.time_zone).fixed_offset());
    }
    prim::localize(date_time, offset, self.time_zone)
  }

  fn from_sidecar(&self, sidecar: &Sidecar) -> Option<ResolvedTimestamp> {
    let timestamp = sidecar.get_timestamp()?;
    let time_zone = sidecar
      .get_lat_lon()
      .and_then(|lat_lon| self.time_zone_at(lat_lon))
      .unwrap_or(self.time_zone);

    let resolved = prim::from_epoch(timestamp, time_zone)
      .and_then(|date_time| ResolvedTimestamp::new(date_time, Provenance::Sidecar));
    match &resolved {
      Some(resolved) => log::trace!(
        "{sidecar}: Resolved {:?} to {resolved}.",
        sidecar.title.as_deref().unwrap_or_default()
      ),
      None => log::debug!("{sidecar}: Timestamp {timestamp} out of range."),
    }
    resolved
  }

  fn time_zone_at(&self, (latitude, longitude): (f64, f64)) -> Option<Tz> {
    let name = self.finder.as_ref()?.get_tz_name(longitude, latitude);
    name
      .parse::<Tz>()
      .map_err(|_| log::debug!("No time zone for {latitude}, {longitude} (\"{name}\")."))
      .ok()
  }
}
