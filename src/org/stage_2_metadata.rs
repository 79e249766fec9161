// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Organizer Stage 2: Writing resolved capture times (and locations) into
//! output files, then making filesystem modification times agree.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset, Utc};

use super::{MetadataSummary, Organizer, organizer, stage_1_collection::PROGRESS_INTERVAL};
use crate::{
  io::{self, MetadataStore, TagUpdate, TagValue},
  prim::{self, Bucket, MediaKind, Sidecar},
};

const VIDEO_DATE_TAGS: [&str; 6] = [
  "QuickTime:CreateDate",
  "QuickTime:ModifyDate",
  "QuickTime:TrackCreateDate",
  "QuickTime:TrackModifyDate",
  "QuickTime:MediaCreateDate",
  "QuickTime:MediaModifyDate",
];

const IMAGE_DATE_TAGS: [(&str, &str); 3] = [
  ("DateTimeOriginal", "OffsetTimeOriginal"),
  ("CreateDate", "OffsetTimeDigitized"),
  ("ModifyDate", "OffsetTime"),
];

impl<S: MetadataStore> Organizer<'_, S> {
  /// Writes the resolved capture time into every output file, and sets its
  /// modification time to match. Canonical files fall back to their bucket's
  /// year.
  pub fn write_metadata(&self) -> MetadataSummary {
    log::info!("Writing metadata.");

    let mut summary = MetadataSummary::default();
    let files = self.list_output();

    for (i, (bucket, file)) in files.iter().enumerate() {
      self.write_file(file, *bucket, &mut summary);

      if (i + 1) % PROGRESS_INTERVAL == 0 {
        log::info!("Wrote metadata for {} of {} files.", i + 1, files.len());
      }
    }

    log::info!("Checking modification times.");
    for (bucket, file) in &files {
      self.check_modify_time(file, *bucket, &mut summary);
    }

    summary.stale = self.count_stale();
    summary
  }

  /// Canonical files with their bucket, then album files.
  fn list_output(&self) -> Vec<(Option<Bucket>, PathBuf)> {
    let mut files = organizer::list_structure(&self.layout.canonical, true);
    files.extend(organizer::list_structure(&self.layout.albums, false));
    files.retain(|(_, file)| self.config.media_kind(file).is_some());
    files
  }

  fn write_file(&self, file: &Path, bucket: Option<Bucket>, summary: &mut MetadataSummary) {
    let sidecar = self.find_sidecar(file);
    let resolved = self.resolver.resolve(
      self.store,
      file,
      sidecar.as_ref(),
      bucket.and_then(Bucket::year),
    );

    let Some(date_time) = resolved.date_time() else {
      log::debug!("{}: No capture time found, leaving as is.", file.display());
      summary.not_fixed += 1;
      return;
    };

    let updates = match self.config.media_kind(file) {
      Some(MediaKind::Video) => video_updates(date_time),
      _ => image_updates(date_time, sidecar.as_ref()),
    };

    if let Err(e) = self.store.write(file, &updates) {
      log::warn!("{e}");
      summary.failed_writes += 1;
      return;
    }

    // Writing changes the modification time, so this comes last.
    if let Err(e) = io::set_modify_time(file, date_time) {
      log::warn!("{e}");
      summary.failed_writes += 1;
      return;
    }

    log::debug!("{}: Set capture time to {resolved}.", file.display());
    summary.fixed += 1;
  }

  /// Copies the embedded time into the modification time where they differ.
  /// Then, files in a year bucket still showing a threshold-year modification
  /// time get their bucket's mid-year.
  fn check_modify_time(&self, file: &Path, bucket: Option<Bucket>, summary: &mut MetadataSummary) {
    let embedded = self
      .store
      .read(file)
      .map_err(|e| log::debug!("{e}"))
      .ok()
      .and_then(|m| {
        let date_time = m.get_embedded_date_time()?;
        self.resolver.localize_embedded(&m, date_time)
      });

    let mut mtime = match io::get_modify_time(file) {
      Ok(mtime) => mtime,
      Err(e) => {
        log::warn!("{e}");
        return;
      }
    };

    if let Some(embedded) = embedded
      && embedded.timestamp() != mtime.timestamp()
      && prim::is_valid_year(embedded.year())
    {
      match io::set_modify_time(file, embedded) {
        Ok(()) => {
          log::debug!("{}: Modification time synced to {embedded}.", file.display());
          summary.mtime_synced += 1;
          mtime = embedded.with_timezone(&Utc);
        }
        Err(e) => log::warn!("{e}"),
      }
    }

    let threshold_year = self.config.get_threshold_year();
    let time_zone = self.resolver.time_zone();
    let Some(year) = bucket.and_then(Bucket::year) else {
      return;
    };
    if year == threshold_year || mtime.with_timezone(&time_zone).year() != threshold_year {
      return;
    }

    let Some(mid_year) = prim::mid_year(year, time_zone) else {
      return;
    };
    match io::set_modify_time(file, mid_year) {
      Ok(()) => {
        log::debug!("{}: Modification time forced to {mid_year}.", file.display());
        summary.forced += 1;
      }
      Err(e) => log::warn!("{e}"),
    }
  }
}

/// QuickTime stores UTC.
fn video_updates(date_time: DateTime<FixedOffset>) -> Vec<TagUpdate> {
  let utc = date_time.with_timezone(&Utc).fixed_offset();
  VIDEO_DATE_TAGS
    .into_iter()
    .map(|tag| TagUpdate::new(tag, TagValue::DateTime(utc)))
    .collect()
}

fn image_updates(date_time: DateTime<FixedOffset>, sidecar: Option<&Sidecar>) -> Vec<TagUpdate> {
  let offset = date_time.offset().to_string();

  let mut updates = IMAGE_DATE_TAGS
    .into_iter()
    .flat_map(|(date_tag, offset_tag)| {
      [
        TagUpdate::new(date_tag, TagValue::DateTime(date_time)),
        TagUpdate::new(offset_tag, TagValue::Text(offset.clone())),
      ]
    })
    .collect::<Vec<_>>();

  if let Some((latitude, longitude)) = sidecar.and_then(Sidecar::get_lat_lon) {
    let latitude_ref = if latitude < 0.0 { "S" } else { "N" };
    let longitude_ref = if longitude < 0.0 { "W" } else { "E" };
    updates.extend([
      TagUpdate::new("GPSLatitude", TagValue::Number(latitude.abs())),
      TagUpdate::new("GPSLatitudeRef", TagValue::Text(latitude_ref.to_string())),
      TagUpdate::new("GPSLongitude", TagValue::Number(longitude.abs())),
      TagUpdate::new("GPSLongitudeRef", TagValue::Text(longitude_ref.to_string())),
    ]);
  }

  updates
}

#[cfg(test)]
mod test_write_metadata {
  use super::*;
  use crate::{config::Config, testing::*};

  fn config() -> Config {
    Config {
      time_zone_from_gps: false,
      threshold_year: Some(2025),
      ..Config::default()
    }
  }

  #[test]
  fn writes_sidecar_time_and_location() {
    let d = test_dir!(
      "in/Google Photos/Trip/photo.jpg": {},
      "in/Google Photos/Trip/photo.jpg.json": {
        "Content": r#"{
          "photoTakenTime": { "timestamp": "1420070400" },
          "geoData": { "latitude": -33.8688, "longitude": 151.2093 }
        }"#
      },
    );
    let config = config();
    let mut organizer =
      Organizer::new(&config, d.store(), vec![d.get_path("in/Google Photos")], d.get_path("out"))
        .unwrap();
    organizer.collect();

    let summary = organizer.write_metadata();

    assert_eq!(summary.fixed, 2);
    assert_eq!(summary.failed_writes, 0);
    assert_tag!(d, "out/ALL_PHOTOS/2015/photo.jpg", "DateTimeOriginal", "2015-01-01T00:00:00+00:00");
    assert_tag!(d, "out/ALL_PHOTOS/2015/photo.jpg", "OffsetTimeOriginal", "+00:00");
    assert_tag!(d, "out/ALL_PHOTOS/2015/photo.jpg", "GPSLatitude", "33.8688");
    assert_tag!(d, "out/ALL_PHOTOS/2015/photo.jpg", "GPSLatitudeRef", "S");
    assert_tag!(d, "out/ALL_PHOTOS/2015/photo.jpg", "GPSLongitudeRef", "E");
    assert_tag!(d, "out/ALBUMS/Trip/photo.jpg", "DateTimeOriginal", "2015-01-01T00:00:00+00:00");
    assert_eq!(
      io::get_modify_time(d.get_path("out/ALL_PHOTOS/2015/photo.jpg")).unwrap(),
      make_date(2015, 1, 1, 0, 0, 0, 0, 0)
    );
  }

  #[test]
  fn writes_videos_in_utc() {
    let d = test_dir!(
      "in/Google Photos/Trip/clip.mp4": {},
      "in/Google Photos/Trip/clip.mp4.json": {
        "Content": r#"{ "photoTakenTime": { "timestamp": "1420070400" } }"#
      },
    );
    let config = Config {
      time_zone: Some("America/Los_Angeles".to_string()),
      ..config()
    };
    let mut organizer =
      Organizer::new(&config, d.store(), vec![d.get_path("in/Google Photos")], d.get_path("out"))
        .unwrap();
    organizer.collect();

    organizer.write_metadata();

    assert_tag!(d, "out/ALL_PHOTOS/2014/clip.mp4", "CreateDate", "2015-01-01T00:00:00+00:00");
    assert_tag!(d, "out/ALL_PHOTOS/2014/clip.mp4", "TrackModifyDate", "2015-01-01T00:00:00+00:00");
    assert_tag!(d, "out/ALL_PHOTOS/2014/clip.mp4", "DateTimeOriginal", None);
  }

  #[test]
  fn uses_bucket_year_for_canonical_only() {
    let d = test_dir!(
      "in/Google Photos/Photos from 2012/a.jpg": {},
      "in/Google Photos/Trip/b.jpg": {},
    );
    let config = config();
    let mut organizer =
      Organizer::new(&config, d.store(), vec![d.get_path("in/Google Photos")], d.get_path("out"))
        .unwrap();
    organizer.collect();

    let summary = organizer.write_metadata();

    assert_eq!(summary.fixed, 1);
    assert_eq!(summary.not_fixed, 2);
    assert_tag!(d, "out/ALL_PHOTOS/2012/a.jpg", "DateTimeOriginal", "2012-07-01T12:00:00+00:00");
    assert_tag!(d, "out/ALL_PHOTOS/Unknown/b.jpg", "DateTimeOriginal", None);
    assert_tag!(d, "out/ALBUMS/Trip/b.jpg", "DateTimeOriginal", None);
  }

  #[test]
  fn counts_failed_writes() {
    let d = test_dir!(
      "in/Google Photos/Photos from 2012/a.jpg": { "WriteError": "1" },
    );
    let config = config();
    let mut organizer =
      Organizer::new(&config, d.store(), vec![d.get_path("in/Google Photos")], d.get_path("out"))
        .unwrap();
    organizer.collect();

    let summary = organizer.write_metadata();

    assert_eq!(summary.failed_writes, 1);
    assert_eq!(summary.fixed, 0);
  }

  #[test]
  fn syncs_modify_time_to_embedded() {
    let d = test_dir!(
      "out/ALBUMS/Trip/a.jpg": {
        "ModifyDate": "2011:02:03 04:05:06", "MTime": "2020-01-01T00:00:00Z"
      },
    );
    let config = config();
    let organizer = Organizer::new(&config, d.store(), vec![], d.get_path("out")).unwrap();

    let summary = organizer.write_metadata();

    assert_eq!(summary.not_fixed, 1);
    assert_eq!(summary.mtime_synced, 1);
    assert_eq!(
      io::get_modify_time(d.get_path("out/ALBUMS/Trip/a.jpg")).unwrap(),
      make_date(2011, 2, 3, 4, 5, 6, 0, 0)
    );
  }

  #[test]
  fn forces_threshold_year_to_mid_year() {
    let d = test_dir!(
      "out/ALL_PHOTOS/2013/a.mkv": { "WriteError": "1", "MTime": "2025-05-05T00:00:00Z" },
      "out/ALL_PHOTOS/Unknown/b.mkv": { "MTime": "2025-05-05T00:00:00Z" },
    );
    let config = config();
    let organizer = Organizer::new(&config, d.store(), vec![], d.get_path("out")).unwrap();

    let summary = organizer.write_metadata();

    assert_eq!(summary.failed_writes, 1);
    assert_eq!(summary.forced, 1);
    assert_eq!(summary.stale, 1);
    assert_eq!(
      io::get_modify_time(d.get_path("out/ALL_PHOTOS/2013/a.mkv")).unwrap(),
      make_date(2013, 7, 1, 12, 0, 0, 0, 0)
    );
  }
}
