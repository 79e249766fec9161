// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Detection of motion photo companion clips: the short `.mov` saved next to a
//! still image, which only makes sense alongside it.

use crate::{
  config::{Config, constants::COMPANION_CONTAINERS},
  io::MetadataStore,
  prim::{self, Media, MediaKind},
};

/// Whether `media` should be migrated. Only a video that meets every
/// companion clip criterion is dropped. A video of unknown duration is kept.
pub fn should_keep(media: &Media, config: &Config, store: &impl MetadataStore) -> bool {
  if media.kind() != MediaKind::Video {
    return true;
  }

  if !COMPANION_CONTAINERS.contains(&media.extension().as_str()) {
    return true;
  }

  if media.size() > config.companion_max_bytes {
    return true;
  }

  let Some(image) = media.find_sibling_image(config) else {
    return true;
  };

  let Some(duration) = get_duration(media, store) else {
    log::debug!("{media}: Unknown duration, keeping.");
    return true;
  };

  if duration > config.companion_max_seconds {
    return true;
  }

  log::info!(
    "{media}: Skipping companion clip of {} ({} bytes, {duration:.2}s).",
    image.display(),
    media.size()
  );
  false
}

/// Duration in seconds, from metadata if reported there, else from the store's
/// probe.
fn get_duration(media: &Media, store: &impl MetadataStore) -> Option<f64> {
  let from_metadata = store
    .read(media.path())
    .map_err(|e| log::debug!("{e}"))
    .ok()
    .and_then(|m| {
      m.get_duration_seconds()
        .or_else(|| m.get_duration_text().and_then(prim::parse_duration))
    });

  from_metadata.or_else(|| store.probe_duration(media.path()))
}
