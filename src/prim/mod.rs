// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Primitive types for representing media files, their sidecars and metadata,
//! and the timestamps resolved from them.

mod conv;
mod fingerprint;
mod media;
mod metadata;
mod sidecar;
mod timestamp;

pub use conv::*;
pub use fingerprint::*;
pub use media::*;
pub use metadata::*;
pub use sidecar::*;
pub use timestamp::*;
