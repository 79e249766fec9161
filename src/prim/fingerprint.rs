// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Content fingerprints, used to test files for byte equality without
//! comparing them directly.

use core::fmt;
use std::fmt::{Display, Formatter};

/// BLAKE3 digest of (some prefix of) a file's contents, plus its total size.
/// Two fingerprints are only comparable if computed over the same prefix
/// length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
  hash: blake3::Hash,
  size: u64,
}

impl Fingerprint {
  pub fn new(hash: blake3::Hash, size: u64) -> Self {
    Self { hash, size }
  }

  pub fn size(&self) -> u64 {
    self.size
  }
}

impl Display for Fingerprint {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", &self.hash.to_hex()[..16], self.size)
  }
}
