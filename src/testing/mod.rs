// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Test-only utilities.

mod asserts;
mod dates;
mod store;
mod test_dir;

pub use dates::*;
pub use store::*;
pub use test_dir::*;

pub use crate::{assert_dir, assert_err, assert_tag, metadata, test_dir, test_path};

pub fn type_of<T>(_: T) -> &'static str {
  std::any::type_name::<T>()
}

#[macro_export]
macro_rules! metadata {
  ($($key:literal: $value:literal),* $(,)?) => {
    serde_json::from_value::<$crate::prim::Metadata>(
      serde_json::json!({
        "SourceFile": "-",
        "FileType": "-",
        "FileModifyDate": "1970-01-01T00:00:00",
        $(
          $key: $value,
        )*
      })
    ).unwrap()
  }
}
