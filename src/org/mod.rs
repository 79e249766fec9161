//! Migration of Google Photos exports into a by-year library.
//!
//! Copyright 2023-5 Seth Pendergrass. See LICENSE.

mod classify;
mod locate;
mod organizer;
mod report;
mod resolve;
mod stage_1_collection;
mod stage_2_metadata;
mod stage_3_validation;
mod stage_4_deduplication;

pub use organizer::{Layout, Organizer, find_source_roots};
pub use report::*;
pub use stage_4_deduplication::deduplicate_tree;
