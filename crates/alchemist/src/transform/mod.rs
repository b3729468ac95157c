//! Row transformation from raw headers to canonical fields.

mod remap;

pub use remap::remap_rows;
