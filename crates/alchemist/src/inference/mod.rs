//! Entity classification and header mapping.
//!
//! - [`similarity`] scores two normalized strings (Dice over bigrams)
//! - [`HeaderMapper`] maps raw headers onto one schema's canonical fields
//! - [`EntityClassifier`] decides which schema a table belongs to

mod classifier;
mod mapper;
pub mod similarity;

pub use classifier::{
    classify, required_field_coverage, Classification, ClassificationMethod, EntityClassifier,
};
pub use mapper::{
    map_headers, FieldMatch, HeaderMapper, HeaderMapping, MapperConfig, MappingResult,
    MappingSource, ADVISOR_SCORE_CEILING, SIMILARITY_FLOOR,
};
