//! Canonical schemas, header normalization and cell value helpers.

mod entity;
mod normalize;
mod registry;
mod value;

pub use entity::EntityType;
pub use normalize::normalize;
pub use registry::{schema_for, EntitySchema, FieldSpec};
pub use value::{
    as_list, as_number, display_value, is_empty_value, is_missing_or_empty, is_valid_date_cell,
    parse_date, Row,
};
