//! Business rules: model, application and the cell edit guard.

mod apply;
mod edit;
mod model;

pub use apply::{apply_rules, priority_label};
pub use edit::check_edit;
pub use model::{Rule, RulesConfig, DISTANCE_WEIGHT, DURATION_WEIGHT, PRIORITY_WEIGHT};
