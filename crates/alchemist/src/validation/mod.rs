//! Validation of canonical tables and user rules.
//!
//! Every check is a pure function of its input: reports are recomputed from
//! scratch and nothing here modifies data or rules.

mod advanced;
mod report;
mod rules;
mod structural;

pub use advanced::{check_advanced, validate_rules_advanced};
pub use report::{ValidationError, ValidationReport};
pub use rules::validate_rules;
pub use structural::validate_data;
