//! Session state: loaded tables, rules and uploads awaiting review.

mod state;

pub use state::{PendingMapping, Session};
