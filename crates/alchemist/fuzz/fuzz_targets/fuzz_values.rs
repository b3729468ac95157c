//! Fuzz target for cell value helpers.
//!
//! Numbers, lists and dates are read from arbitrary strings.

#![no_main]

use libfuzzer_sys::fuzz_target;
use alchemist::schema::{as_list, as_number, is_valid_date_cell, parse_date};
use serde_json::Value;

fuzz_target!(|data: &str| {
    if data.len() > 10_000 {
        return;
    }

    let value = Value::String(data.to_string());
    if let Some(n) = as_number(&value) {
        assert!(n.is_finite());
    }
    assert!(as_list(&value).iter().all(|item| !item.is_empty()));
    let _ = parse_date(data);
    let _ = is_valid_date_cell(&value);
});
