//! Fuzz target for the upload parser.
//!
//! Delimited and JSON input must parse or fail cleanly, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use alchemist::{Parser, RawTable};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = Parser::new().parse_str(text);
    let _ = RawTable::from_json(text);
});
