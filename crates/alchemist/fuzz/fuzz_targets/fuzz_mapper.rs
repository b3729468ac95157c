//! Fuzz target for classification and header mapping.
//!
//! Any header set must classify and map without panicking, with scores in
//! `[0, 1]`.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use alchemist::inference::{map_headers, EntityClassifier};
use alchemist::EntityType;

#[derive(Debug, Arbitrary)]
struct Input {
    headers: Vec<String>,
}

fuzz_target!(|input: Input| {
    if input.headers.len() > 64 {
        return;
    }

    let classification = EntityClassifier::new().classify_detailed(&input.headers);
    if let Some(candidate) = classification.candidate {
        assert!((0.0..=1.0).contains(&candidate.average_score));
    }

    for entity in EntityType::ALL {
        let result = map_headers(&input.headers, entity);
        for (_, entry) in result.mapping.iter() {
            assert!((0.0..=1.0).contains(&entry.score));
        }
    }
});
