//! Renaming row keys from raw headers to canonical fields.

use std::collections::HashMap;

use log::warn;

use crate::inference::HeaderMapping;
use crate::schema::Row;

/// Apply a finalized mapping to every row.
///
/// Each key is looked up exactly, then case-insensitively. Keys with an
/// assigned field are renamed; everything else passes through unchanged.
/// When two keys of one row land on the same field, the later key's value
/// wins. Inputs are not modified.
pub fn remap_rows(rows: &[Row], mapping: &HeaderMapping) -> Vec<Row> {
    let conflicts = mapping.conflicts();
    for (field, headers) in &conflicts {
        warn!(
            "headers {} all map to '{}'; keeping the last value per row",
            headers.join(", "),
            field
        );
    }

    let mut targets: HashMap<&str, String> = HashMap::new();
    rows.iter()
        .map(|row| {
            let mut out = Row::with_capacity(row.len());
            for (key, value) in row {
                let target = targets.entry(key.as_str()).or_insert_with(|| {
                    mapping
                        .field_for(key)
                        .map_or_else(|| key.clone(), str::to_string)
                });
                out.insert(target.clone(), value.clone());
            }
            out
        })
        .collect()
}
