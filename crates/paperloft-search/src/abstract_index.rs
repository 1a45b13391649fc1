//! Abstract reconstruction from OpenAlex inverted indexes.
//!
//! OpenAlex ships abstracts as `{word: [positions...]}`. Rebuilding the text
//! places each word at each of its positions and joins them in position order.
//! Memory depends on the number of positions, never on their values.

use std::collections::BTreeMap;

use serde_json::Value;

/// Rebuild abstract text from an inverted index.
///
/// Total over any JSON input: non-objects, empty objects and indexes without
/// valid positions produce an empty string. Unfilled slots collapse away.
pub fn reconstruct_abstract(index: &Value) -> String {
    let Some(map) = index.as_object() else {
        return String::new();
    };

    let mut slots: BTreeMap<u64, &str> = BTreeMap::new();
    for (word, value) in map {
        let Some(items) = value.as_array() else {
            continue;
        };
        for p in items.iter().filter_map(Value::as_u64) {
            slots.insert(p, word.as_str());
        }
    }

    slots
        .values()
        .flat_map(|word| word.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
