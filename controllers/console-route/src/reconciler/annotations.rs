//! Annotation merge policy.
//!
//! Operators and customers sometimes annotate the console route by hand (for
//! example to tune router behaviour). Those keys survive reconciliation; keys
//! the controller manages always take the controller's value.

use std::collections::BTreeMap;

/// Returns `base` plus every `observed` entry whose key `base` does not define.
pub fn merge_annotations(
    observed: &BTreeMap<String, String>,
    base: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = base.clone();
    for (key, value) in observed {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}
