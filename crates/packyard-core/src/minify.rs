//! Composer 2 metadata minification.
//!
//! Each entry after the first only carries the keys whose value differs from
//! the previous version. Keys the previous version had and this one lacks
//! are sent as [`UNSET`].

use serde_json::{Map, Value};

/// Placeholder for a key removed relative to the previous version.
///
/// A version whose own value is this string cannot be told apart from a
/// removal, so such versions must be rejected before minifying.
pub const UNSET: &str = "__unset";

/// The first key of `version` whose value is the literal [`UNSET`] marker.
pub fn reserved_key(version: &Map<String, Value>) -> Option<&str> {
    version
        .iter()
        .find(|(_, value)| value.as_str() == Some(UNSET))
        .map(|(key, _)| key.as_str())
}

/// Delta-encodes `versions`, each entry against its predecessor in the input.
pub fn minify(versions: &[Map<String, Value>]) -> Vec<Map<String, Value>> {
    let mut previous: Option<&Map<String, Value>> = None;
    let mut minified = Vec::with_capacity(versions.len());

    for version in versions {
        let entry = match previous {
            None => version.clone(),
            Some(previous) => {
                let mut delta: Map<String, Value> = version
                    .iter()
                    .filter(|(key, value)| previous.get(*key) != Some(*value))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();

                for key in previous.keys() {
                    if !version.contains_key(key) {
                        delta.insert(key.clone(), Value::String(UNSET.to_string()));
                    }
                }
                delta
            }
        };

        minified.push(entry);
        previous = Some(version);
    }

    minified
}

/// Reverses [`minify`].
pub fn expand(minified: &[Map<String, Value>]) -> Vec<Map<String, Value>> {
    let mut current: Option<Map<String, Value>> = None;
    let mut expanded = Vec::with_capacity(minified.len());

    for delta in minified {
        let version = match current.take() {
            None => delta.clone(),
            Some(mut version) => {
                for (key, value) in delta {
                    if value.as_str() == Some(UNSET) {
                        version.remove(key);
                    } else {
                        version.insert(key.clone(), value.clone());
                    }
                }
                version
            }
        };

        expanded.push(version.clone());
        current = Some(version);
    }

    expanded
}
