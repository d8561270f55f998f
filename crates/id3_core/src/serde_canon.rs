//! Canonical JSON serialization for deterministic model hashing
//!
//! - Object keys sorted recursively
//! - No whitespace
//! - BLAKE3 digest of the canonical text

use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = canonicalize(serde_json::to_value(value)?);
    serde_json::to_string(&canonical)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key, canonicalize(val));
            }
            Value::Object(sorted)
        }
        Value::Array(elements) => Value::Array(elements.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// BLAKE3 hash of the canonical JSON, hex encoded
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = to_canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Outer {
        zeta: Inner,
        alpha: Vec<Inner>,
    }

    #[derive(Serialize)]
    struct Inner {
        y: f64,
        b: &'static str,
    }

    #[test]
    fn test_keys_sorted_at_every_level() {
        let value = Outer {
            zeta: Inner { y: 1.5, b: "x" },
            alpha: vec![Inner { y: 0.0, b: "z" }],
        };
        let json = to_canonical_json(&value).unwrap();
        assert_eq!(
            json,
            r#"{"alpha":[{"b":"z","y":0.0}],"zeta":{"b":"x","y":1.5}}"#
        );
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let value = Inner { y: 2.0, b: "q" };
        let h1 = hash_canonical_hex(&value).unwrap();
        let h2 = hash_canonical_hex(&value).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        let other = hash_canonical_hex(&Inner { y: 2.5, b: "q" }).unwrap();
        assert_ne!(h1, other);
    }
}
