//! # Canonical Serialization — JCS-Compatible Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes used in
//! digest computation across the Covenant Stack.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct one is `CanonicalBytes::new()`, which rejects non-integer
//! floats and then serializes with RFC 8785 (JSON Canonicalization Scheme)
//! semantics: sorted keys, compact separators, deterministic byte
//! sequence. Any function that needs canonical bytes must accept
//! `&CanonicalBytes`, so a "wrong serialization path" cannot exist.
//!
//! ## Cross-Language Compatibility
//!
//! The output matches `json.dumps(obj, sort_keys=True,
//! separators=(",", ":"), ensure_ascii=False).encode("utf-8")` for the
//! float-free value domain, which is what the conformance-vector suites in
//! other languages produce. Floats are rejected rather than normalized:
//! ES6 number formatting, Python `repr`, and Rust `ryu` disagree on enough
//! edge cases that the only portable rule is "no floats in hashed data".

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization over a float-free
/// JSON value.
///
/// # Invariants
///
/// - The only constructor is [`CanonicalBytes::new()`].
/// - The value tree contains no non-integer numbers.
/// - Object keys are sorted lexicographically at every depth.
/// - The byte sequence is valid UTF-8 JSON with compact separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value tree
    /// contains a number that is not representable as `i64`/`u64`, and
    /// [`CanonicalizationError::SerializationFailed`] if JCS serialization
    /// fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Walk a JSON value tree and reject any number that is a pure float.
///
/// Integers stored as `i64`/`u64` pass; a number that only exists as `f64`
/// is the cross-language hazard and fails the whole canonicalization.
fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_str(data: &impl Serialize) -> String {
        let cb = CanonicalBytes::new(data).expect("should canonicalize");
        String::from_utf8(cb.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn sorts_keys_with_compact_separators() {
        let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
        assert_eq!(canonical_str(&data), r#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn sorts_nested_object_keys() {
        let data = serde_json::json!({
            "outer": {"z": 1, "a": 2},
            "list": [3, 2, 1]
        });
        assert_eq!(
            canonical_str(&data),
            r#"{"list":[3,2,1],"outer":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn rejects_floats() {
        let data = serde_json::json!({"amount": 1.5});
        match CanonicalBytes::new(&data) {
            Err(CanonicalizationError::FloatRejected(f)) => assert_eq!(f, 1.5),
            other => panic!("expected FloatRejected, got {other:?}"),
        }
    }

    #[test]
    fn rejects_deeply_nested_floats() {
        let data = serde_json::json!({"a": {"b": [{"c": 3.14}]}});
        assert!(CanonicalBytes::new(&data).is_err());
    }

    #[test]
    fn accepts_integers_and_negatives() {
        let data = serde_json::json!({"amount": 42, "delta": -7});
        assert_eq!(canonical_str(&data), r#"{"amount":42,"delta":-7}"#);
    }

    #[test]
    fn accepts_large_integers() {
        let data = serde_json::json!({"val": 9999999999i64});
        assert_eq!(canonical_str(&data), r#"{"val":9999999999}"#);
    }

    #[test]
    fn passes_through_null_and_bools() {
        let data = serde_json::json!({"flag": true, "other": false, "nothing": null});
        assert_eq!(
            canonical_str(&data),
            r#"{"flag":true,"nothing":null,"other":false}"#
        );
    }

    #[test]
    fn empty_containers() {
        assert_eq!(canonical_str(&serde_json::json!({})), "{}");
        assert_eq!(canonical_str(&serde_json::json!([])), "[]");
    }

    #[test]
    fn unicode_passes_through_unescaped() {
        let data = serde_json::json!({"name": "\u{00e9}\u{00e8}"});
        let s = canonical_str(&data);
        assert!(s.contains('\u{00e9}'));
    }
}
