//! # Canonical Encoder Service
//!
//! Implements [`CanonicalEncoderApi`] on top of the domain parser and
//! printer.

use tracing::trace;

use crate::domain::errors::CanonicalError;
use crate::domain::parser::{self, DEFAULT_MAX_DEPTH};
use crate::domain::v8;
use crate::domain::value::JsonObject;
use crate::ports::inbound::CanonicalEncoderApi;

/// Canonical JSON encoder.
#[derive(Debug, Clone)]
pub struct CanonicalEncoder {
    max_depth: usize,
}

impl CanonicalEncoder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalEncoderApi for CanonicalEncoder {
    fn canonicalize(&self, raw: &[u8]) -> Result<Vec<u8>, CanonicalError> {
        let obj = self.parse_object(raw)?;
        Ok(obj.to_canonical_bytes())
    }

    fn parse_object(&self, raw: &[u8]) -> Result<JsonObject, CanonicalError> {
        parser::parse_object(raw, self.max_depth).inspect_err(|e| {
            trace!(error = %e, len = raw.len(), "rejected json input");
        })
    }

    fn internal_v8_binary(&self, canonical: &[u8]) -> Vec<u8> {
        v8::internal_v8_binary(canonical)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::from(n)),
            (-1.0e30f64..1.0e30f64).prop_map(|f| Value::from(f)),
            ".*".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..6).prop_map(|pairs| {
                    Value::Object(pairs.into_iter().collect())
                }),
            ]
        })
    }

    fn arb_object() -> impl Strategy<Value = Value> {
        prop::collection::vec(("[a-zA-Z0-9_]{1,8}", arb_json()), 0..8)
            .prop_map(|pairs| Value::Object(pairs.into_iter().collect()))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn canonicalize_is_idempotent(value in arb_object()) {
            let encoder = CanonicalEncoder::new();
            let raw = serde_json::to_vec(&value).unwrap();
            let once = encoder.canonicalize(&raw).unwrap();
            let twice = encoder.canonicalize(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn canonical_output_is_valid_json(value in arb_object()) {
            let encoder = CanonicalEncoder::new();
            let raw = serde_json::to_vec(&value).unwrap();
            let once = encoder.canonicalize(&raw).unwrap();
            prop_assert!(serde_json::from_slice::<Value>(&once).is_ok());
        }
    }
}
