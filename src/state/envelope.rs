//! Signed envelope persisted for a license state.
//!
//! ```text
//! {"state": {...LicenseState fields...}, "signature": "<hex hmac>"}
//! ```
//!
//! The signature covers the canonical bytes of `state`: compact JSON with
//! keys sorted. On open we:
//! 1. Recompute the signature over `state` exactly as read (required)
//! 2. Only then decode `state` into a [`LicenseState`]
//!
//! Changing the canonical form invalidates every existing install.

use crate::crypto::signing::{sign, verify};
use crate::state::model::LicenseState;
use crate::TierlockError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Signed license state as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Serialized license state fields.
    pub state: Map<String, Value>,

    /// Lowercase hex HMAC-SHA256 over the canonical state bytes.
    pub signature: String,
}

impl Envelope {
    /// Serialize and sign a state.
    pub fn seal(state: &LicenseState, key: &[u8]) -> Result<Self, TierlockError> {
        let fields = match serde_json::to_value(state) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(TierlockError::CorruptedState(format!(
                    "state serialized to non-object: {}",
                    other
                )))
            }
            Err(e) => {
                return Err(TierlockError::CorruptedState(format!(
                    "Failed to serialize state: {}",
                    e
                )))
            }
        };

        let signature = sign(key, &canonical_bytes(&fields)?)?;
        Ok(Self {
            state: fields,
            signature,
        })
    }

    /// Verify the signature, then decode the state.
    ///
    /// # Errors
    /// - `TamperedState` - signature does not match the stored fields
    /// - `CorruptedState` - signature matches but the fields are not a valid state
    pub fn open(&self, key: &[u8]) -> Result<LicenseState, TierlockError> {
        let canonical = canonical_bytes(&self.state)?;
        if !verify(key, &canonical, &self.signature) {
            return Err(TierlockError::TamperedState);
        }

        serde_json::from_value(Value::Object(self.state.clone()))
            .map_err(|e| TierlockError::CorruptedState(format!("Invalid state fields: {}", e)))
    }

    /// Serialize the envelope to JSON.
    pub fn to_json(&self) -> Result<String, TierlockError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TierlockError::CorruptedState(format!("Failed to serialize envelope: {}", e)))
    }

    /// Deserialize an envelope from JSON.
    ///
    /// Missing `state` or `signature` is corruption, not tampering.
    pub fn from_json(json: &str) -> Result<Self, TierlockError> {
        serde_json::from_str(json)
            .map_err(|e| TierlockError::CorruptedState(format!("Failed to parse envelope: {}", e)))
    }
}

/// Canonical signed bytes for a state object: compact JSON, keys sorted.
///
/// Sorting is explicit so the result does not depend on serde_json's
/// map ordering feature.
pub fn canonical_bytes(state: &Map<String, Value>) -> Result<Vec<u8>, TierlockError> {
    let sorted: BTreeMap<&String, &Value> = state.iter().collect();
    serde_json::to_vec(&sorted)
        .map_err(|e| TierlockError::CorruptedState(format!("Failed to canonicalize state: {}", e)))
}
