//! HMAC-SHA256 signing of serialized license state.
//!
//! Signatures are lowercase hex of `HMAC-SHA256(key, canonical_bytes)`.
//! Verification recomputes the MAC and compares in constant time.

use crate::TierlockError;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Sign canonical state bytes with the local key.
pub fn sign(key: &[u8], canonical: &[u8]) -> Result<String, TierlockError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| TierlockError::KeyUnavailable(format!("Invalid HMAC key: {}", e)))?;
    mac.update(canonical);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex signature over canonical state bytes.
///
/// A signature that is not valid hex is a mismatch, not an error.
pub fn verify(key: &[u8], canonical: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(canonical);
    mac.verify_slice(&expected).is_ok()
}

/// Short SHA-256 fingerprint of a license key for logging.
///
/// Raw keys never reach log output.
pub fn hash_license_key(license_key: &str) -> String {
    let hash = Sha256::digest(license_key.as_bytes());
    hex::encode(&hash[..6])
}
