//! Shared helpers for license flow tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;
use tierlock::{
    LicenseManager, MockClock, PaidTier, RemoteValidator, StaticKey, TierlockConfig,
    TierlockError, ValidatorResponse,
};

/// Shared clock a test can move forward while the manager holds it.
pub fn clock_at(now: DateTime<Utc>) -> Arc<MockClock> {
    Arc::new(MockClock::new(now))
}

/// Validator answering every key from a fixed script.
pub enum ScriptedValidator {
    Accept {
        tier: PaidTier,
        email: &'static str,
        seats_total: Option<u32>,
        seats_used: Option<u32>,
    },
    Reject(&'static str),
    Unreachable,
}

impl RemoteValidator for ScriptedValidator {
    fn verify(&self, _license_key: &str) -> Result<ValidatorResponse, TierlockError> {
        match self {
            ScriptedValidator::Accept {
                tier,
                email,
                seats_total,
                seats_used,
            } => Ok(ValidatorResponse::accepted(
                *tier,
                *email,
                *seats_total,
                *seats_used,
            )),
            ScriptedValidator::Reject(reason) => Ok(ValidatorResponse::rejected(*reason)),
            ScriptedValidator::Unreachable => Err(TierlockError::ValidatorTransport(
                "Request failed: dns error".to_string(),
            )),
        }
    }
}

pub fn commercial() -> ScriptedValidator {
    ScriptedValidator::Accept {
        tier: PaidTier::Commercial,
        email: "buyer@example.com",
        seats_total: Some(5),
        seats_used: Some(1),
    }
}

pub fn fixed_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
}

pub const TEST_KEY: &[u8] = b"integration-test-signing-key";

/// Manager rooted at `dir` with a static key and the given collaborators.
pub fn manager(
    dir: &Path,
    validator: ScriptedValidator,
    clock: Arc<MockClock>,
) -> LicenseManager {
    LicenseManager::with_components(
        TierlockConfig::new("tierlock-it", "product-it"),
        dir,
        Box::new(validator),
        Box::new(StaticKey::new(TEST_KEY.to_vec())),
        clock,
    )
    .unwrap()
}
