//! Remote license validation.

pub mod http;

use crate::protocol::models::ValidatorResponse;
use crate::TierlockError;

/// Exchanges a license key for tier, seat, and purchaser details.
///
/// `Err` is reserved for transport and protocol failures; a rejected key
/// is an `Ok` response with `success: false`. Implementations never touch
/// local state.
pub trait RemoteValidator: Send + Sync {
    /// Verify a license key with the license server.
    fn verify(&self, license_key: &str) -> Result<ValidatorResponse, TierlockError>;
}
