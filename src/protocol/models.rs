//! License server response structs and normalization.

use crate::state::model::PaidTier;
use crate::TierlockError;
use serde::Deserialize;

/// Raw response from the `licenses/verify` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    /// Whether the key exists for the product.
    pub success: bool,
    /// Server explanation when `success` is false.
    #[serde(default)]
    pub message: Option<String>,
    /// Activation count for this key.
    #[serde(default)]
    pub uses: Option<u32>,
    /// Purchase details on success.
    #[serde(default)]
    pub purchase: Option<Purchase>,
}

/// Purchase record attached to a successful verification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Purchase {
    /// Purchaser address.
    #[serde(default)]
    pub email: Option<String>,
    /// Purchase was refunded.
    #[serde(default)]
    pub refunded: bool,
    /// Purchase is under dispute.
    #[serde(default)]
    pub disputed: bool,
    /// Purchase was charged back.
    #[serde(default)]
    pub chargebacked: bool,
    /// Seats bought.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Variant label, e.g. "(Enterprise)".
    #[serde(default)]
    pub variants: Option<String>,
}

/// Normalized answer from any remote validator.
///
/// A rejected key is a normal outcome (`success: false` with `error`),
/// not an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorResponse {
    /// Whether the key was accepted.
    pub success: bool,
    /// Purchased tier on success.
    pub tier: Option<PaidTier>,
    /// Purchaser address on success.
    pub email: Option<String>,
    /// Seats purchased.
    pub seats_total: Option<u32>,
    /// Seats in use, counting this activation.
    pub seats_used: Option<u32>,
    /// Rejection reason.
    pub error: Option<String>,
}

impl ValidatorResponse {
    /// Accepted key.
    pub fn accepted(
        tier: PaidTier,
        email: impl Into<String>,
        seats_total: Option<u32>,
        seats_used: Option<u32>,
    ) -> Self {
        Self {
            success: true,
            tier: Some(tier),
            email: Some(email.into()),
            seats_total,
            seats_used,
            error: None,
        }
    }

    /// Rejected key.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tier: None,
            email: None,
            seats_total: None,
            seats_used: None,
            error: Some(error.into()),
        }
    }
}

impl VerifyResponse {
    /// Map the raw server answer onto a [`ValidatorResponse`].
    pub fn normalize(&self) -> ValidatorResponse {
        if !self.success {
            return ValidatorResponse::rejected(
                self.message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Invalid license key".to_string()),
            );
        }

        let purchase = self.purchase.clone().unwrap_or_default();
        if purchase.refunded {
            return ValidatorResponse::rejected("License has been refunded");
        }
        if purchase.disputed || purchase.chargebacked {
            return ValidatorResponse::rejected("License is disputed");
        }

        ValidatorResponse::accepted(
            tier_from_variants(purchase.variants.as_deref()),
            purchase.email.unwrap_or_default(),
            purchase.quantity,
            self.uses,
        )
    }
}

/// Pick the paid tier named in a purchase's variant string.
///
/// Unlabelled purchases are commercial.
pub fn tier_from_variants(variants: Option<&str>) -> PaidTier {
    let variants = variants.unwrap_or_default().to_ascii_lowercase();
    if variants.contains("enterprise") {
        PaidTier::Enterprise
    } else if variants.contains("standard") {
        PaidTier::Standard
    } else {
        PaidTier::Commercial
    }
}

/// Parse raw JSON body into a verify response.
pub fn parse_verify_response(body: &[u8]) -> Result<VerifyResponse, TierlockError> {
    serde_json::from_slice(body).map_err(|e| {
        TierlockError::ProtocolError(format!("Invalid response from license server: {}", e))
    })
}
