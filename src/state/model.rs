//! License state, tiers, and the reporting structs handed to the CLI layer.
//!
//! On disk a state is one flat record:
//! ```text
//! {"license_key": "...", "tier": "trial", "email": "...",
//!  "created_at": "...", "expires_at": "..."}
//! ```
//! In memory the tier-specific fields live in [`Entitlement`], so a trial
//! always has an expiry and nothing else does.

use crate::TierlockError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel license key stored for free-tier states.
pub const FREE_LICENSE_KEY: &str = "FREE";

/// Sentinel license key stored for trial states.
pub const TRIAL_LICENSE_KEY: &str = "TRIAL";

/// Entitlement level reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Free registration, never expires.
    Free,
    /// Time-limited evaluation.
    Trial,
    /// Paid standard tier.
    Standard,
    /// Paid commercial tier.
    Commercial,
    /// Paid enterprise tier.
    Enterprise,
}

impl Tier {
    /// Wire name of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Trial => "trial",
            Tier::Standard => "standard",
            Tier::Commercial => "commercial",
            Tier::Enterprise => "enterprise",
        }
    }

    /// Whether this tier comes from a purchased key.
    pub fn is_paid(&self) -> bool {
        matches!(self, Tier::Standard | Tier::Commercial | Tier::Enterprise)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "trial" => Ok(Tier::Trial),
            "standard" => Ok(Tier::Standard),
            "commercial" => Ok(Tier::Commercial),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(format!("unknown tier: {:?}", other)),
        }
    }
}

/// Tiers that can only be reached through remote activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaidTier {
    /// Standard tier.
    Standard,
    /// Commercial tier.
    Commercial,
    /// Enterprise tier.
    Enterprise,
}

impl From<PaidTier> for Tier {
    fn from(tier: PaidTier) -> Self {
        match tier {
            PaidTier::Standard => Tier::Standard,
            PaidTier::Commercial => Tier::Commercial,
            PaidTier::Enterprise => Tier::Enterprise,
        }
    }
}

impl TryFrom<Tier> for PaidTier {
    type Error = String;

    fn try_from(tier: Tier) -> Result<Self, Self::Error> {
        match tier {
            Tier::Standard => Ok(PaidTier::Standard),
            Tier::Commercial => Ok(PaidTier::Commercial),
            Tier::Enterprise => Ok(PaidTier::Enterprise),
            other => Err(format!("{} is not a paid tier", other)),
        }
    }
}

/// Tier-specific part of a license state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entitlement {
    /// Free tier.
    Free,
    /// Trial that ends at `expires_at`.
    Trial {
        /// End of the trial window.
        expires_at: DateTime<Utc>,
    },
    /// Purchased tier with seat counts reported by the license server.
    Paid {
        /// Purchased tier.
        tier: PaidTier,
        /// Seats purchased, if reported.
        seats_total: Option<u32>,
        /// Seats in use, if reported.
        seats_used: Option<u32>,
    },
}

impl Entitlement {
    /// The reporting tier for this entitlement.
    pub fn tier(&self) -> Tier {
        match self {
            Entitlement::Free => Tier::Free,
            Entitlement::Trial { .. } => Tier::Trial,
            Entitlement::Paid { tier, .. } => (*tier).into(),
        }
    }
}

/// The entitlement record persisted for this installation.
///
/// Replaced wholesale on every write; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StateRecord", into = "StateRecord")]
pub struct LicenseState {
    license_key: String,
    email: String,
    created_at: DateTime<Utc>,
    entitlement: Entitlement,
}

impl LicenseState {
    /// Free-tier state issued at `now`.
    pub fn free(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            license_key: FREE_LICENSE_KEY.to_string(),
            email: email.into(),
            created_at: now,
            entitlement: Entitlement::Free,
        }
    }

    /// Trial state issued at `now`, expiring `trial_days` later.
    ///
    /// # Errors
    /// `ConfigError` when the expiry falls outside the representable date range.
    pub fn trial(
        email: impl Into<String>,
        now: DateTime<Utc>,
        trial_days: i64,
    ) -> Result<Self, TierlockError> {
        let expires_at = Duration::try_days(trial_days)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                TierlockError::ConfigError(format!(
                    "trial of {} days overflows the expiry date",
                    trial_days
                ))
            })?;

        Ok(Self {
            license_key: TRIAL_LICENSE_KEY.to_string(),
            email: email.into(),
            created_at: now,
            entitlement: Entitlement::Trial { expires_at },
        })
    }

    /// Paid state for an activated license key.
    pub fn paid(
        license_key: impl Into<String>,
        tier: PaidTier,
        email: impl Into<String>,
        now: DateTime<Utc>,
        seats_total: Option<u32>,
        seats_used: Option<u32>,
    ) -> Self {
        Self {
            license_key: license_key.into(),
            email: email.into(),
            created_at: now,
            entitlement: Entitlement::Paid {
                tier,
                seats_total,
                seats_used,
            },
        }
    }

    /// Trial state with explicit bounds, for states that started in the past.
    pub fn trial_between(
        email: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            license_key: TRIAL_LICENSE_KEY.to_string(),
            email: email.into(),
            created_at,
            entitlement: Entitlement::Trial { expires_at },
        }
    }

    /// License key, or the tier sentinel for free and trial states.
    pub fn license_key(&self) -> &str {
        &self.license_key
    }

    /// Registrant contact address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// When this state was issued.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Tier-specific data.
    pub fn entitlement(&self) -> &Entitlement {
        &self.entitlement
    }

    /// Reporting tier.
    pub fn tier(&self) -> Tier {
        self.entitlement.tier()
    }

    /// Trial end, present only for trial states.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self.entitlement {
            Entitlement::Trial { expires_at } => Some(expires_at),
            _ => None,
        }
    }

    /// Seats purchased, paid tiers only.
    pub fn seats_total(&self) -> Option<u32> {
        match self.entitlement {
            Entitlement::Paid { seats_total, .. } => seats_total,
            _ => None,
        }
    }

    /// Seats in use, paid tiers only.
    pub fn seats_used(&self) -> Option<u32> {
        match self.entitlement {
            Entitlement::Paid { seats_used, .. } => seats_used,
            _ => None,
        }
    }

    /// Seats still free, when both counts are known.
    pub fn seats_available(&self) -> Option<u32> {
        Some(self.seats_total()?.saturating_sub(self.seats_used()?))
    }

    /// True iff this is a trial and `now` has reached its expiry.
    ///
    /// Free and paid tiers never expire through this mechanism.
    pub fn is_trial_expired(&self, now: DateTime<Utc>) -> bool {
        match self.entitlement {
            Entitlement::Trial { expires_at } => now >= expires_at,
            _ => false,
        }
    }

    /// Whole days left before expiry, floored at zero.
    ///
    /// Partial days are truncated: a trial with 4 days 23 hours left
    /// reports 4. Existing trial-length expectations depend on this.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let expires_at = self.expires_at()?;
        Some(expires_at.signed_duration_since(now).num_days().max(0))
    }

    /// Flatten into the reporting structure evaluated at `now`.
    pub fn info(&self, now: DateTime<Utc>) -> LicenseInfo {
        LicenseInfo {
            tier: self.tier(),
            email: self.email.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at(),
            days_remaining: self.days_remaining(now),
            is_expired: self.is_trial_expired(now),
            seats_total: self.seats_total(),
            seats_used: self.seats_used(),
        }
    }
}

/// Flat on-disk shape of [`LicenseState`].
///
/// Field names are a compatibility contract with existing installs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateRecord {
    license_key: String,
    tier: Tier,
    email: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seats_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seats_used: Option<u32>,
}

impl From<LicenseState> for StateRecord {
    fn from(state: LicenseState) -> Self {
        let tier = state.tier();
        let (expires_at, seats_total, seats_used) = match state.entitlement {
            Entitlement::Free => (None, None, None),
            Entitlement::Trial { expires_at } => (Some(expires_at), None, None),
            Entitlement::Paid {
                seats_total,
                seats_used,
                ..
            } => (None, seats_total, seats_used),
        };

        Self {
            license_key: state.license_key,
            tier,
            email: state.email,
            created_at: state.created_at,
            expires_at,
            seats_total,
            seats_used,
        }
    }
}

impl TryFrom<StateRecord> for LicenseState {
    type Error = String;

    fn try_from(record: StateRecord) -> Result<Self, Self::Error> {
        let has_seats = record.seats_total.is_some() || record.seats_used.is_some();

        let entitlement = match record.tier {
            Tier::Trial => {
                if has_seats {
                    return Err("trial state cannot carry seat counts".to_string());
                }
                let expires_at = record
                    .expires_at
                    .ok_or_else(|| "trial state is missing expires_at".to_string())?;
                Entitlement::Trial { expires_at }
            }
            tier => {
                if record.expires_at.is_some() {
                    return Err(format!("{} state cannot carry expires_at", tier));
                }
                match PaidTier::try_from(tier) {
                    Ok(paid) => Entitlement::Paid {
                        tier: paid,
                        seats_total: record.seats_total,
                        seats_used: record.seats_used,
                    },
                    Err(_) if has_seats => {
                        return Err("free state cannot carry seat counts".to_string());
                    }
                    Err(_) => Entitlement::Free,
                }
            }
        };

        Ok(Self {
            license_key: record.license_key,
            email: record.email,
            created_at: record.created_at,
            entitlement,
        })
    }
}

/// Reporting view of the current license for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    /// Current tier.
    pub tier: Tier,
    /// Registrant contact address.
    pub email: String,
    /// When the state was issued.
    pub created_at: DateTime<Utc>,
    /// Trial end, `null` for tiers that do not expire.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whole days left, `null` for tiers that do not expire.
    pub days_remaining: Option<i64>,
    /// Whether a trial has run out.
    pub is_expired: bool,
    /// Seats purchased, paid tiers only.
    pub seats_total: Option<u32>,
    /// Seats in use, paid tiers only.
    pub seats_used: Option<u32>,
}

/// Outcome of an activation attempt. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationResult {
    /// Whether the key was accepted and state saved.
    pub success: bool,
    /// Reason for failure; present iff `success` is false.
    pub error: Option<String>,
    /// Activated tier.
    pub tier: Option<Tier>,
    /// Registrant address returned by the license server.
    pub email: Option<String>,
    /// Seats purchased.
    pub seats_total: Option<u32>,
    /// Seats in use.
    pub seats_used: Option<u32>,
}

impl ActivationResult {
    /// Successful activation that produced `state`.
    pub fn activated(state: &LicenseState) -> Self {
        Self {
            success: true,
            error: None,
            tier: Some(state.tier()),
            email: Some(state.email().to_string()),
            seats_total: state.seats_total(),
            seats_used: state.seats_used(),
        }
    }

    /// Failed activation with a user-facing reason.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            tier: None,
            email: None,
            seats_total: None,
            seats_used: None,
        }
    }
}
