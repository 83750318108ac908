//! # Tierlock
//!
//! **Offline license activation and tamper-evident entitlement state for CLI products.**
//!
//! Tierlock decides which tier a machine is entitled to (free, trial,
//! standard, commercial, enterprise), enforces trial expiry, and keeps the
//! local entitlement record signed so that hand-editing it is detected.
//!
//! ## Features
//!
//! - **Signed local state**: the record is HMAC-SHA256 signed with a machine-local key
//! - **Fail-closed reads**: a mismatched signature is an error, never a silent downgrade
//! - **Atomic persistence**: temp file + rename, one record per installation
//! - **Activation that never destroys state**: rejected keys and network failures leave the existing record alone
//! - **Trial bookkeeping**: expiry and whole-day countdown against an injectable clock
//!
//! ## Quickstart
//!
//! ```no_run
//! use tierlock::{LicenseManager, TierlockConfig};
//!
//! fn main() -> Result<(), tierlock::TierlockError> {
//!     let config = TierlockConfig::new("myapp", "your-product-id");
//!     let manager = LicenseManager::for_current_user(config)?;
//!
//!     match manager.get_license_info()? {
//!         Some(info) if info.is_expired => println!("Trial expired"),
//!         Some(info) => println!("Licensed: {} ({})", info.tier, info.email),
//!         None => {
//!             let result = manager.activate("LICENSE-KEY-HERE")?;
//!             if !result.success {
//!                 eprintln!("Activation failed: {}", result.error.unwrap_or_default());
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Tierlock detects:
//! - **Hand-edited state**: changing any field (e.g. `trial` to `enterprise`) breaks the signature
//! - **Copied state**: a record signed on another machine fails verification
//!
//! Tierlock does **not** resist a determined attacker: the signing key is
//! derivable on the machine. The real enforcement point is the license
//! server at activation time.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Local state layer
pub mod state;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Manager (main public API)
pub mod manager;

// Re-exports for public API
pub use client::RemoteValidator;
pub use clock::{Clock, SystemClock};
pub use config::{TierlockConfig, TRIAL_DAYS};
pub use crypto::keys::{KeyProvider, MachineKey, StaticKey};
pub use errors::TierlockError;
pub use manager::LicenseManager;
pub use protocol::models::ValidatorResponse;
pub use state::model::{
    ActivationResult, Entitlement, LicenseInfo, LicenseState, PaidTier, Tier, FREE_LICENSE_KEY,
    TRIAL_LICENSE_KEY,
};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
