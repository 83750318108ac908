//! License Manager - the main public API for Tierlock.
//!
//! The `LicenseManager` is the only component callers need:
//! - Activation against the license server
//! - Verified reads of the local entitlement record
//! - Free and trial state issuance
//! - Deactivation

use crate::client::http::GumroadClient;
use crate::client::RemoteValidator;
use crate::clock::{Clock, SystemClock};
use crate::config::TierlockConfig;
use crate::crypto::keys::{KeyProvider, MachineKey};
use crate::crypto::signing::hash_license_key;
use crate::state::envelope::Envelope;
use crate::state::model::{ActivationResult, LicenseInfo, LicenseState, PaidTier};
use crate::state::store::StateStore;
use crate::TierlockError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Main license manager for Tierlock.
///
/// Holds no global state: the config directory and every collaborator are
/// passed in, so independent instances never share a license file unless
/// they are pointed at the same directory.
pub struct LicenseManager {
    config: TierlockConfig,
    store: StateStore,
    validator: Box<dyn RemoteValidator>,
    keys: Box<dyn KeyProvider>,
    clock: Arc<dyn Clock>,
}

impl LicenseManager {
    /// Create a license manager storing state in `config_dir`.
    ///
    /// Uses the system clock, a machine-derived signing key, and the HTTP
    /// license server client.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - HTTP client creation fails
    pub fn new(
        config: TierlockConfig,
        config_dir: impl Into<PathBuf>,
    ) -> Result<Self, TierlockError> {
        config.validate()?;
        let validator = GumroadClient::new(&config)?;
        let keys = MachineKey::new(config.app_name);
        Ok(Self::build(
            config,
            config_dir.into(),
            Box::new(validator),
            Box::new(keys),
            Arc::new(SystemClock),
        ))
    }

    /// Create a license manager in the per-user config directory.
    ///
    /// State lives under `dirs::config_dir()/<app_name>/`.
    pub fn for_current_user(config: TierlockConfig) -> Result<Self, TierlockError> {
        config.validate()?;
        let config_dir = config.default_config_dir()?;
        Self::new(config, config_dir)
    }

    /// Create a license manager with every collaborator injected.
    pub fn with_components(
        config: TierlockConfig,
        config_dir: impl Into<PathBuf>,
        validator: Box<dyn RemoteValidator>,
        keys: Box<dyn KeyProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TierlockError> {
        config.validate()?;
        Ok(Self::build(config, config_dir.into(), validator, keys, clock))
    }

    fn build(
        config: TierlockConfig,
        config_dir: PathBuf,
        validator: Box<dyn RemoteValidator>,
        keys: Box<dyn KeyProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store: StateStore::new(config_dir),
            validator,
            keys,
            clock,
        }
    }

    /// Get the verified license state.
    ///
    /// Returns `Ok(None)` when no state has ever been saved.
    ///
    /// # Errors
    /// - `TamperedState` - the stored record does not match its signature
    /// - `CorruptedState` - the stored file is not a valid envelope
    /// - `StateIO` - the file could not be read
    pub fn get_state(&self) -> Result<Option<LicenseState>, TierlockError> {
        let Some(envelope) = self.store.load()? else {
            return Ok(None);
        };

        let key = self.keys.signing_key()?;
        match envelope.open(&key) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(path = %self.store.path().display(), error = %e, "license state rejected");
                Err(e)
            }
        }
    }

    /// Activate a license key with the license server.
    ///
    /// On success the new paid state replaces any previous state. Rejected
    /// keys and network failures come back as `success: false` and leave the
    /// existing state untouched.
    ///
    /// # Errors
    /// Only local failures to persist an accepted activation.
    pub fn activate(&self, license_key: &str) -> Result<ActivationResult, TierlockError> {
        let license_key = license_key.trim();
        if license_key.is_empty() {
            return Ok(ActivationResult::failed("License key cannot be empty"));
        }

        let key_id = hash_license_key(license_key);
        debug!(key = %key_id, "activating license");

        let response = match self.validator.verify(license_key) {
            Ok(response) => response,
            Err(e) => {
                warn!(key = %key_id, error = %e, "license server unavailable");
                return Ok(ActivationResult::failed(e.to_string()));
            }
        };

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "Invalid license key".to_string());
            info!(key = %key_id, reason = %reason, "license key rejected");
            return Ok(ActivationResult::failed(reason));
        }

        let state = LicenseState::paid(
            license_key,
            response.tier.unwrap_or(PaidTier::Commercial),
            response.email.unwrap_or_default(),
            self.clock.now_utc(),
            response.seats_total,
            response.seats_used,
        );
        self.save_state(&state)?;

        info!(key = %key_id, tier = %state.tier(), "license activated");
        Ok(ActivationResult::activated(&state))
    }

    /// Remove the local license state.
    ///
    /// Returns `true` when the state was removed or was already absent,
    /// `false` only if the filesystem refused the deletion.
    pub fn deactivate(&self) -> bool {
        match self.store.delete() {
            Ok(true) => {
                info!("license deactivated");
                true
            }
            Ok(false) => {
                debug!("no license state to deactivate");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to deactivate license");
                false
            }
        }
    }

    /// Get a flattened report of the current license.
    ///
    /// Adds `is_expired` and `days_remaining` evaluated now. Tamper and
    /// corruption errors propagate.
    pub fn get_license_info(&self) -> Result<Option<LicenseInfo>, TierlockError> {
        let now = self.clock.now_utc();
        Ok(self.get_state()?.map(|state| state.info(now)))
    }

    /// Issue and persist a free-tier state.
    pub fn create_free_tier_state(&self, email: &str) -> Result<LicenseState, TierlockError> {
        let state = LicenseState::free(email, self.clock.now_utc());
        self.save_state(&state)?;
        info!("free tier registered");
        Ok(state)
    }

    /// Issue and persist a trial state lasting `trial_days`.
    pub fn create_eval_state(&self, email: &str) -> Result<LicenseState, TierlockError> {
        let state = LicenseState::trial(email, self.clock.now_utc(), self.config.trial_days)?;
        self.save_state(&state)?;
        info!(days = self.config.trial_days, "trial started");
        Ok(state)
    }

    /// Sign and persist a state, replacing whatever was stored.
    pub fn save_state(&self, state: &LicenseState) -> Result<(), TierlockError> {
        let key = self.keys.signing_key()?;
        let envelope = Envelope::seal(state, &key)?;
        self.store.save(&envelope)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &TierlockConfig {
        &self.config
    }

    /// Directory holding the license file.
    pub fn config_dir(&self) -> &Path {
        self.store.config_dir()
    }
}
