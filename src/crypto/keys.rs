//! Signing key providers.
//!
//! The key only has to be stable on one machine. It is derivable by anyone
//! with access to that machine.

use crate::TierlockError;
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::env;

/// Domain separator mixed into every derived key.
const KEY_SALT: &[u8] = b"tierlock/license-state/v1";

/// Supplies the secret used to sign and verify license state.
pub trait KeyProvider: Send + Sync {
    /// Return the signing key bytes.
    fn signing_key(&self) -> Result<Vec<u8>, TierlockError>;
}

/// Fixed key embedded at build time.
#[derive(Clone)]
pub struct StaticKey {
    key: Vec<u8>,
}

impl StaticKey {
    /// Wrap fixed key bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }
}

impl std::fmt::Debug for StaticKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKey").finish_non_exhaustive()
    }
}

impl KeyProvider for StaticKey {
    fn signing_key(&self) -> Result<Vec<u8>, TierlockError> {
        if self.key.is_empty() {
            return Err(TierlockError::ConfigError(
                "static signing key cannot be empty".to_string(),
            ));
        }
        Ok(self.key.clone())
    }
}

/// Key derived from stable identifiers of the current machine and user.
///
/// Derived on first use and cached for the lifetime of the provider.
pub struct MachineKey {
    app_name: String,
    derived: OnceCell<[u8; 32]>,
}

impl MachineKey {
    /// Create a provider scoped to an application name.
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            derived: OnceCell::new(),
        }
    }

    fn derive(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(KEY_SALT);
        for component in machine_components(&self.app_name) {
            hasher.update((component.len() as u64).to_be_bytes());
            hasher.update(component.as_bytes());
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        key
    }
}

impl std::fmt::Debug for MachineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineKey")
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl KeyProvider for MachineKey {
    fn signing_key(&self) -> Result<Vec<u8>, TierlockError> {
        Ok(self.derived.get_or_init(|| self.derive()).to_vec())
    }
}

/// Identifiers mixed into the machine key, in a fixed order.
fn machine_components(app_name: &str) -> Vec<String> {
    let mut ids = vec![
        app_name.to_string(),
        env::consts::OS.to_string(),
        env::consts::ARCH.to_string(),
    ];

    if let Some(machine_id) = machine_id() {
        ids.push(machine_id);
    }

    if let Ok(user) = env::var("USER").or_else(|_| env::var("USERNAME")) {
        ids.push(user);
    }

    ids
}

fn machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
