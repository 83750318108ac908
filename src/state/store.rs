//! File-based state store with atomic writes.
//!
//! Holds at most one envelope at `<config_dir>/.license`.
//! Each write goes to its own temp file in the same directory and is then
//! renamed over the license file. There is no cross-process lock: concurrent
//! writers resolve as last-writer-wins.

use crate::state::envelope::Envelope;
use crate::TierlockError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File name of the persisted envelope inside the config directory.
pub const LICENSE_FILE_NAME: &str = ".license";

/// Persistence for the single license envelope of an installation.
#[derive(Debug, Clone)]
pub struct StateStore {
    /// Directory holding the license file.
    config_dir: PathBuf,
}

impl StateStore {
    /// Create a store rooted at `config_dir`.
    ///
    /// The directory is created lazily on first save.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Directory holding the license file.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the license file.
    pub fn path(&self) -> PathBuf {
        self.config_dir.join(LICENSE_FILE_NAME)
    }

    /// Load the envelope.
    ///
    /// Returns `Ok(None)` when no license file exists.
    pub fn load(&self) -> Result<Option<Envelope>, TierlockError> {
        let path = self.path();

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TierlockError::io("Failed to read license file", e)),
        };

        let envelope = Envelope::from_json(&json)?;
        Ok(Some(envelope))
    }

    /// Save the envelope atomically, replacing any previous one.
    pub fn save(&self, envelope: &Envelope) -> Result<(), TierlockError> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| TierlockError::io("Failed to create config dir", e))?;

        let json = envelope.to_json()?;

        // Dropping the temp file on any error path removes it.
        let temp = write_synced(&self.config_dir, json.as_bytes())
            .map_err(|e| TierlockError::io("Failed to write temp file", e))?;

        temp.persist(self.path())
            .map_err(|e| TierlockError::io("Failed to rename license file", e.error))?;

        debug!(path = %self.path().display(), "license state written");
        Ok(())
    }

    /// Delete the envelope.
    ///
    /// Returns whether a file was removed; deleting an absent file is not an error.
    pub fn delete(&self) -> Result<bool, TierlockError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(TierlockError::io("Failed to delete license file", e)),
        }
    }
}

/// Write and fsync a uniquely named temp file inside `dir`.
///
/// The file is readable only by the owner.
fn write_synced(dir: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut temp = tempfile::Builder::new()
        .prefix(LICENSE_FILE_NAME)
        .suffix(".tmp")
        .tempfile_in(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}
