//! Tierlock configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default trial window in days.
pub const TRIAL_DAYS: i64 = 7;

/// Longest trial window accepted by [`TierlockConfig::validate`].
pub const MAX_TRIAL_DAYS: i64 = 36_500;

/// Default license server endpoint.
pub const DEFAULT_VERIFY_URL: &str = "https://api.gumroad.com/v2/licenses/verify";

/// Configuration for license activation and local state.
///
/// Product constants are `&'static str` so they are compiled into the
/// binary rather than read from the environment.
#[derive(Debug, Clone)]
pub struct TierlockConfig {
    /// Application name (e.g., "ccp"). Also names the per-user config directory.
    pub app_name: &'static str,

    /// Product identifier sent to the license server.
    pub product_id: &'static str,

    /// License verification endpoint (`http` or `https`).
    pub verify_url: &'static str,

    /// User-Agent product identifier (e.g., "ccp-installer").
    pub user_agent_product: &'static str,

    /// Length of the evaluation window for trial states.
    pub trial_days: i64,

    /// Timeout for a single verification request.
    pub request_timeout: Duration,
}

impl TierlockConfig {
    /// Configuration with the default endpoint, trial window and timeout.
    pub fn new(app_name: &'static str, product_id: &'static str) -> Self {
        Self {
            app_name,
            product_id,
            verify_url: DEFAULT_VERIFY_URL,
            user_agent_product: app_name,
            trial_days: TRIAL_DAYS,
            request_timeout: Duration::from_secs(15),
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::TierlockError> {
        if self.app_name.is_empty() {
            return Err(crate::TierlockError::ConfigError(
                "app_name cannot be empty".to_string(),
            ));
        }
        if self.product_id.is_empty() {
            return Err(crate::TierlockError::ConfigError(
                "product_id cannot be empty".to_string(),
            ));
        }
        if !(self.verify_url.starts_with("https://") || self.verify_url.starts_with("http://")) {
            return Err(crate::TierlockError::ConfigError(format!(
                "verify_url must be an http(s) URL, got {:?}",
                self.verify_url
            )));
        }
        if self.trial_days <= 0 || self.trial_days > MAX_TRIAL_DAYS {
            return Err(crate::TierlockError::ConfigError(format!(
                "trial_days must be between 1 and {}, got {}",
                MAX_TRIAL_DAYS, self.trial_days
            )));
        }
        Ok(())
    }

    /// Per-user config directory for this application.
    ///
    /// Resolves to `dirs::config_dir()/<app_name>/`.
    pub fn default_config_dir(&self) -> Result<PathBuf, crate::TierlockError> {
        dirs::config_dir()
            .map(|base| base.join(self.app_name))
            .ok_or_else(|| {
                crate::TierlockError::ConfigError("Could not find config directory".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TierlockError;

    #[test]
    fn test_defaults_validate() {
        let config = TierlockConfig::new("ccp", "product-123");
        assert!(config.validate().is_ok());
        assert_eq!(config.trial_days, TRIAL_DAYS);
        assert_eq!(config.verify_url, DEFAULT_VERIFY_URL);
        assert_eq!(config.user_agent_product, "ccp");
    }

    #[test]
    fn test_empty_app_name() {
        let config = TierlockConfig::new("", "product-123");
        assert!(matches!(config.validate(), Err(TierlockError::ConfigError(_))));
    }

    #[test]
    fn test_empty_product_id() {
        let config = TierlockConfig::new("ccp", "");
        assert!(matches!(config.validate(), Err(TierlockError::ConfigError(_))));
    }

    #[test]
    fn test_bad_verify_url() {
        let mut config = TierlockConfig::new("ccp", "product-123");
        config.verify_url = "ftp://licenses.example.com";
        assert!(matches!(config.validate(), Err(TierlockError::ConfigError(_))));
    }

    #[test]
    fn test_non_positive_trial_days() {
        let mut config = TierlockConfig::new("ccp", "product-123");
        config.trial_days = 0;
        assert!(matches!(config.validate(), Err(TierlockError::ConfigError(_))));
    }

    #[test]
    fn test_trial_days_upper_bound() {
        let mut config = TierlockConfig::new("ccp", "product-123");
        config.trial_days = MAX_TRIAL_DAYS;
        assert!(config.validate().is_ok());

        config.trial_days = 200_000_000;
        assert!(matches!(config.validate(), Err(TierlockError::ConfigError(_))));
    }
}
