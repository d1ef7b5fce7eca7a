//! Per-run protocol settings.

use crate::errors::{MuSigError, Result};
use serde::{Deserialize, Serialize};

/// Number of nonces each signer commits to when nothing else is configured.
pub const DEFAULT_NONCE_COUNT: usize = 2;

/// What to do when the same public key appears more than once in a signer set.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Every occurrence participates as an independent signer.
    #[default]
    Allow,
    /// Key aggregation fails with `DuplicatePublicKey`.
    Reject,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct MuSigConfig {
    /// ν, the number of nonces per signer per run.
    pub nonce_count: usize,
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl Default for MuSigConfig {
    fn default() -> Self {
        MuSigConfig {
            nonce_count: DEFAULT_NONCE_COUNT,
            duplicate_keys: DuplicateKeyPolicy::Allow,
        }
    }
}

impl MuSigConfig {
    pub fn validate(&self) -> Result<()> {
        if self.nonce_count == 0 {
            return Err(MuSigError::InvalidNonceCount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MuSigConfig::default();
        assert_eq!(config.nonce_count, 2);
        assert_eq!(config.duplicate_keys, DuplicateKeyPolicy::Allow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: MuSigConfig = serde_json::from_str(r#"{"duplicate_keys":"reject"}"#).unwrap();
        assert_eq!(config.nonce_count, DEFAULT_NONCE_COUNT);
        assert_eq!(config.duplicate_keys, DuplicateKeyPolicy::Reject);
    }

    #[test]
    fn test_zero_nonce_count_rejected() {
        let config = MuSigConfig {
            nonce_count: 0,
            ..MuSigConfig::default()
        };
        assert_eq!(config.validate(), Err(MuSigError::InvalidNonceCount));
    }
}
