//! Proxy configuration
//!
//! Loaded from TOML or built in code. The two policy flags settle behavior the base protocol
//! leaves open: whether the owner reads without being whitelisted, and whether the owner may
//! reassign the whitelist maintainer.

use crate::error::ConfigError;
use feedgate_types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Proxy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Initial owner
    pub owner: Address,
    /// Initial whitelist maintainer (defaults to the owner)
    #[serde(default)]
    pub maintainer: Option<Address>,
    /// Owner may read without being whitelisted
    #[serde(default)]
    pub owner_bypasses_whitelist: bool,
    /// Owner may call `set_whitelist_maintainer`
    #[serde(default = "default_true")]
    pub allow_maintainer_reassignment: bool,
    /// Audit journal capacity (0 = unbounded)
    #[serde(default)]
    pub journal_capacity: usize,
}

fn default_true() -> bool {
    true
}

impl ProxyConfig {
    /// Create default configuration for `owner`
    #[inline]
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            maintainer: None,
            owner_bypasses_whitelist: false,
            allow_maintainer_reassignment: true,
            journal_capacity: 0,
        }
    }

    /// With a maintainer distinct from the owner
    #[inline]
    #[must_use]
    pub fn with_maintainer(mut self, maintainer: Address) -> Self {
        self.maintainer = Some(maintainer);
        self
    }

    /// With owner whitelist bypass
    #[inline]
    #[must_use]
    pub fn with_owner_bypass(mut self, enabled: bool) -> Self {
        self.owner_bypasses_whitelist = enabled;
        self
    }

    /// With maintainer reassignment policy
    #[inline]
    #[must_use]
    pub fn with_maintainer_reassignment(mut self, enabled: bool) -> Self {
        self.allow_maintainer_reassignment = enabled;
        self
    }

    /// With bounded audit journal
    #[inline]
    #[must_use]
    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity;
        self
    }

    /// Effective initial maintainer
    #[inline]
    #[must_use]
    pub fn initial_maintainer(&self) -> Address {
        self.maintainer.unwrap_or(self.owner)
    }

    /// Check constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_zero() {
            return Err(ConfigError::Invalid("owner must not be the zero address".into()));
        }
        if self.maintainer.is_some_and(|m| m.is_zero()) {
            return Err(ConfigError::Invalid(
                "maintainer must not be the zero address".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), owner = %config.owner, "loaded proxy config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0x00000000000000000000000000000000000000aa";

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ProxyConfig::from_toml_str(&format!("owner = \"{OWNER}\"")).unwrap();
        assert_eq!(config, ProxyConfig::new(OWNER.parse().unwrap()));
        assert_eq!(config.initial_maintainer(), config.owner);
        assert!(config.allow_maintainer_reassignment);
        assert!(!config.owner_bypasses_whitelist);
    }

    #[test]
    fn full_toml() {
        let text = format!(
            r#"
owner = "{OWNER}"
maintainer = "0x00000000000000000000000000000000000000bb"
owner_bypasses_whitelist = true
allow_maintainer_reassignment = false
journal_capacity = 64
"#
        );
        let config = ProxyConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.initial_maintainer(), Address::from_low_u64(0xbb));
        assert!(config.owner_bypasses_whitelist);
        assert!(!config.allow_maintainer_reassignment);
        assert_eq!(config.journal_capacity, 64);
    }

    #[test]
    fn rejects_zero_owner() {
        let text = "owner = \"0x0000000000000000000000000000000000000000\"";
        assert!(matches!(
            ProxyConfig::from_toml_str(text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        let text = format!("owner = \"{OWNER}\"\nowner_is_whitelisted = true");
        assert!(matches!(
            ProxyConfig::from_toml_str(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(ProxyConfig::from_toml_str("owner = \"0x12\"").is_err());
    }
}
