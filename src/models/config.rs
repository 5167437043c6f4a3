//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream roster and link settings
    #[serde(default)]
    pub roster: RosterConfig,

    /// Cache invalidation settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Tree normalization settings
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.roster.base_url)
            .map_err(|e| AppError::validation(format!("roster.base_url is invalid: {e}")))?;
        if self.roster.link_base.trim().is_empty() {
            return Err(AppError::validation("roster.link_base is empty"));
        }
        if self.roster.default_term.trim().is_empty() {
            return Err(AppError::validation("roster.default_term is empty"));
        }
        if self.roster.user_agent.trim().is_empty() {
            return Err(AppError::validation("roster.user_agent is empty"));
        }
        if self.roster.timeout_secs == 0 {
            return Err(AppError::validation("roster.timeout_secs must be > 0"));
        }
        if self.cache.period_secs == 0 {
            return Err(AppError::validation("cache.period_secs must be > 0"));
        }
        if self.normalize.attribute_key.is_empty() {
            return Err(AppError::validation("normalize.attribute_key is empty"));
        }
        Ok(())
    }
}

/// Upstream roster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Roster root; pages live at `{base_url}{term}/{subject}/xml/`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Term used when the caller does not name one
    #[serde(default = "defaults::default_term")]
    pub default_term: String,

    /// Prefix of the `json` link synthesized for each subject
    #[serde(default = "defaults::link_base")]
    pub link_base: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            default_term: defaults::default_term(),
            link_base: defaults::link_base(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// How cached documents expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Wipe the whole store every period
    #[default]
    WholeStore,
    /// Expire each entry one period after it was stored
    PerEntry,
}

/// Cache invalidation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub policy: CachePolicy,

    /// Invalidation period (or entry TTL) in seconds
    #[serde(default = "defaults::period")]
    pub period_secs: u64,
}

impl CacheConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::default(),
            period_secs: defaults::period(),
        }
    }
}

/// What a rename does when its destination field is already populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Fail the document
    #[default]
    Error,
    /// Keep the destination value and drop the source field
    KeepExisting,
    /// Replace the destination value with the source field
    Overwrite,
}

/// Tree normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Reserved key the parser stores XML attributes under
    #[serde(default = "defaults::attribute_key")]
    pub attribute_key: String,

    #[serde(default)]
    pub rename_collisions: CollisionPolicy,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            attribute_key: defaults::attribute_key(),
            rename_collisions: CollisionPolicy::default(),
        }
    }
}

mod defaults {
    // Roster defaults
    pub fn base_url() -> String {
        "http://registrar.sas.cornell.edu/courses/roster/".into()
    }
    pub fn default_term() -> String {
        "FA14".into()
    }
    pub fn link_base() -> String {
        "http://api-mrkev.rhcloud.com/redapi/roster?".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; roster/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Cache defaults
    pub fn period() -> u64 {
        24 * 60 * 60
    }

    // Normalize defaults
    pub fn attribute_key() -> String {
        "$".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.roster.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.roster.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_period() {
        let mut config = Config::default();
        config.cache.period_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[roster]\ndefault_term = \"SP15\"\n\n[cache]\npolicy = \"per-entry\"\n\n[normalize]\nrename_collisions = \"keep-existing\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.roster.default_term, "SP15");
        assert_eq!(config.roster.timeout_secs, 30);
        assert_eq!(config.cache.policy, CachePolicy::PerEntry);
        assert_eq!(config.cache.period(), Duration::from_secs(86_400));
        assert_eq!(
            config.normalize.rename_collisions,
            CollisionPolicy::KeepExisting
        );
        assert_eq!(config.normalize.attribute_key, "$");
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let config = Config::load_or_default("/nonexistent/roster.toml");
        assert_eq!(config.roster.default_term, "FA14");
    }
}
