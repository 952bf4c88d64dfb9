use thiserror::Error;

/// Environment variable holding the store URL.
pub const STORE_URL_VAR: &str = "INVOICEDASH_STORE_URL";

/// Environment variable holding the store access key.
pub const STORE_KEY_VAR: &str = "INVOICEDASH_STORE_KEY";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Unsupported store URL '{0}': expected sqlite:, http:// or https://")]
    UnsupportedScheme(String),
}

/// Which adapter a store URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Rest,
}

/// Connection settings for the backing store.
///
/// Built once at startup and handed to the services, so tests can point
/// them at a temporary database without touching the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    pub key: String,
}

impl StoreConfig {
    /// Create a config, rejecting empty values.
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        let key = key.into().trim().to_string();

        if url.is_empty() {
            return Err(ConfigError::Missing(STORE_URL_VAR));
        }
        if key.is_empty() {
            return Err(ConfigError::Missing(STORE_KEY_VAR));
        }

        let config = Self { url, key };
        config.kind()?;
        Ok(config)
    }

    /// Read the config from `INVOICEDASH_STORE_URL` and `INVOICEDASH_STORE_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the config through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(STORE_URL_VAR).ok_or(ConfigError::Missing(STORE_URL_VAR))?;
        let key = lookup(STORE_KEY_VAR).ok_or(ConfigError::Missing(STORE_KEY_VAR))?;
        Self::new(url, key)
    }

    pub fn kind(&self) -> Result<StoreKind, ConfigError> {
        if self.url.starts_with("sqlite:") {
            Ok(StoreKind::Sqlite)
        } else if self.url.starts_with("http://") || self.url.starts_with("https://") {
            Ok(StoreKind::Rest)
        } else {
            Err(ConfigError::UnsupportedScheme(self.url.clone()))
        }
    }
}
