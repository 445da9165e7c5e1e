//! Engine configuration.

use thiserror::Error;

pub const DEFAULT_CACHE_SIZE: usize = 500;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache_size must be greater than zero")]
    ZeroCacheSize,

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PosetConfig {
    /// Capacity of each memoization cache.
    pub cache_size: usize,
}

impl Default for PosetConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl PosetConfig {
    /// Defaults overridden by `POSET_CACHE_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("POSET_CACHE_SIZE") {
            config.cache_size = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "POSET_CACHE_SIZE",
                value,
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_size == 0 {
            return Err(ConfigError::ZeroCacheSize);
        }
        Ok(())
    }
}
