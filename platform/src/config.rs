//! Layered config loading: defaults -> `config.toml` -> environment,
//! environment taking precedence. Each service defines its own `Config`
//! struct and loads it through [`load`].

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{de::DeserializeOwned, Serialize};

/// Loads `T` by layering `Serialized::defaults(defaults)` under
/// `config.toml` (if present) under `Env::prefixed("<prefix>_")`, matching
/// the precedence every service in this workspace relies on.
pub fn load<T>(env_prefix: &str, defaults: T) -> Result<T, figment::Error>
where
    T: DeserializeOwned + Serialize,
{
    Figment::new()
        .merge(Serialized::defaults(defaults))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed(&format!("{env_prefix}_")).split("_"))
        .extract()
}

/// Fields every service's config shares.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: String,
    pub environment: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "marketplace-service".to_string(),
            log_level: "info".to_string(),
            environment: "dev".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn is_dev(&self) -> bool {
        self.environment == "dev"
    }

    /// The shared secret must be non-empty in non-dev modes or startup
    /// fails; callers check this against their own `hmac_secret` field.
    pub fn require_secret_outside_dev(&self, secret: &str) -> Result<(), String> {
        if !self.is_dev() && secret.trim().is_empty() {
            Err(format!(
                "{}: hmac secret must be set outside dev environment",
                self.name
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_required_outside_dev() {
        let cfg = ServiceConfig { environment: "production".to_string(), ..ServiceConfig::default() };
        assert!(cfg.require_secret_outside_dev("").is_err());
        assert!(cfg.require_secret_outside_dev("shh").is_ok());
    }

    #[test]
    fn secret_optional_in_dev() {
        let cfg = ServiceConfig::default();
        assert!(cfg.require_secret_outside_dev("").is_ok());
    }
}
