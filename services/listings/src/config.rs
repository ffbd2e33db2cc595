use marketplace_platform::config::ServiceConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub grpc_port: u16,
    pub hmac_secret: String,
    pub redis_url: Option<String>,
    pub nats_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig { name: "listings-service".to_string(), ..ServiceConfig::default() },
            grpc_port: 50052,
            hmac_secret: String::new(),
            redis_url: None,
            nats_url: None,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = marketplace_platform::config::load("LISTINGS", Config::default())?;
        config
            .service
            .require_secret_outside_dev(&config.hmac_secret)
            .map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_dev_and_does_not_require_secret() {
        let config = Config::default();
        assert!(config.service.require_secret_outside_dev(&config.hmac_secret).is_ok());
    }
}
