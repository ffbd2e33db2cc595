use marketplace_platform::config::ServiceConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub http_port: u16,
    pub hmac_secret: String,
    pub request_timeout_secs: u64,
    pub body_limit_mb: usize,
    pub rpc_deadline_secs: u64,
    pub users_addr: String,
    pub listings_addr: String,
    pub reviews_addr: String,
    pub news_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig { name: "edge".to_string(), ..ServiceConfig::default() },
            http_port: 8080,
            hmac_secret: String::new(),
            request_timeout_secs: 30,
            body_limit_mb: 10,
            rpc_deadline_secs: 5,
            users_addr: "http://127.0.0.1:50051".to_string(),
            listings_addr: "http://127.0.0.1:50052".to_string(),
            reviews_addr: "http://127.0.0.1:50053".to_string(),
            news_addr: "http://127.0.0.1:50054".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = marketplace_platform::config::load("EDGE", Config::default())?;
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
