use std::sync::Arc;

use marketplace_platform::auth::TokenVerifier;

use crate::clients::Clients;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub clients: Clients,
    pub verifier: Arc<TokenVerifier>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn deadline_secs(&self) -> u64 {
        self.config.rpc_deadline_secs
    }
}
