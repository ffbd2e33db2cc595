//! Time-sortable request identifiers, threaded from HTTP through to the
//! RPC interceptor chain for correlated logging.

use mti::prelude::*;
use std::fmt;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    pub const PREFIX: &'static str = "req";

    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MakeMarketplaceRequestId;

impl MakeRequestId for MakeMarketplaceRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_carries_req_prefix() {
        let id = RequestId::new();
        assert!(id.as_str().starts_with("req_"));
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = RequestId::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = RequestId::new();
        assert!(a < b);
    }
}
