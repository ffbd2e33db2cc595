pub mod status;

pub use status::{http_to_rpc, rpc_to_http};
