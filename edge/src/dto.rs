//! Small shared helpers for turning generated proto replies into JSON.

use prost_types::Timestamp;

pub fn ts(value: Option<&Timestamp>) -> Option<String> {
    value.map(|t| marketplace_platform::time::from_proto(t).to_rfc3339())
}
