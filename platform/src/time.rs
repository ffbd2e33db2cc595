//! Conversions between `chrono::DateTime<Utc>` and the protobuf well-known
//! timestamp type, since the RPC surface carries timestamps as
//! protobuf-style values rather than strings.

use chrono::{DateTime, TimeZone, Utc};
use prost_types::Timestamp;

pub fn to_proto(dt: DateTime<Utc>) -> Timestamp {
    Timestamp { seconds: dt.timestamp(), nanos: dt.timestamp_subsec_nanos() as i32 }
}

pub fn to_proto_opt(dt: Option<DateTime<Utc>>) -> Option<Timestamp> {
    dt.map(to_proto)
}

pub fn from_proto(ts: &Timestamp) -> DateTime<Utc> {
    Utc.timestamp_opt(ts.seconds, ts.nanos.max(0) as u32).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_proto() {
        let now = Utc::now();
        let proto = to_proto(now);
        let back = from_proto(&proto);
        assert_eq!(now.timestamp(), back.timestamp());
    }
}
