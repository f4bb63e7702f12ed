//! Time utilities for the agent gateway.
//!
//! Record timestamps are Unix epoch microseconds (u64). Token claims use
//! whole seconds, as JWT `iat`/`exp` do.

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Return the current time as whole seconds since Unix epoch.
pub fn now_secs() -> u64 {
    now_micros() / 1_000_000
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

/// Convert whole seconds to an RFC 3339 string.
pub fn secs_to_rfc3339(secs: u64) -> String {
    micros_to_rfc3339(secs.saturating_mul(1_000_000))
}
