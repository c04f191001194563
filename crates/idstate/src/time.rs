//! Time utilities for idstate.
//!
//! Claim expirations are stored as Unix epoch seconds (u64).

use chrono::{DateTime, Utc};

use crate::error::{IdentityError, Result};

/// Return the current time as seconds since Unix epoch.
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs()
}

/// Convert a UTC timestamp to Unix seconds.
///
/// Timestamps before the epoch cannot be stored in a claim slot.
pub fn to_unix_seconds(at: &DateTime<Utc>) -> Result<u64> {
    u64::try_from(at.timestamp()).map_err(|_| {
        IdentityError::InvalidOptionCombination(format!(
            "timestamp {} is before the Unix epoch",
            at.to_rfc3339()
        ))
    })
}

/// Convert Unix seconds back to a UTC timestamp.
pub fn from_unix_seconds(secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::from_timestamp(secs, 0)
}
