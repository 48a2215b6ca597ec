//! Windows FILETIME timestamp conversion.
//!
//! The container persists timestamps as FILETIME: a signed 64-bit count of
//! 100-nanosecond ticks since 1601-01-01 UTC. These helpers convert between
//! FILETIME and [`SystemTime`] through seconds + nanoseconds since the Unix
//! epoch, so the persisted value is portable and exact to 100 ns.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// FILETIME ticks per second (100 ns resolution).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Seconds between 1601-01-01 and 1970-01-01.
pub const UNIX_EPOCH_OFFSET_SECONDS: i64 = 11_644_473_600;

/// Convert a `SystemTime` to FILETIME ticks.
pub fn from_system_time(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let ticks = d.as_secs() as i64 * TICKS_PER_SECOND + (d.subsec_nanos() / 100) as i64;
            ticks + UNIX_EPOCH_OFFSET_SECONDS * TICKS_PER_SECOND
        }
        Err(e) => {
            // Before 1970: subtract the duration instead
            let d = e.duration();
            let ticks = d.as_secs() as i64 * TICKS_PER_SECOND + (d.subsec_nanos() / 100) as i64;
            UNIX_EPOCH_OFFSET_SECONDS * TICKS_PER_SECOND - ticks
        }
    }
}

/// Convert FILETIME ticks to a `SystemTime`.
pub fn to_system_time(filetime: i64) -> SystemTime {
    let unix_ticks = filetime - UNIX_EPOCH_OFFSET_SECONDS * TICKS_PER_SECOND;
    if unix_ticks >= 0 {
        let secs = (unix_ticks / TICKS_PER_SECOND) as u64;
        let nanos = ((unix_ticks % TICKS_PER_SECOND) * 100) as u32;
        UNIX_EPOCH + Duration::new(secs, nanos)
    } else {
        let back = (-unix_ticks) as u64;
        let secs = back / TICKS_PER_SECOND as u64;
        let nanos = ((back % TICKS_PER_SECOND as u64) * 100) as u32;
        UNIX_EPOCH - Duration::new(secs, nanos)
    }
}

/// Current time as FILETIME ticks.
pub fn now() -> i64 {
    from_system_time(SystemTime::now())
}
