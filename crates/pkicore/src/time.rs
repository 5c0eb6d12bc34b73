//! `Time` — a thin wrapper over a wall-clock instant (`spec.md` §3,
//! component G), used for validity checks during best-match selection.

use std::time::{SystemTime, UNIX_EPOCH};

/// Microseconds since the Unix epoch, matching the source's `PRTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(i64);

impl Time {
    pub fn from_micros_since_epoch(micros: i64) -> Self {
        Self(micros)
    }

    pub fn as_micros_since_epoch(&self) -> i64 {
        self.0
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(since_epoch.as_micros() as i64)
    }
}
