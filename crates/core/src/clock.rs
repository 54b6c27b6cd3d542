use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::CoreError;

/// Returns the current wall-clock time as milliseconds since Unix epoch.
pub fn physical_now() -> Result<i64, CoreError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .map_err(|_| CoreError::InvalidData("system clock before epoch".into()))
}

/// Source of `create_at` / `update_at` / `delete_at` values.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> Result<i64, CoreError>;
}

/// Wall clock that never steps backwards: a reading older than the last one
/// handed out is clamped to it.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> Result<i64, CoreError> {
        let now = physical_now()?;
        let prev = self.last.fetch_max(now, Ordering::AcqRel);
        Ok(now.max(prev))
    }
}

/// Clock moved only by hand. Used by tests that assert on timestamps.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::Release);
    }

    pub fn advance(&self, millis: i64) -> i64 {
        self.now.fetch_add(millis, Ordering::AcqRel) + millis
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Result<i64, CoreError> {
        Ok(self.now.load(Ordering::Acquire))
    }
}
