//! Per-client daily usage counters.
//!
//! Every client identifier gets a lazily created [`UsageRecord`]. The whole
//! table is dropped once the quota window has elapsed, so counts never carry
//! over from one window to the next.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::info;

use crate::types::Mode;

pub const MAX_AI_PER_DAY: u32 = 20;
pub const MAX_WEB_PER_DAY: u32 = 100;
pub const QUOTA_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageRecord {
    pub ai_count: u32,
    pub web_count: u32,
}

impl UsageRecord {
    fn count(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Ai => self.ai_count,
            Mode::Web => self.web_count,
        }
    }

    fn increment(&mut self, mode: Mode) {
        match mode {
            Mode::Ai => self.ai_count += 1,
            Mode::Web => self.web_count += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub ai_per_window: u32,
    pub web_per_window: u32,
}

impl QuotaLimits {
    pub fn limit(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Ai => self.ai_per_window,
            Mode::Web => self.web_per_window,
        }
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            ai_per_window: MAX_AI_PER_DAY,
            web_per_window: MAX_WEB_PER_DAY,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{mode} quota of {limit} requests exhausted")]
pub struct QuotaExceeded {
    pub mode: Mode,
    pub limit: u32,
}

#[derive(Debug)]
struct UsageTable {
    window_start: Instant,
    records: HashMap<String, UsageRecord>,
}

#[derive(Debug)]
pub struct QuotaTracker {
    limits: QuotaLimits,
    window: Duration,
    table: Mutex<UsageTable>,
}

impl QuotaTracker {
    pub fn new(limits: QuotaLimits) -> Self {
        Self::with_window(limits, QUOTA_WINDOW)
    }

    pub fn with_window(limits: QuotaLimits, window: Duration) -> Self {
        Self {
            limits,
            window,
            table: Mutex::new(UsageTable {
                window_start: Instant::now(),
                records: HashMap::new(),
            }),
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    // A panic while holding the lock cannot leave a record half-written,
    // so a poisoned table is still usable.
    fn lock(&self) -> MutexGuard<'_, UsageTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear every record if the current window has run out. Returns `true`
    /// when a reset happened.
    pub fn reset_if_expired(&self) -> bool {
        let mut table = self.lock();
        let now = Instant::now();
        if now.duration_since(table.window_start) > self.window {
            let cleared = table.records.len();
            table.records.clear();
            table.window_start = now;
            info!("Quota window elapsed, cleared usage for {} clients", cleared);
            true
        } else {
            false
        }
    }

    pub fn get_or_create_record(&self, client_id: &str) -> UsageRecord {
        *self
            .lock()
            .records
            .entry(client_id.to_string())
            .or_default()
    }

    /// Look up a record without creating one.
    pub fn record(&self, client_id: &str) -> Option<UsageRecord> {
        self.lock().records.get(client_id).copied()
    }

    pub fn client_count(&self) -> usize {
        self.lock().records.len()
    }

    /// Charge one request of `mode` to `client_id`. The check and the
    /// increment happen under a single lock acquisition; at the ceiling the
    /// record is left untouched.
    pub fn try_consume(&self, client_id: &str, mode: Mode) -> Result<UsageRecord, QuotaExceeded> {
        let limit = self.limits.limit(mode);
        let mut table = self.lock();
        let record = table.records.entry(client_id.to_string()).or_default();
        if record.count(mode) >= limit {
            return Err(QuotaExceeded { mode, limit });
        }
        record.increment(mode);
        Ok(*record)
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(QuotaLimits::default())
    }
}
