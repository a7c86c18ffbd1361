//! [`KeyUsage`] — the per-key running record the [`super::KeyManager`] tracks.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;

/// Default cooldown a key sits in "disabled" for after three consecutive
/// errors.
pub const DEFAULT_COOLDOWN_SECS: i64 = 60;

/// Number of consecutive errors that trips a key into the disabled state.
pub const CONSECUTIVE_ERROR_THRESHOLD: u32 = 3;

/// Per-key running record.
///
/// `minute_window` holds this key's own request timestamps from the last
/// hour (pruned at housekeeping tick); the minute-count is the suffix of
/// entries newer than 60s and the hour-count is the window's full length.
/// `byte_window` holds `(timestamp, bytes)` pairs from the last minute, a
/// genuine sliding window rather than a comparison against lifetime
/// cumulative bytes, which would permanently disable high-volume keys.
#[derive(Debug, Clone)]
pub struct KeyUsage {
    pub id: String,
    pub key: String,
    pub total_uses: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub total_bytes_uploaded: u64,
    pub consecutive_errors: u32,
    pub disabled: bool,
    pub disabled_until: Option<DateTime<Utc>>,
    request_window: VecDeque<DateTime<Utc>>,
    byte_window: VecDeque<(DateTime<Utc>, u64)>,
}

impl KeyUsage {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            total_uses: 0,
            last_used: None,
            total_bytes_uploaded: 0,
            consecutive_errors: 0,
            disabled: false,
            disabled_until: None,
            request_window: VecDeque::new(),
            byte_window: VecDeque::new(),
        }
    }

    /// Requests counted in the last 60 seconds (as of `now`).
    pub fn minute_count(&self, now: DateTime<Utc>) -> u32 {
        let cutoff = now - ChronoDuration::seconds(60);
        self.request_window.iter().filter(|ts| **ts > cutoff).count() as u32
    }

    /// Requests counted in the last 3600 seconds (as of `now`).
    pub fn hour_count(&self, now: DateTime<Utc>) -> u32 {
        let cutoff = now - ChronoDuration::seconds(3600);
        self.request_window.iter().filter(|ts| **ts > cutoff).count() as u32
    }

    /// Bytes uploaded in the last 60 seconds (as of `now`) — the sliding
    /// window used for the bytes-per-minute cap.
    pub fn bytes_in_last_minute(&self, now: DateTime<Utc>) -> u64 {
        let cutoff = now - ChronoDuration::seconds(60);
        self.byte_window.iter().filter(|(ts, _)| *ts > cutoff).map(|(_, b)| b).sum()
    }

    /// Whether this key is usable right now: not disabled, or its cooldown
    /// has elapsed. Tolerates a stale `disabled_until` at read time; the
    /// background tick is responsible for actually clearing the flag.
    pub fn is_eligible_now(&self, now: DateTime<Utc>) -> bool {
        if !self.disabled {
            return true;
        }
        match self.disabled_until {
            Some(until) => now >= until,
            None => false,
        }
    }

    /// Record that this key was just handed out by `getAvailableKey`: bump
    /// counters and append a timestamp to this key's window, immediately —
    /// independent of whether `report_success`/`report_error` is ever called
    ///.
    pub fn record_dispatch(&mut self, now: DateTime<Utc>) {
        self.total_uses += 1;
        self.last_used = Some(now);
        self.request_window.push_back(now);
    }

    /// Record a successful call: add bytes to both the sliding window and the
    /// lifetime total, and reset the consecutive-error streak.
    pub fn record_success(&mut self, bytes_uploaded: u64, now: DateTime<Utc>) {
        self.byte_window.push_back((now, bytes_uploaded));
        self.total_bytes_uploaded += bytes_uploaded;
        self.consecutive_errors = 0;
    }

    /// Record a failed call. Disables the key for `cooldown` once three
    /// consecutive errors accumulate with no intervening success.
    pub fn record_error(&mut self, now: DateTime<Utc>, cooldown: ChronoDuration) {
        self.consecutive_errors += 1;
        if self.consecutive_errors >= CONSECUTIVE_ERROR_THRESHOLD {
            self.disabled = true;
            self.disabled_until = Some(now + cooldown);
        }
    }

    /// Housekeeping: drop request/byte-window entries older than an hour /
    /// a minute respectively, and clear `disabled` if its cooldown has
    /// elapsed. Called roughly every 60s by the manager's background tick.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let hour_cutoff = now - ChronoDuration::seconds(3600);
        while matches!(self.request_window.front(), Some(ts) if *ts <= hour_cutoff) {
            self.request_window.pop_front();
        }
        let minute_cutoff = now - ChronoDuration::seconds(60);
        while matches!(self.byte_window.front(), Some((ts, _)) if *ts <= minute_cutoff) {
            self.byte_window.pop_front();
        }
        if self.disabled {
            if let Some(until) = self.disabled_until {
                if now >= until {
                    self.disabled = false;
                    self.disabled_until = None;
                }
            }
        }
    }
}
