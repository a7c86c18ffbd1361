//! Key-rotation manager: distributes load across a pool of API keys, tracks
//! per-key quotas and health, and disables keys that fail repeatedly.

pub mod policy;
pub mod quota;
pub mod usage;

pub use policy::SelectionPolicy;
pub use quota::QuotaInfo;
pub use usage::KeyUsage;

use crate::error::{Error, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Thread-safe key pool. The interior is a single `parking_lot::RwLock`,
/// synchronous and never held across an `.await` point.
pub struct KeyManager {
    state: RwLock<Vec<KeyUsage>>,
    /// Chronological dispatch timestamps across every key in the pool. RPM
    /// and RPH are enforced against the pool as a whole, not per key — a
    /// 3-key pool at RPM=2 allows 2 dispatches total per minute, not 6.
    request_window: RwLock<VecDeque<DateTime<Utc>>>,
    quota: QuotaInfo,
    policy: SelectionPolicy,
    cooldown: ChronoDuration,
    round_robin_cursor: AtomicUsize,
}

impl KeyManager {
    /// Build a manager from a non-empty list of raw API keys.
    pub fn new(keys: Vec<String>, quota: QuotaInfo, policy: SelectionPolicy) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::config("key manager requires at least one API key"));
        }
        let state = keys
            .into_iter()
            .map(|key| KeyUsage::new(Uuid::new_v4().to_string(), key))
            .collect();
        Ok(Self {
            state: RwLock::new(state),
            request_window: RwLock::new(VecDeque::new()),
            quota,
            policy,
            cooldown: ChronoDuration::seconds(usage::DEFAULT_COOLDOWN_SECS),
            round_robin_cursor: AtomicUsize::new(0),
        })
    }

    pub fn with_cooldown(mut self, cooldown: ChronoDuration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Number of keys in the pool, regardless of eligibility.
    pub fn key_count(&self) -> usize {
        self.state.read().len()
    }

    /// Requests dispatched across the whole pool in the last 60 seconds.
    fn global_minute_count(&self, now: DateTime<Utc>) -> u32 {
        let cutoff = now - ChronoDuration::seconds(60);
        self.request_window.read().iter().filter(|ts| **ts > cutoff).count() as u32
    }

    /// Requests dispatched across the whole pool in the last 3600 seconds.
    fn global_hour_count(&self, now: DateTime<Utc>) -> u32 {
        let cutoff = now - ChronoDuration::seconds(3600);
        self.request_window.read().iter().filter(|ts| **ts > cutoff).count() as u32
    }

    /// `minute_count`/`hour_count` are the pool-wide counts as of `now`,
    /// shared across every key checked in the same call so a burst of
    /// `is_eligible` calls agrees on a single snapshot of the global window.
    fn is_eligible(&self, usage: &KeyUsage, now: DateTime<Utc>, minute_count: u32, hour_count: u32) -> bool {
        usage.is_eligible_now(now)
            && minute_count < self.quota.requests_per_minute
            && hour_count < self.quota.requests_per_hour
            && usage.bytes_in_last_minute(now) < self.quota.bytes_per_minute
    }

    /// Whether `key` currently passes the quota and disabled-state checks.
    pub fn can_use_key(&self, key: &str) -> bool {
        let now = Utc::now();
        let minute_count = self.global_minute_count(now);
        let hour_count = self.global_hour_count(now);
        let guard = self.state.read();
        guard
            .iter()
            .find(|u| u.key == key)
            .is_some_and(|u| self.is_eligible(u, now, minute_count, hour_count))
    }

    /// Select the next key to use, per the configured [`SelectionPolicy`],
    /// among keys that currently pass the quota and disabled-state checks.
    /// Records the dispatch against the chosen key's windows immediately,
    /// without waiting for `report_success`/`report_error`, so a burst of
    /// concurrent callers can't all observe stale headroom.
    pub fn get_available_key(&self) -> Result<String> {
        let now = Utc::now();
        let minute_count = self.global_minute_count(now);
        let hour_count = self.global_hour_count(now);
        let mut guard = self.state.write();

        let eligible: Vec<&KeyUsage> =
            guard.iter().filter(|u| self.is_eligible(u, now, minute_count, hour_count)).collect();
        let chosen_id = self
            .policy
            .select(&eligible, self.round_robin_cursor.load(Ordering::Relaxed))
            .map(|u| u.id.clone())
            .ok_or(Error::NoKeyAvailable)?;

        self.round_robin_cursor.fetch_add(1, Ordering::Relaxed);

        let usage = guard
            .iter_mut()
            .find(|u| u.id == chosen_id)
            .expect("chosen id came from the same state snapshot");
        usage.record_dispatch(now);
        self.request_window.write().push_back(now);
        Ok(usage.key.clone())
    }

    /// Report that a call using `key` succeeded, attributing `bytes_uploaded`
    /// to its sliding byte window.
    pub fn report_success(&self, key: &str, bytes_uploaded: u64) {
        let now = Utc::now();
        let mut guard = self.state.write();
        if let Some(usage) = guard.iter_mut().find(|u| u.key == key) {
            usage.record_success(bytes_uploaded, now);
        }
    }

    /// Report that a call using `key` failed. Disables the key after three
    /// consecutive errors.
    pub fn report_error(&self, key: &str) {
        let now = Utc::now();
        let mut guard = self.state.write();
        if let Some(usage) = guard.iter_mut().find(|u| u.key == key) {
            usage.record_error(now, self.cooldown);
        }
    }

    /// Seconds until capacity is likely to free up: 0 if the pool has both
    /// an undisabled key and global minute-window headroom; else the time
    /// remaining until the oldest entry in the global minute window ages
    /// out, falling back to the soonest cooldown expiry if no key has been
    /// dispatched to in the last minute at all.
    pub fn estimated_wait_time(&self) -> f64 {
        let now = Utc::now();
        let guard = self.state.read();
        if guard.is_empty() {
            return 0.0;
        }

        let minute_count = self.global_minute_count(now);
        let any_undisabled = guard.iter().any(|u| u.is_eligible_now(now));
        if any_undisabled && minute_count < self.quota.requests_per_minute {
            return 0.0;
        }

        let cutoff = now - ChronoDuration::seconds(60);
        let oldest_in_window = self.request_window.read().iter().find(|ts| **ts > cutoff).copied();
        if let Some(oldest) = oldest_in_window {
            let elapsed_secs = (now - oldest).num_milliseconds().max(0) as f64 / 1000.0;
            return (60.0 - elapsed_secs).max(0.0);
        }

        guard
            .iter()
            .filter_map(|u| u.disabled_until)
            .map(|until| (until - now).num_milliseconds().max(0) as f64 / 1000.0)
            .fold(f64::INFINITY, f64::min)
            .min(60.0)
    }

    /// A conservative batch size for one tick: `min(requestsPerMinute /
    /// activeKeys, bytesPerMinute / activeKeys / avgBytesPerRequest)`,
    /// floor-clamped to 1. `activeKeys` counts only keys not currently
    /// disabled — a cooling-down key contributes no dispatch capacity.
    pub fn recommended_batch_size(&self, avg_bytes_per_request: u64) -> u32 {
        let now = Utc::now();
        let guard = self.state.read();
        let active_keys = guard.iter().filter(|u| u.is_eligible_now(now)).count().max(1) as u64;

        let by_requests = (self.quota.requests_per_minute as u64 / active_keys).max(1);
        let by_bytes = if avg_bytes_per_request == 0 {
            u64::MAX
        } else {
            self.quota.bytes_per_minute / active_keys / avg_bytes_per_request
        };

        by_requests.min(by_bytes).max(1).min(u32::MAX as u64) as u32
    }

    /// Background housekeeping: prune stale window entries and clear expired
    /// disabled flags on every key. Intended to run on a periodic tick
    /// (e.g. every 60s); `can_use_key`/`get_available_key` tolerate a stale
    /// `disabled_until` between ticks.
    pub fn tick(&self) {
        let now = Utc::now();
        let mut guard = self.state.write();
        for usage in guard.iter_mut() {
            usage.prune(now);
        }
        let hour_cutoff = now - ChronoDuration::seconds(3600);
        let mut window = self.request_window.write();
        while matches!(window.front(), Some(ts) if *ts <= hour_cutoff) {
            window.pop_front();
        }
    }

    /// Snapshot of every key's usage record, for diagnostics/metrics.
    pub fn snapshot(&self) -> Vec<KeyUsage> {
        self.state.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(keys: &[&str]) -> KeyManager {
        KeyManager::new(
            keys.iter().map(|s| s.to_string()).collect(),
            QuotaInfo::new(2, 100, 10_000, 4),
            SelectionPolicy::LeastUsed,
        )
        .unwrap()
    }

    #[test]
    fn rejects_an_empty_key_list() {
        let result = KeyManager::new(vec![], QuotaInfo::default(), SelectionPolicy::RoundRobin);
        assert!(result.is_err());
    }

    #[test]
    fn get_available_key_returns_a_key_from_the_pool() {
        let mgr = manager(&["a", "b"]);
        let key = mgr.get_available_key().unwrap();
        assert!(key == "a" || key == "b");
    }

    #[test]
    fn least_used_alternates_across_two_keys_under_quota() {
        let mgr = manager(&["a", "b"]);
        let first = mgr.get_available_key().unwrap();
        let second = mgr.get_available_key().unwrap();
        assert_ne!(first, second, "least-used should move to the other key once one has a use");
    }

    #[test]
    fn exhausting_minute_quota_on_every_key_yields_no_key_available() {
        let mgr = manager(&["solo"]);
        for _ in 0..2 {
            mgr.get_available_key().unwrap();
        }
        let result = mgr.get_available_key();
        assert!(matches!(result, Err(Error::NoKeyAvailable)));
    }

    #[test]
    fn three_reported_errors_disable_a_key_until_cooldown() {
        let mgr = manager(&["only"]).with_cooldown(ChronoDuration::seconds(60));
        for _ in 0..3 {
            mgr.report_error("only");
        }
        assert!(!mgr.can_use_key("only"));
    }

    #[test]
    fn report_success_resets_the_error_streak() {
        let mgr = manager(&["only"]);
        mgr.report_error("only");
        mgr.report_error("only");
        mgr.report_success("only", 100);
        mgr.report_error("only");
        assert!(mgr.can_use_key("only"));
    }

    #[test]
    fn global_quota_is_shared_across_the_whole_pool_not_per_key() {
        // RPM=2 across 3 keys: the third call fails even though key-c has
        // never been dispatched to, because the minute window is pooled.
        let mgr = KeyManager::new(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            QuotaInfo::new(2, 100, 10_000, 4),
            SelectionPolicy::RoundRobin,
        )
        .unwrap();

        mgr.get_available_key().unwrap();
        mgr.get_available_key().unwrap();
        assert!(matches!(mgr.get_available_key(), Err(Error::NoKeyAvailable)));
    }

    #[test]
    fn estimated_wait_time_is_zero_when_capacity_exists() {
        let mgr = manager(&["a", "b"]);
        assert_eq!(mgr.estimated_wait_time(), 0.0);
    }

    #[test]
    fn estimated_wait_time_counts_down_from_the_oldest_window_entry() {
        let mgr = manager(&["solo"]);
        mgr.get_available_key().unwrap();
        mgr.get_available_key().unwrap();

        let wait = mgr.estimated_wait_time();
        assert!(wait > 0.0 && wait <= 60.0, "wait should be close to 60s: {wait}");
    }

    #[test]
    fn recommended_batch_size_respects_byte_quota() {
        let mgr = manager(&["a"]);
        // quota: 10_000 bytes/minute, 1 active key, 5_000 bytes/request => 2.
        let batch = mgr.recommended_batch_size(5_000);
        assert_eq!(batch, 2);
    }

    #[test]
    fn recommended_batch_size_excludes_disabled_keys_from_the_active_count() {
        let mgr = manager(&["a", "b"]).with_cooldown(ChronoDuration::seconds(60));
        for _ in 0..3 {
            mgr.report_error("a");
        }
        // Only "b" is active, so the pooled quota isn't split with "a".
        let batch = mgr.recommended_batch_size(1);
        assert_eq!(batch, 2);
    }

    #[test]
    fn recommended_batch_size_divides_quota_across_active_keys() {
        let mgr = manager(&["a", "b"]);
        // quota: 2 requests/minute pooled, 2 active keys => 1 request/minute
        // of fair share per tick, well below the byte-quota ceiling.
        let batch = mgr.recommended_batch_size(1);
        assert_eq!(batch, 1);
    }

    #[test]
    fn tick_clears_disabled_state_once_cooldown_elapses() {
        let mgr = manager(&["only"]).with_cooldown(ChronoDuration::seconds(-1));
        for _ in 0..3 {
            mgr.report_error("only");
        }
        mgr.tick();
        assert!(mgr.can_use_key("only"));
    }
}
