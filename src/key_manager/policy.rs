//! Selection policies the [`super::KeyManager`] applies across the set of
//! currently-eligible keys.

use super::usage::KeyUsage;
use rand::Rng;

/// How `getAvailableKey` picks among keys that already passed the quota and
/// disabled-state checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Cycle through eligible keys in a fixed rotation.
    RoundRobin,
    /// Prefer the eligible key with the fewest total uses.
    LeastUsed,
    /// Pick randomly, weighted toward keys with fewer total uses.
    WeightedRandom,
}

/// Eligible candidates are always ordered `(consecutive_errors asc,
/// total_uses asc, total_bytes_uploaded asc)` before a policy is applied, so
/// `RoundRobin`'s rotation index is meaningful across calls and `LeastUsed`
/// ties break the same way every time.
fn sort_candidates(candidates: &mut [&KeyUsage]) {
    candidates.sort_by(|a, b| {
        a.consecutive_errors
            .cmp(&b.consecutive_errors)
            .then(a.total_uses.cmp(&b.total_uses))
            .then(a.total_bytes_uploaded.cmp(&b.total_bytes_uploaded))
    });
}

impl SelectionPolicy {
    /// Choose one key id from `eligible`. `round_robin_cursor` is advanced by
    /// the caller (it's stored on the manager, not here, since this function
    /// only reads usage records). Returns `None` if `eligible` is empty.
    pub fn select<'a>(&self, eligible: &[&'a KeyUsage], round_robin_cursor: usize) -> Option<&'a KeyUsage> {
        if eligible.is_empty() {
            return None;
        }
        let mut sorted: Vec<&KeyUsage> = eligible.to_vec();
        sort_candidates(&mut sorted);

        match self {
            SelectionPolicy::RoundRobin => {
                let idx = round_robin_cursor % sorted.len();
                Some(sorted[idx])
            }
            SelectionPolicy::LeastUsed => Some(sorted[0]),
            SelectionPolicy::WeightedRandom => {
                // weight = (sum of usageCounts - usageCount) + 1, so less-used
                // keys carry more weight.
                let usage_sum: f64 = sorted.iter().map(|u| u.total_uses as f64).sum();
                let weights: Vec<f64> = sorted.iter().map(|u| (usage_sum - u.total_uses as f64) + 1.0).collect();
                let total: f64 = weights.iter().sum();
                let mut pick = rand::thread_rng().gen_range(0.0..total);
                for (usage, weight) in sorted.iter().zip(weights.iter()) {
                    if pick < *weight {
                        return Some(usage);
                    }
                    pick -= weight;
                }
                sorted.last().copied()
            }
        }
    }
}
