//! Immutable quota configuration shared by every key in a [`super::KeyManager`].

/// Immutable per-manager quota configuration.
#[derive(Debug, Clone, Copy)]
pub struct QuotaInfo {
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    pub bytes_per_minute: u64,
    pub max_concurrent_uploads: u32,
}

impl Default for QuotaInfo {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            requests_per_hour: 1_000,
            bytes_per_minute: 50 * 1024 * 1024,
            max_concurrent_uploads: 4,
        }
    }
}

impl QuotaInfo {
    pub fn new(
        requests_per_minute: u32,
        requests_per_hour: u32,
        bytes_per_minute: u64,
        max_concurrent_uploads: u32,
    ) -> Self {
        Self {
            requests_per_minute,
            requests_per_hour,
            bytes_per_minute,
            max_concurrent_uploads,
        }
    }
}
