//! Per-client-IP rate limiting for the `/api` surface.
//!
//! A single budget of `max_requests` per `window_secs` (default 100 per 15
//! minutes) is expressed as a GCRA bucket: burst of `max_requests`, one token
//! replenished every `window / max_requests`.
//!
//! - `RATE_LIMIT_ENABLED`: default true
//! - `RATE_LIMIT_MAX`: default 100
//! - `RATE_LIMIT_WINDOW_SECS`: default 900

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

pub type ApiGovernorConfig =
    GovernorConfig<SmartIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            max_requests: std::env::var("RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_requests),
            window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.window_secs),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Milliseconds between two replenished requests.
    #[must_use]
    pub fn replenish_interval_ms(&self) -> u64 {
        let max = u64::from(self.max_requests.max(1));
        (self.window_secs * 1000 / max).max(1)
    }

    /// Builds the governor configuration keyed by client IP
    /// (`X-Forwarded-For`, `X-Real-IP`, `Forwarded`, then the peer address).
    ///
    /// Returns `None` when rate limiting is disabled.
    #[must_use]
    pub fn governor_config(&self) -> Option<ApiGovernorConfig> {
        if !self.enabled {
            return None;
        }

        GovernorConfigBuilder::default()
            .per_millisecond(self.replenish_interval_ms())
            .burst_size(self.max_requests.max(1))
            .key_extractor(SmartIpKeyExtractor)
            .finish()
    }
}
