//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-IP limits on the predict route via tower_governor. Requires the server
//! to run with `into_make_service_with_connect_info::<SocketAddr>()`.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config keyed by peer IP, emitting X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Apply the limiter to the predict route
    pub enabled: bool,
    /// Seconds between quota replenishments
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: 1,
            burst_size: 10,
        }
    }
}

/// Build the governor config, or `None` when limiting is disabled.
///
/// Zero `per_second` or `burst_size` is rejected by the builder and reported
/// as an error.
pub fn create_governor_config(
    config: &RateLimitConfig,
) -> Result<Option<Arc<DefaultGovernorConfig>>, String> {
    if !config.enabled {
        return Ok(None);
    }

    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(|c| Some(Arc::new(c)))
        .ok_or_else(|| {
            format!(
                "invalid rate limit: per_second={}, burst_size={}",
                config.per_second, config.burst_size
            )
        })
}
