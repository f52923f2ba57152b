/*!
 * Rate Limiting
 *
 * Per-IP throttle in front of the public, unauthenticated endpoints (§13).
 * `original_source/backend/booking/api/availability.py` fronts the options
 * endpoint with exactly this kind of throttle in the original Django
 * source, because it's unauthenticated and the heaviest endpoint in the
 * system (permutation search). `tower_governor`'s `GovernorLayer` is
 * already part of the teacher's dependency stack; this module just wires
 * it up from `SecurityConfig` instead of hand-rolling a limiter.
 */

use std::sync::Arc;

use tower_governor::governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;

use crate::config::SecurityConfig;

/// Builds the `GovernorLayer` for the public router, keyed by peer IP.
pub fn public_governor_layer(security: &SecurityConfig) -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_second = (security.rate_limit_period_seconds / security.rate_limit_burst.max(1) as u64).max(1);

    let governor_conf: Arc<GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>> = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(per_second)
            .burst_size(security.rate_limit_burst)
            .finish()
            .expect("rate limit configuration is always valid"),
    );

    GovernorLayer {
        config: governor_conf,
    }
}
