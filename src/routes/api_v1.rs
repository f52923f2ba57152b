/*!
 * API v1 Routes
 *
 * Defines all version 1 API routes and their handlers (§6). The public
 * router (availability + reservation) sits behind a per-IP rate limiter
 * (§13); everything else requires a resolved principal (§11), with
 * role gating enforced by the service layer itself.
 */

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{
    agenda, appointments, availability, public_appointments,
};
use crate::middleware::principal::principal_middleware;
use crate::middleware::rate_limit::public_governor_layer;
use crate::state::AppState;

/// Create API v1 routes
pub fn create_api_v1_routes(state: AppState) -> Router {
    // Public, unauthenticated routes — rate-limited by peer IP (§13).
    let public_routes = Router::new()
        .route("/availability/options", post(availability::generate_options))
        .route("/public/appointments", post(public_appointments::reserve))
        .layer(public_governor_layer(&state.security));

    // Staff/admin routes — role gating enforced inside the lifecycle/agenda services.
    let staff_routes = Router::new()
        .route("/agenda/staff", get(agenda::staff_day_view))
        .route("/appointments/{id}/cancel", post(appointments::cancel))
        .route("/appointments/{id}/attend", post(appointments::attend))
        .route("/appointments/{id}/no-show", post(appointments::no_show))
        .route("/appointments/{id}/payment", post(appointments::register_payment))
        .route("/staff/appointments/{id}/reschedule", post(appointments::reschedule))
        .route("/staff/appointments/{id}/inline-edit", post(appointments::inline_edit));

    // Worker routes — bound to a single Worker record.
    let worker_routes = Router::new().route("/agenda/my", get(agenda::worker_day_view));

    Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .merge(worker_routes)
        .layer(middleware::from_fn(principal_middleware))
        .with_state(state)
}
