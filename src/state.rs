/*!
 * Application State
 *
 * The shared state handed to every handler: the three services built on
 * top of the repository facade, plus bookkeeping for the health/version
 * endpoints. Replaces the teacher's `handlers::auth::AppState` (JWT/session/
 * encryption/email singletons) one-for-one.
 */

use std::sync::Arc;
use std::time::SystemTime;

use sqlx::PgPool;

use crate::config::{BookingConfig, SecurityConfig};
use crate::services::{AgendaService, LifecycleService, ReservationService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub reservation_service: Arc<ReservationService>,
    pub lifecycle_service: Arc<LifecycleService>,
    pub agenda_service: Arc<AgendaService>,
    pub booking: BookingConfig,
    pub security: SecurityConfig,
    pub start_time: SystemTime,
    pub environment: String,
}
