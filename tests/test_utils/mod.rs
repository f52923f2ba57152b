/*!
 * Test Utilities
 *
 * Provides a `TestApp` wrapper (real Postgres pool + full router) and a
 * handful of fixture builders for seeding the read-only catalog tables
 * (workers, services, categories, weekly rules) the booking core reads
 * through the repository facade.
 */

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveTime;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use shopbook_core::config::{BookingConfig, SecurityConfig};
use shopbook_core::repository::postgres::PgBookingRepository;
use shopbook_core::repository::BookingRepository;
use shopbook_core::routes::create_api_v1_routes;
use shopbook_core::services::{AgendaService, LifecycleService, ReservationService};
use shopbook_core::state::AppState;

pub const OPTION_TOKEN_SECRET: &str = "test-option-token-secret-do-not-use-in-prod";

/// Test application wrapper: a full axum `Router` over a real database.
pub struct TestApp {
    pub app: axum::Router,
    pub pool: PgPool,
}

impl TestApp {
    /// Connects to `TEST_DATABASE_URL` (falling back to `DATABASE_URL`) and
    /// builds the full `/api/v1` router on top of `PgBookingRepository`.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("TEST_DATABASE_URL or DATABASE_URL must be set to run booking integration tests");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("failed to connect to test database");

        let booking = BookingConfig {
            option_token_ttl_seconds: 300,
            slot_interval_minutes: 5,
            options_limit: 20,
            shop_timezone: chrono_tz::Europe::Rome,
            cancel_window_minutes: 30,
            option_token_secret: OPTION_TOKEN_SECRET.to_string(),
        };

        let security = SecurityConfig {
            rate_limit_burst: 1000,
            rate_limit_period_seconds: 1,
        };

        let repo: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(pool.clone()));
        let reservation_service = Arc::new(ReservationService::new(repo.clone(), booking.clone()));
        let lifecycle_service = Arc::new(LifecycleService::new(repo.clone(), booking.clone()));
        let agenda_service = Arc::new(AgendaService::new(repo.clone()));

        let state = AppState {
            pool: pool.clone(),
            reservation_service,
            lifecycle_service,
            agenda_service,
            booking,
            security,
            start_time: SystemTime::now(),
            environment: "test".to_string(),
        };

        let app = create_api_v1_routes(state);

        Self { app, pool }
    }

    /// Seeds a BARBER worker with a Mon-Sun 09:00-18:00 weekly rule and
    /// returns its id.
    pub async fn seed_barber(&self, display_name: &str) -> Uuid {
        let worker_id: Uuid = sqlx::query_scalar(
            "INSERT INTO workers (role, display_name, active) VALUES ('BARBER', $1, true) RETURNING id",
        )
        .bind(display_name)
        .fetch_one(&self.pool)
        .await
        .expect("insert worker");

        for day in 0..=6 {
            sqlx::query(
                "INSERT INTO weekly_schedule_rules (worker_id, day_of_week, start_time, end_time, active)
                 VALUES ($1, $2, $3, $4, true)",
            )
            .bind(worker_id)
            .bind(day)
            .bind(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
            .bind(NaiveTime::from_hms_opt(18, 0, 0).unwrap())
            .execute(&self.pool)
            .await
            .expect("insert weekly rule");
        }

        worker_id
    }

    /// Seeds a service category and a ROLE_BASED service in it, returning
    /// (category_id, service_id).
    pub async fn seed_service(&self, name: &str, duration_minutes: i32) -> (Uuid, Uuid) {
        let category_id: Uuid = sqlx::query_scalar(
            "INSERT INTO service_categories (name, active) VALUES ($1, true) RETURNING id",
        )
        .bind(format!("{name} category"))
        .fetch_one(&self.pool)
        .await
        .expect("insert category");

        let service_id: Uuid = sqlx::query_scalar(
            "INSERT INTO services
                (name, category_id, duration_minutes, buffer_before_minutes, buffer_after_minutes,
                 price, active, assignment_type)
             VALUES ($1, $2, $3, 0, 0, 20.00, true, 'ROLE_BASED')
             RETURNING id",
        )
        .bind(name)
        .bind(category_id)
        .bind(duration_minutes)
        .fetch_one(&self.pool)
        .await
        .expect("insert service");

        (category_id, service_id)
    }
}

/// A unique, collision-free suffix for names that hit unique indexes
/// (e.g. customer phone numbers) across parallel test runs.
pub fn unique_suffix() -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_micros();
    format!("{}", micros % 1_000_000_000)
}
