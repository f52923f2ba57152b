/*!
 * Repository Facade (C8)
 *
 * Abstracts storage as a trait so the services (C5-C7) depend on an
 * interface rather than a concrete SQL client (§4.8, §9). The only
 * production implementation is `postgres::PgBookingRepository`, built on
 * `sqlx::PgPool` following the teacher's `db::pool` construction pattern.
 *
 * Read accessors for Workers/Services/Categories/Customers exist here
 * because C2/C3/C5 cannot function without reading them (§12), even
 * though CRUD over those entities is out of scope for the core.
 */

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::Interval;
use crate::models::{
    Appointment, AppointmentAudit, AppointmentStatus, AppointmentWithBlocks, AuditAction,
    CalendarException, Customer, CustomerInput, PaymentMethod, RecurringBreak, Service,
    ServiceCategory, Worker, WeeklyScheduleRule,
};
use crate::utils::errors::AppError;

/// One block to be materialized by `reserve`/`reschedule`, mirroring
/// `domain::options::OptionBlock` but independent of the option generator
/// so the repository module has no upward dependency on `domain::options`.
#[derive(Debug, Clone)]
pub struct BlockPlan {
    pub sequence: i16,
    pub worker_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ReservationPlan {
    pub option_id: Uuid,
    pub appointment_start: DateTime<Utc>,
    pub appointment_end: DateTime<Utc>,
    pub blocks: Vec<BlockPlan>,
    pub created_channel: crate::models::CreatedChannel,
}

#[derive(Debug, Clone, Default)]
pub struct AgendaFilter {
    pub worker_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub query: Option<String>,
}

/// Abstraction over relational storage for the booking core (§4.8).
#[async_trait]
pub trait BookingRepository: Send + Sync {
    // --- Read-only access to out-of-scope entities (§12) ---

    async fn list_active_workers(&self) -> Result<Vec<Worker>, AppError>;
    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>, AppError>;
    async fn list_weekly_rules(&self, worker_id: Uuid) -> Result<Vec<WeeklyScheduleRule>, AppError>;
    async fn list_recurring_breaks(&self, worker_id: Uuid) -> Result<Vec<RecurringBreak>, AppError>;
    async fn list_exceptions(&self, worker_id: Uuid, date: NaiveDate) -> Result<Vec<CalendarException>, AppError>;
    async fn get_service(&self, id: Uuid) -> Result<Option<Service>, AppError>;
    async fn list_services(&self, ids: &[Uuid]) -> Result<Vec<Service>, AppError>;
    async fn get_category(&self, id: Uuid) -> Result<Option<ServiceCategory>, AppError>;
    async fn find_customer_frequent(
        &self,
        phone: &str,
        birth_date: chrono::NaiveDate,
    ) -> Result<Option<Customer>, AppError>;

    /// Existing busy blocks for `worker_id` intersecting `window`, as plain
    /// intervals ready for `domain::calendar::free_intervals` (§4.2 step 4).
    async fn list_busy_blocks(&self, worker_id: Uuid, window: Interval) -> Result<Vec<Interval>, AppError>;

    // --- C5: reservation ---

    /// Materializes a reservation plan inside a transaction, per §4.5:
    /// locks the involved workers, re-checks for intersecting blocks,
    /// inserts the appointment/blocks/service lines, and appends a CREATE
    /// audit entry. Returns the new appointment id, or `AppError::Conflict`
    /// if a concurrent writer won the race.
    async fn reserve(&self, plan: ReservationPlan, customer: CustomerInput) -> Result<Uuid, AppError>;

    // --- C6: lifecycle ---

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError>;

    async fn cancel(
        &self,
        appointment_id: Uuid,
        performed_by: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Appointment, AppError>;

    async fn mark_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        performed_by: Option<Uuid>,
    ) -> Result<Appointment, AppError>;

    async fn register_payment(
        &self,
        appointment_id: Uuid,
        paid_total: rust_decimal::Decimal,
        payment_method: Option<PaymentMethod>,
        performed_by: Option<Uuid>,
    ) -> Result<Appointment, AppError>;

    async fn reschedule(
        &self,
        appointment_id: Uuid,
        plan: ReservationPlan,
        performed_by: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Appointment, AppError>;

    async fn inline_edit(
        &self,
        appointment_id: Uuid,
        new_start: Option<DateTime<Utc>>,
        new_end: Option<DateTime<Utc>>,
        new_status: Option<AppointmentStatus>,
        note: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<Appointment, AppError>;

    async fn append_audit(
        &self,
        appointment_id: Uuid,
        action: AuditAction,
        performed_by: Option<Uuid>,
        reason: Option<String>,
        detail: Option<serde_json::Value>,
    ) -> Result<AppointmentAudit, AppError>;

    // --- C7: agenda views ---

    async fn staff_day_view(&self, date: NaiveDate, filter: AgendaFilter) -> Result<Vec<AppointmentWithBlocks>, AppError>;
    async fn worker_day_view(&self, worker_id: Uuid, date: NaiveDate) -> Result<Vec<AppointmentWithBlocks>, AppError>;
}
