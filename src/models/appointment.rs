/*!
 * Appointment Model
 *
 * The appointment aggregate: an Appointment owns an ordered sequence of
 * AppointmentBlocks, each of which owns one or more AppointmentServiceLines.
 * Status transitions are restricted by `AppointmentStatus::can_transition_to`
 * (§4.6); all non-RESERVED statuses are terminal.
 */

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::Type;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Reserved,
    Cancelled,
    Attended,
    NoShow,
}

impl AppointmentStatus {
    /// Valid status transitions per §4.6. All non-RESERVED statuses are
    /// terminal; an attempted transition out of a terminal state is invalid.
    pub fn can_transition_to(&self, new_status: AppointmentStatus) -> bool {
        match self {
            AppointmentStatus::Reserved => matches!(
                new_status,
                AppointmentStatus::Cancelled | AppointmentStatus::Attended | AppointmentStatus::NoShow
            ),
            AppointmentStatus::Cancelled | AppointmentStatus::Attended | AppointmentStatus::NoShow => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Reserved)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreatedChannel {
    Client,
    Staff,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    /// Normalizes a free-form string to one of the three known methods
    /// (§4.6: "normalized uppercase").
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "CASH" => Some(PaymentMethod::Cash),
            "CARD" => Some(PaymentMethod::Card),
            "TRANSFER" => Some(PaymentMethod::Transfer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: AppointmentStatus,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub created_channel: CreatedChannel,
    pub recommended_subtotal: Decimal,
    pub recommended_discount: Decimal,
    pub recommended_total: Decimal,
    pub paid_total: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_by: Option<Uuid>,
    pub cancel_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A contiguous time segment on one worker's calendar, part of an
/// appointment (§3). `sequence` numbers run 1..N within an appointment.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AppointmentBlock {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub sequence: i16,
    pub worker_id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
}

/// An immutable snapshot of a service's pricing/timing fields, frozen at
/// reservation time. Billing and audit always read the snapshot, never the
/// live Service row (§3 invariant).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AppointmentServiceLine {
    pub id: Uuid,
    pub block_id: Uuid,
    pub service_id: Uuid,
    pub service_name_snapshot: String,
    pub duration_minutes_snapshot: i32,
    pub buffer_before_snapshot: i32,
    pub buffer_after_snapshot: i32,
    pub price_snapshot: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Reschedule,
    Cancel,
    StatusChange,
    PaymentRecorded,
    InlineEdit,
}

/// Append-only audit trail entry (§3). Never modified or deleted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AppointmentAudit {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub action: AuditAction,
    pub performed_by: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub detail: Option<Json>,
}

/// A fully hydrated appointment for agenda views (§4.7): blocks with their
/// workers, and each block's service lines, loaded in bulk to avoid N+1.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentWithBlocks {
    pub appointment: Appointment,
    pub blocks: Vec<AppointmentBlockWithLines>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentBlockWithLines {
    pub block: AppointmentBlock,
    pub worker_display_name: String,
    pub service_lines: Vec<AppointmentServiceLine>,
}
