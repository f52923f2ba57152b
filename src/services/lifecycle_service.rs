/*!
 * Lifecycle Service (C6)
 *
 * The appointment state machine's operations: Cancel, MarkAttended,
 * MarkNoShow, RegisterPayment, Reschedule, InlineEdit (§4.6). Policy checks
 * (cancel/reschedule window, staff-only gating) live here; storage-level
 * conflict detection and audit append live in the repository (C8).
 */

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::domain;
use crate::models::{Appointment, AppointmentStatus, PaymentMethod, Principal};
use crate::repository::{BlockPlan, BookingRepository, ReservationPlan};
use crate::utils::errors::AppError;

pub struct LifecycleService {
    repo: Arc<dyn BookingRepository>,
    config: BookingConfig,
}

impl LifecycleService {
    pub fn new(repo: Arc<dyn BookingRepository>, config: BookingConfig) -> Self {
        Self { repo, config }
    }

    fn require_staff(&self, principal: &Principal) -> Result<(), AppError> {
        if principal.is_staff_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("staff or admin role required".to_string()))
        }
    }

    /// Whether `now` is still inside the cancel/reschedule window relative
    /// to `start_datetime` (§4.6's `now ≤ start_datetime − cancel_window`).
    fn within_policy_window(&self, start_datetime: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let deadline = start_datetime - chrono::Duration::minutes(self.config.cancel_window_minutes);
        now <= deadline
    }

    /// Cancel(principal, appointment_id, reason?, force?) (§4.6).
    #[instrument(skip(self, principal), fields(%appointment_id, role = ?principal.role))]
    pub async fn cancel(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        reason: Option<String>,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppError> {
        let existing = self
            .repo
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id} not found")))?;

        if existing.status == AppointmentStatus::Cancelled {
            return Ok(existing); // idempotent (§8 property 7)
        }

        let staff_override = principal.is_staff_or_admin() && force;
        if !staff_override && !self.within_policy_window(existing.start_datetime, now) {
            return Err(AppError::PolicyDenied(format!(
                "cancellation window of {} minutes has passed",
                self.config.cancel_window_minutes
            )));
        }

        let performed_by = principal.worker_id;
        self.repo.cancel(appointment_id, performed_by, reason).await
    }

    /// MarkAttended(principal, appointment_id). Staff/admin only.
    #[instrument(skip(self, principal), fields(%appointment_id))]
    pub async fn mark_attended(&self, principal: &Principal, appointment_id: Uuid) -> Result<Appointment, AppError> {
        self.require_staff(principal)?;
        self.repo
            .mark_status(appointment_id, AppointmentStatus::Attended, principal.worker_id)
            .await
    }

    /// MarkNoShow(principal, appointment_id). Staff/admin only.
    #[instrument(skip(self, principal), fields(%appointment_id))]
    pub async fn mark_no_show(&self, principal: &Principal, appointment_id: Uuid) -> Result<Appointment, AppError> {
        self.require_staff(principal)?;
        self.repo
            .mark_status(appointment_id, AppointmentStatus::NoShow, principal.worker_id)
            .await
    }

    /// RegisterPayment(principal, appointment_id, paid_total, payment_method?). Staff/admin only.
    #[instrument(skip(self, principal), fields(%appointment_id))]
    pub async fn register_payment(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        paid_total: rust_decimal::Decimal,
        payment_method_raw: Option<String>,
    ) -> Result<Appointment, AppError> {
        self.require_staff(principal)?;

        let payment_method = match payment_method_raw {
            Some(raw) => Some(
                PaymentMethod::parse(&raw)
                    .ok_or_else(|| AppError::Validation(format!("unknown payment method '{raw}'")))?,
            ),
            None => None,
        };

        self.repo
            .register_payment(appointment_id, paid_total, payment_method, principal.worker_id)
            .await
    }

    /// Reschedule(principal, appointment_id, new_option_token, reason?) (§4.6).
    #[instrument(skip(self, principal, new_option_token), fields(%appointment_id))]
    pub async fn reschedule(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        new_option_token: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppError> {
        self.require_staff(principal)?;

        let existing = self
            .repo
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id} not found")))?;

        if existing.status != AppointmentStatus::Reserved {
            return Err(AppError::InvalidState(
                "only RESERVED appointments can be rescheduled".to_string(),
            ));
        }
        if !self.within_policy_window(existing.start_datetime, now) {
            return Err(AppError::PolicyDenied(format!(
                "reschedule window of {} minutes has passed",
                self.config.cancel_window_minutes
            )));
        }

        let decoded = domain::decode_option_token(
            new_option_token,
            self.config.option_token_secret(),
            now.timestamp(),
            self.config.option_token_ttl_seconds,
        )?;

        let blocks = decoded
            .blocks
            .into_iter()
            .map(|b| BlockPlan {
                sequence: b.sequence,
                worker_id: b.worker_id,
                start: b.start,
                end: b.end,
                service_ids: b.service_ids,
            })
            .collect();

        let plan = ReservationPlan {
            option_id: decoded.option_id,
            appointment_start: decoded.appointment_start,
            appointment_end: decoded.appointment_end,
            blocks,
            created_channel: existing.created_channel,
        };

        // Worker-set preservation (§8 property 8) is enforced by the
        // repository, which has both the existing and new block sets in
        // hand inside the locking transaction.
        self.repo
            .reschedule(appointment_id, plan, principal.worker_id, reason)
            .await
    }

    /// InlineEdit(principal, appointment_id, fields) (§4.6). Staff/admin
    /// only; deliberately skips availability checks.
    #[instrument(skip(self, principal), fields(%appointment_id))]
    #[allow(clippy::too_many_arguments)]
    pub async fn inline_edit(
        &self,
        principal: &Principal,
        appointment_id: Uuid,
        new_start: Option<DateTime<Utc>>,
        new_end: Option<DateTime<Utc>>,
        new_status: Option<AppointmentStatus>,
        note: Option<String>,
    ) -> Result<Appointment, AppError> {
        self.require_staff(principal)?;

        if let (Some(start), Some(end)) = (new_start, new_end) {
            if end <= start {
                return Err(AppError::Validation("new_end must be after new_start".to_string()));
            }
        }

        self.repo
            .inline_edit(appointment_id, new_start, new_end, new_status, note, principal.worker_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentWithBlocks, AuditAction, Customer, Service, ServiceCategory, Worker};
    use crate::repository::AgendaFilter;
    use chrono::NaiveDate;

    fn config() -> BookingConfig {
        BookingConfig {
            option_token_ttl_seconds: 300,
            slot_interval_minutes: 5,
            options_limit: 20,
            shop_timezone: "Europe/Rome".parse().unwrap(),
            cancel_window_minutes: 30,
            option_token_secret: "test-secret".to_string(),
        }
    }

    struct NullRepo;

    #[async_trait::async_trait]
    impl BookingRepository for NullRepo {
        async fn list_active_workers(&self) -> Result<Vec<Worker>, AppError> {
            Ok(Vec::new())
        }
        async fn get_worker(&self, _id: Uuid) -> Result<Option<Worker>, AppError> {
            Ok(None)
        }
        async fn list_weekly_rules(&self, _worker_id: Uuid) -> Result<Vec<crate::models::WeeklyScheduleRule>, AppError> {
            Ok(Vec::new())
        }
        async fn list_recurring_breaks(&self, _worker_id: Uuid) -> Result<Vec<crate::models::RecurringBreak>, AppError> {
            Ok(Vec::new())
        }
        async fn list_exceptions(&self, _worker_id: Uuid, _date: NaiveDate) -> Result<Vec<crate::models::CalendarException>, AppError> {
            Ok(Vec::new())
        }
        async fn get_service(&self, _id: Uuid) -> Result<Option<Service>, AppError> {
            Ok(None)
        }
        async fn list_services(&self, _ids: &[Uuid]) -> Result<Vec<Service>, AppError> {
            Ok(Vec::new())
        }
        async fn get_category(&self, _id: Uuid) -> Result<Option<ServiceCategory>, AppError> {
            Ok(None)
        }
        async fn find_customer_frequent(&self, _phone: &str, _birth_date: NaiveDate) -> Result<Option<Customer>, AppError> {
            Ok(None)
        }
        async fn list_busy_blocks(&self, _worker_id: Uuid, _window: domain::Interval) -> Result<Vec<domain::Interval>, AppError> {
            Ok(Vec::new())
        }
        async fn reserve(&self, _plan: ReservationPlan, _customer: crate::models::CustomerInput) -> Result<Uuid, AppError> {
            Ok(Uuid::nil())
        }
        async fn get_appointment(&self, _id: Uuid) -> Result<Option<Appointment>, AppError> {
            Ok(None)
        }
        async fn cancel(&self, _appointment_id: Uuid, _performed_by: Option<Uuid>, _reason: Option<String>) -> Result<Appointment, AppError> {
            Err(AppError::Internal("unimplemented".to_string()))
        }
        async fn mark_status(&self, _appointment_id: Uuid, _new_status: AppointmentStatus, _performed_by: Option<Uuid>) -> Result<Appointment, AppError> {
            Err(AppError::Internal("unimplemented".to_string()))
        }
        async fn register_payment(&self, _appointment_id: Uuid, _paid_total: rust_decimal::Decimal, _payment_method: Option<PaymentMethod>, _performed_by: Option<Uuid>) -> Result<Appointment, AppError> {
            Err(AppError::Internal("unimplemented".to_string()))
        }
        async fn reschedule(&self, _appointment_id: Uuid, _plan: ReservationPlan, _performed_by: Option<Uuid>, _reason: Option<String>) -> Result<Appointment, AppError> {
            Err(AppError::Internal("unimplemented".to_string()))
        }
        async fn inline_edit(&self, _appointment_id: Uuid, _new_start: Option<DateTime<Utc>>, _new_end: Option<DateTime<Utc>>, _new_status: Option<AppointmentStatus>, _note: Option<String>, _performed_by: Option<Uuid>) -> Result<Appointment, AppError> {
            Err(AppError::Internal("unimplemented".to_string()))
        }
        async fn append_audit(&self, _appointment_id: Uuid, _action: AuditAction, _performed_by: Option<Uuid>, _reason: Option<String>, _detail: Option<serde_json::Value>) -> Result<crate::models::AppointmentAudit, AppError> {
            Err(AppError::Internal("unimplemented".to_string()))
        }
        async fn staff_day_view(&self, _date: NaiveDate, _filter: AgendaFilter) -> Result<Vec<AppointmentWithBlocks>, AppError> {
            Ok(Vec::new())
        }
        async fn worker_day_view(&self, _worker_id: Uuid, _date: NaiveDate) -> Result<Vec<AppointmentWithBlocks>, AppError> {
            Ok(Vec::new())
        }
    }

    fn service() -> LifecycleService {
        LifecycleService::new(Arc::new(NullRepo), config())
    }

    #[test]
    fn within_policy_window_allows_45_minutes_ahead() {
        let svc = service();
        let start = Utc::now() + chrono::Duration::minutes(45);
        assert!(svc.within_policy_window(start, Utc::now()));
    }

    #[test]
    fn within_policy_window_rejects_15_minutes_ahead() {
        let svc = service();
        let start = Utc::now() + chrono::Duration::minutes(15);
        assert!(!svc.within_policy_window(start, Utc::now()));
    }
}
