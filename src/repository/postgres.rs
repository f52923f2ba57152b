/*!
 * Postgres-backed Repository (C8)
 *
 * The only production implementation of `BookingRepository`, built on
 * `sqlx::PgPool` following the teacher's `AppointmentService`/`db::pool`
 * pattern: dynamic-free, plain `query_as!`-style calls, transactions with
 * `FOR UPDATE` locks for the write paths, bulk SELECTs for the read paths.
 */

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::Interval;
use crate::models::{
    Appointment, AppointmentAudit, AppointmentBlock, AppointmentBlockWithLines,
    AppointmentServiceLine, AppointmentStatus, AppointmentWithBlocks, AuditAction, CalendarException,
    CreatedChannel, Customer, CustomerInput, CustomerType, PaymentMethod, RecurringBreak, Service,
    ServiceCategory, Worker, WeeklyScheduleRule,
};
use crate::utils::errors::AppError;

use super::{AgendaFilter, BookingRepository, ReservationPlan};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves a `CustomerInput` into a customer id, per §4.5 step 2.
    /// FREQUENT must pre-exist; CASUAL is always freshly created.
    async fn resolve_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        input: &CustomerInput,
    ) -> Result<Uuid, AppError> {
        match input.customer_type {
            CustomerType::Frequent => {
                let phone = input
                    .phone
                    .as_deref()
                    .ok_or_else(|| AppError::Validation("frequent customer requires phone".to_string()))?;
                let birth_date = input
                    .birth_date
                    .ok_or_else(|| AppError::Validation("frequent customer requires birth_date".to_string()))?;

                let row = sqlx::query_as::<_, Customer>(
                    r#"SELECT * FROM customers WHERE customer_type = 'FREQUENT' AND phone = $1 AND birth_date = $2"#,
                )
                .bind(phone)
                .bind(birth_date)
                .fetch_optional(&mut **tx)
                .await?;

                let customer = row.ok_or(AppError::FrequentNotRegistered)?;

                if customer.name != input.name {
                    sqlx::query("UPDATE customers SET name = $1 WHERE id = $2")
                        .bind(&input.name)
                        .bind(customer.id)
                        .execute(&mut **tx)
                        .await?;
                }

                Ok(customer.id)
            }
            CustomerType::Casual => {
                let row = sqlx::query_as::<_, Customer>(
                    r#"
                    INSERT INTO customers (customer_type, name)
                    VALUES ('CASUAL', $1)
                    RETURNING *
                    "#,
                )
                .bind(&input.name)
                .fetch_one(&mut **tx)
                .await?;
                Ok(row.id)
            }
        }
    }

    /// Locks the given worker rows in a stable order (ascending id) to avoid
    /// deadlocks between concurrent multi-worker reservations (§4.5 step 3a).
    async fn lock_workers(&self, tx: &mut Transaction<'_, Postgres>, mut worker_ids: Vec<Uuid>) -> Result<(), AppError> {
        worker_ids.sort();
        worker_ids.dedup();
        sqlx::query("SELECT id FROM workers WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(&worker_ids)
            .fetch_all(&mut **tx)
            .await?;
        Ok(())
    }

    /// Checks each planned block against existing blocks on the same
    /// worker, excluding `exclude_appointment_id` (used by reschedule).
    /// Any intersection means another writer won the race (§4.5 step 3b).
    async fn check_block_conflicts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        blocks: &[super::BlockPlan],
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        for block in blocks {
            let count: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM appointment_blocks b
                JOIN appointments a ON a.id = b.appointment_id
                WHERE b.worker_id = $1
                  AND b.start_datetime < $3
                  AND b.end_datetime > $2
                  AND a.status IN ('RESERVED', 'ATTENDED')
                  AND ($4::uuid IS NULL OR b.appointment_id != $4)
                "#,
            )
            .bind(block.worker_id)
            .bind(block.start)
            .bind(block.end)
            .bind(exclude_appointment_id)
            .fetch_one(&mut **tx)
            .await?;

            if count > 0 {
                return Err(AppError::Conflict(format!(
                    "worker {} has a conflicting block at {}",
                    block.worker_id, block.start
                )));
            }
        }
        Ok(())
    }

    async fn insert_blocks_and_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        appointment_id: Uuid,
        blocks: &[super::BlockPlan],
        services_by_id: &std::collections::HashMap<Uuid, Service>,
    ) -> Result<(), AppError> {
        for block in blocks {
            let block_row = sqlx::query(
                r#"
                INSERT INTO appointment_blocks (appointment_id, sequence, worker_id, start_datetime, end_datetime)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(appointment_id)
            .bind(block.sequence)
            .bind(block.worker_id)
            .bind(block.start)
            .bind(block.end)
            .fetch_one(&mut **tx)
            .await
            .map_err(map_unique_violation)?;

            let block_id: Uuid = block_row.get("id");

            for service_id in &block.service_ids {
                let service = services_by_id
                    .get(service_id)
                    .ok_or_else(|| AppError::Validation(format!("unknown service {service_id}")))?;
                if !service.active {
                    return Err(AppError::Validation(format!("service {service_id} is not active")));
                }

                sqlx::query(
                    r#"
                    INSERT INTO appointment_service_lines (
                        block_id, service_id, service_name_snapshot, duration_minutes_snapshot,
                        buffer_before_snapshot, buffer_after_snapshot, price_snapshot
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(block_id)
                .bind(service.id)
                .bind(&service.name)
                .bind(service.duration_minutes)
                .bind(service.buffer_before_minutes)
                .bind(service.buffer_after_minutes)
                .bind(service.price)
                .execute(&mut **tx)
                .await?;
            }
        }
        Ok(())
    }

    async fn fetch_services_for_plan(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        blocks: &[super::BlockPlan],
    ) -> Result<std::collections::HashMap<Uuid, Service>, AppError> {
        let ids: Vec<Uuid> = blocks.iter().flat_map(|b| b.service_ids.iter().copied()).collect();
        let rows = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut **tx)
            .await?;
        Ok(rows.into_iter().map(|s| (s.id, s)).collect())
    }
}

/// Maps a unique-constraint violation on `appointment_blocks` (the storage
/// backstop of §4.5 step 3d / §5) to `AppError::Conflict`; anything else
/// from sqlx is an ordinary database error.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return AppError::Conflict("worker already has a block at that start time".to_string());
        }
    }
    AppError::from(err)
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn list_active_workers(&self) -> Result<Vec<Worker>, AppError> {
        Ok(
            sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE active = true ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>, AppError> {
        Ok(sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_weekly_rules(&self, worker_id: Uuid) -> Result<Vec<WeeklyScheduleRule>, AppError> {
        Ok(sqlx::query_as::<_, WeeklyScheduleRule>(
            "SELECT * FROM weekly_schedule_rules WHERE worker_id = $1 AND active = true",
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_recurring_breaks(&self, worker_id: Uuid) -> Result<Vec<RecurringBreak>, AppError> {
        Ok(sqlx::query_as::<_, RecurringBreak>("SELECT * FROM recurring_breaks WHERE worker_id = $1")
            .bind(worker_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_exceptions(&self, worker_id: Uuid, date: NaiveDate) -> Result<Vec<CalendarException>, AppError> {
        Ok(sqlx::query_as::<_, CalendarException>(
            "SELECT * FROM calendar_exceptions WHERE worker_id = $1 AND date = $2 ORDER BY id",
        )
        .bind(worker_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        Ok(sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_services(&self, ids: &[Uuid]) -> Result<Vec<Service>, AppError> {
        Ok(sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<ServiceCategory>, AppError> {
        Ok(sqlx::query_as::<_, ServiceCategory>("SELECT * FROM service_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_customer_frequent(&self, phone: &str, birth_date: NaiveDate) -> Result<Option<Customer>, AppError> {
        Ok(sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE customer_type = 'FREQUENT' AND phone = $1 AND birth_date = $2",
        )
        .bind(phone)
        .bind(birth_date)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_busy_blocks(&self, worker_id: Uuid, window: Interval) -> Result<Vec<Interval>, AppError> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT b.start_datetime, b.end_datetime
            FROM appointment_blocks b
            JOIN appointments a ON a.id = b.appointment_id
            WHERE b.worker_id = $1
              AND a.status IN ('RESERVED', 'ATTENDED')
              AND b.start_datetime < $3
              AND b.end_datetime > $2
            ORDER BY b.start_datetime
            "#,
        )
        .bind(worker_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(|(s, e)| Interval::new(s, e)).collect())
    }

    async fn reserve(&self, plan: ReservationPlan, customer: CustomerInput) -> Result<Uuid, AppError> {
        customer
            .validate_shape()
            .map_err(AppError::Validation)?;

        let mut tx = self.pool.begin().await?;

        let worker_ids: Vec<Uuid> = plan.blocks.iter().map(|b| b.worker_id).collect();
        self.lock_workers(&mut tx, worker_ids).await?;
        self.check_block_conflicts(&mut tx, &plan.blocks, None).await?;

        let services_by_id = self.fetch_services_for_plan(&mut tx, &plan.blocks).await?;
        let subtotal: Decimal = plan
            .blocks
            .iter()
            .flat_map(|b| b.service_ids.iter())
            .filter_map(|id| services_by_id.get(id))
            .map(|s| s.price)
            .sum();

        let customer_id = self.resolve_customer(&mut tx, &customer).await?;

        let appointment_row = sqlx::query(
            r#"
            INSERT INTO appointments (
                customer_id, status, start_datetime, end_datetime, created_channel,
                recommended_subtotal, recommended_discount, recommended_total
            )
            VALUES ($1, 'RESERVED', $2, $3, $4, $5, 0, $5)
            RETURNING id
            "#,
        )
        .bind(customer_id)
        .bind(plan.appointment_start)
        .bind(plan.appointment_end)
        .bind(plan.created_channel)
        .bind(subtotal)
        .fetch_one(&mut *tx)
        .await?;

        let appointment_id: Uuid = appointment_row.get("id");

        self.insert_blocks_and_lines(&mut tx, appointment_id, &plan.blocks, &services_by_id)
            .await?;

        tx.commit().await?;

        let detail = serde_json::json!({ "option_id": plan.option_id, "channel": plan.created_channel });
        let _ = self
            .append_audit(appointment_id, AuditAction::Create, None, None, Some(detail))
            .await;

        Ok(appointment_id)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        Ok(sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn cancel(
        &self,
        appointment_id: Uuid,
        performed_by: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1 FOR UPDATE")
            .bind(appointment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id} not found")))?;

        if existing.status == AppointmentStatus::Cancelled {
            tx.commit().await?;
            return Ok(existing); // idempotent (§4.6, §8 property 7)
        }

        if existing.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "appointment is {:?} and cannot be cancelled",
                existing.status
            )));
        }

        let freed_blocks: Vec<(i16, Uuid)> = sqlx::query_as(
            "SELECT sequence, worker_id FROM appointment_blocks WHERE appointment_id = $1 ORDER BY sequence",
        )
        .bind(appointment_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM appointment_blocks WHERE appointment_id = $1")
            .bind(appointment_id)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = 'CANCELLED', cancel_reason = $1, cancelled_at = now(), cancelled_by = $2, updated_at = now()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&reason)
        .bind(performed_by)
        .bind(appointment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let summary = freed_blocks
            .iter()
            .map(|(seq, worker_id)| format!("block {seq} (worker {worker_id}) freed"))
            .collect::<Vec<_>>()
            .join("; ");
        let detail = serde_json::json!({ "freed_blocks": summary });
        let _ = self
            .append_audit(appointment_id, AuditAction::Cancel, performed_by, reason, Some(detail))
            .await;

        Ok(updated)
    }

    async fn mark_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        performed_by: Option<Uuid>,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1 FOR UPDATE")
            .bind(appointment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id} not found")))?;

        if !existing.status.can_transition_to(new_status) {
            return Err(AppError::InvalidState(format!(
                "cannot transition from {:?} to {:?}",
                existing.status, new_status
            )));
        }

        let updated = sqlx::query_as::<_, Appointment>(
            "UPDATE appointments SET status = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(new_status)
        .bind(appointment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let detail = serde_json::json!({ "from": existing.status, "to": new_status });
        let _ = self
            .append_audit(appointment_id, AuditAction::StatusChange, performed_by, None, Some(detail))
            .await;

        Ok(updated)
    }

    async fn register_payment(
        &self,
        appointment_id: Uuid,
        paid_total: Decimal,
        payment_method: Option<PaymentMethod>,
        performed_by: Option<Uuid>,
    ) -> Result<Appointment, AppError> {
        if paid_total < Decimal::ZERO {
            return Err(AppError::Validation("paid_total must be >= 0".to_string()));
        }

        let updated = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET paid_total = $1, payment_method = $2, paid_at = now(), paid_by = $3, updated_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(paid_total)
        .bind(payment_method)
        .bind(performed_by)
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id} not found")))?;

        let detail = serde_json::json!({ "paid_total": paid_total, "payment_method": payment_method });
        let _ = self
            .append_audit(appointment_id, AuditAction::PaymentRecorded, performed_by, None, Some(detail))
            .await;

        Ok(updated)
    }

    async fn reschedule(
        &self,
        appointment_id: Uuid,
        plan: ReservationPlan,
        performed_by: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1 FOR UPDATE")
            .bind(appointment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id} not found")))?;

        if existing.status != AppointmentStatus::Reserved {
            return Err(AppError::InvalidState(
                "only RESERVED appointments can be rescheduled".to_string(),
            ));
        }

        let existing_blocks: Vec<AppointmentBlock> =
            sqlx::query_as("SELECT * FROM appointment_blocks WHERE appointment_id = $1 ORDER BY sequence")
                .bind(appointment_id)
                .fetch_all(&mut *tx)
                .await?;

        let mut existing_workers: Vec<Uuid> = existing_blocks.iter().map(|b| b.worker_id).collect();
        existing_workers.sort();
        existing_workers.dedup();

        let mut new_workers: Vec<Uuid> = plan.blocks.iter().map(|b| b.worker_id).collect();
        new_workers.sort();
        new_workers.dedup();

        if existing_workers != new_workers {
            return Err(AppError::Validation(
                "reschedule must preserve the original set of workers".to_string(),
            ));
        }

        self.lock_workers(&mut tx, new_workers).await?;
        self.check_block_conflicts(&mut tx, &plan.blocks, Some(appointment_id)).await?;

        let before = format!(
            "{} -> {}",
            existing.start_datetime.to_rfc3339(),
            existing.end_datetime.to_rfc3339()
        );

        for block in &plan.blocks {
            sqlx::query(
                r#"
                UPDATE appointment_blocks
                SET sequence = $1, start_datetime = $2, end_datetime = $3
                WHERE appointment_id = $4 AND worker_id = $5
                "#,
            )
            .bind(block.sequence)
            .bind(block.start)
            .bind(block.end)
            .bind(appointment_id)
            .bind(block.worker_id)
            .execute(&mut *tx)
            .await
            .map_err(map_unique_violation)?;
        }

        let updated = sqlx::query_as::<_, Appointment>(
            "UPDATE appointments SET start_datetime = $1, end_datetime = $2, updated_at = now() WHERE id = $3 RETURNING *",
        )
        .bind(plan.appointment_start)
        .bind(plan.appointment_end)
        .bind(appointment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let after = format!(
            "{} -> {}",
            plan.appointment_start.to_rfc3339(),
            plan.appointment_end.to_rfc3339()
        );
        let detail = serde_json::json!({ "before": before, "after": after });
        let _ = self
            .append_audit(appointment_id, AuditAction::Reschedule, performed_by, reason, Some(detail))
            .await;

        Ok(updated)
    }

    async fn inline_edit(
        &self,
        appointment_id: Uuid,
        new_start: Option<DateTime<Utc>>,
        new_end: Option<DateTime<Utc>>,
        new_status: Option<AppointmentStatus>,
        note: Option<String>,
        performed_by: Option<Uuid>,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1 FOR UPDATE")
            .bind(appointment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id} not found")))?;

        if let Some(status) = new_status {
            if !existing.status.can_transition_to(status) && status != existing.status {
                return Err(AppError::InvalidState(format!(
                    "cannot transition from {:?} to {:?}",
                    existing.status, status
                )));
            }
        }

        let start = new_start.unwrap_or(existing.start_datetime);
        let end = new_end.unwrap_or(existing.end_datetime);
        let status = new_status.unwrap_or(existing.status);

        // Inline edit deliberately skips availability checks (§4.6); blocks
        // are re-synchronized to the new window by even proportional shift.
        if new_start.is_some() || new_end.is_some() {
            let shift = start - existing.start_datetime;
            let new_duration = end - start;
            let old_duration = existing.end_datetime - existing.start_datetime;
            let scale = if old_duration.num_seconds() > 0 {
                new_duration.num_seconds() as f64 / old_duration.num_seconds() as f64
            } else {
                1.0
            };

            let blocks: Vec<AppointmentBlock> =
                sqlx::query_as("SELECT * FROM appointment_blocks WHERE appointment_id = $1 ORDER BY sequence")
                    .bind(appointment_id)
                    .fetch_all(&mut *tx)
                    .await?;

            for block in blocks {
                let block_duration = block.end_datetime - block.start_datetime;
                let scaled = chrono::Duration::seconds((block_duration.num_seconds() as f64 * scale).round() as i64);
                let new_block_start = block.start_datetime + shift;
                let new_block_end = new_block_start + scaled;

                sqlx::query("UPDATE appointment_blocks SET start_datetime = $1, end_datetime = $2 WHERE id = $3")
                    .bind(new_block_start)
                    .bind(new_block_end)
                    .bind(block.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_unique_violation)?;
            }
        }

        let updated = sqlx::query_as::<_, Appointment>(
            "UPDATE appointments SET start_datetime = $1, end_datetime = $2, status = $3, updated_at = now() WHERE id = $4 RETURNING *",
        )
        .bind(start)
        .bind(end)
        .bind(status)
        .bind(appointment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let detail = serde_json::json!({
            "before": { "start": existing.start_datetime, "end": existing.end_datetime, "status": existing.status },
            "after": { "start": start, "end": end, "status": status },
        });
        let _ = self
            .append_audit(appointment_id, AuditAction::InlineEdit, performed_by, note, Some(detail))
            .await;

        Ok(updated)
    }

    async fn append_audit(
        &self,
        appointment_id: Uuid,
        action: AuditAction,
        performed_by: Option<Uuid>,
        reason: Option<String>,
        detail: Option<serde_json::Value>,
    ) -> Result<AppointmentAudit, AppError> {
        Ok(sqlx::query_as::<_, AppointmentAudit>(
            r#"
            INSERT INTO appointment_audits (appointment_id, action, performed_by, reason, detail)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(appointment_id)
        .bind(action)
        .bind(performed_by)
        .bind(reason)
        .bind(detail)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn staff_day_view(&self, date: NaiveDate, filter: AgendaFilter) -> Result<Vec<AppointmentWithBlocks>, AppError> {
        let day_start = DateTime::<Utc>::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0).unwrap(), Utc);
        let day_end = day_start + chrono::Duration::days(1);

        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT DISTINCT a.* FROM appointments a
            LEFT JOIN appointment_blocks b ON b.appointment_id = a.id
            LEFT JOIN customers c ON c.id = a.customer_id
            WHERE a.start_datetime >= $1 AND a.start_datetime < $2
              AND ($3::uuid IS NULL OR b.worker_id = $3)
              AND ($4::varchar IS NULL OR a.status = $4)
              AND ($5::text IS NULL OR c.name ILIKE '%' || $5 || '%' OR c.phone ILIKE '%' || $5 || '%')
            ORDER BY a.start_datetime
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .bind(filter.worker_id)
        .bind(filter.status)
        .bind(filter.query.as_deref())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_appointments(appointments).await
    }

    async fn worker_day_view(&self, worker_id: Uuid, date: NaiveDate) -> Result<Vec<AppointmentWithBlocks>, AppError> {
        let day_start = DateTime::<Utc>::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0).unwrap(), Utc);
        let day_end = day_start + chrono::Duration::days(1);

        let appointments = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT DISTINCT a.* FROM appointments a
            JOIN appointment_blocks b ON b.appointment_id = a.id
            WHERE b.worker_id = $1 AND a.start_datetime >= $2 AND a.start_datetime < $3
            ORDER BY a.start_datetime
            "#,
        )
        .bind(worker_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_appointments(appointments).await
    }
}

impl PgBookingRepository {
    /// Bulk-loads blocks, workers, and service lines for a set of
    /// appointments in three queries total, avoiding N+1 (§4.7).
    async fn hydrate_appointments(&self, appointments: Vec<Appointment>) -> Result<Vec<AppointmentWithBlocks>, AppError> {
        if appointments.is_empty() {
            return Ok(Vec::new());
        }
        let appointment_ids: Vec<Uuid> = appointments.iter().map(|a| a.id).collect();

        let blocks: Vec<AppointmentBlock> = sqlx::query_as(
            "SELECT * FROM appointment_blocks WHERE appointment_id = ANY($1) ORDER BY appointment_id, sequence",
        )
        .bind(&appointment_ids)
        .fetch_all(&self.pool)
        .await?;

        let block_ids: Vec<Uuid> = blocks.iter().map(|b| b.id).collect();
        let lines: Vec<AppointmentServiceLine> = sqlx::query_as(
            "SELECT * FROM appointment_service_lines WHERE block_id = ANY($1)",
        )
        .bind(&block_ids)
        .fetch_all(&self.pool)
        .await?;

        let worker_ids: Vec<Uuid> = blocks.iter().map(|b| b.worker_id).collect();
        let workers: Vec<Worker> = sqlx::query_as("SELECT * FROM workers WHERE id = ANY($1)")
            .bind(&worker_ids)
            .fetch_all(&self.pool)
            .await?;
        let worker_names: std::collections::HashMap<Uuid, String> =
            workers.into_iter().map(|w| (w.id, w.display_name)).collect();

        let mut result = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let blocks_for_appt: Vec<AppointmentBlockWithLines> = blocks
                .iter()
                .filter(|b| b.appointment_id == appointment.id)
                .map(|b| AppointmentBlockWithLines {
                    block: b.clone(),
                    worker_display_name: worker_names.get(&b.worker_id).cloned().unwrap_or_default(),
                    service_lines: lines.iter().filter(|l| l.block_id == b.id).cloned().collect(),
                })
                .collect();

            result.push(AppointmentWithBlocks {
                appointment,
                blocks: blocks_for_appt,
            });
        }

        Ok(result)
    }
}
