/*!
 * Reservation Service (C5)
 *
 * Generates availability options (C3 wired to live worker calendars) and
 * turns a chosen option token (C4) into a committed Appointment, following
 * §4.5's verify → validate-customer → lock → conflict-check → insert →
 * audit shape.
 */

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::domain::{self, BookingOption, Interval, OptionRequest};
use crate::models::{CreatedChannel, CustomerInput, Principal, Role, Service, ServiceCategory, Worker};
use crate::repository::{BlockPlan, BookingRepository, ReservationPlan};
use crate::utils::errors::AppError;

pub struct ReservationService {
    repo: Arc<dyn BookingRepository>,
    config: BookingConfig,
}

impl ReservationService {
    pub fn new(repo: Arc<dyn BookingRepository>, config: BookingConfig) -> Self {
        Self { repo, config }
    }

    /// Computes the [shop-midnight, next shop-midnight) window for `date`,
    /// in UTC, used both as the free-interval window and the busy-block
    /// query window (§4.2).
    fn day_window(&self, date: NaiveDate) -> Result<Interval, AppError> {
        let naive_start = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        let start = match self.config.shop_timezone.from_local_datetime(&naive_start) {
            chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
            chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            chrono::LocalResult::None => {
                return Err(AppError::Internal(format!(
                    "shop midnight on {date} does not exist in {}",
                    self.config.shop_timezone
                )))
            }
        };
        let end = start + chrono::Duration::days(1);
        Interval::new(start, end).ok_or_else(|| AppError::Internal("empty day window".to_string()))
    }

    /// Builds the per-worker free-interval cache (§5's per-request cache)
    /// for every active worker, for the target date.
    async fn free_intervals_by_worker(
        &self,
        date: NaiveDate,
        window: Interval,
        workers: &HashMap<Uuid, Worker>,
    ) -> Result<HashMap<Uuid, Vec<Interval>>, AppError> {
        let day_of_week = crate::models::DayOfWeek::from_chrono(date.weekday()).0;
        let mut free_by_worker = HashMap::with_capacity(workers.len());

        for worker in workers.values() {
            let rules: Vec<_> = self
                .repo
                .list_weekly_rules(worker.id)
                .await?
                .into_iter()
                .filter(|r| r.day_of_week == day_of_week)
                .collect();
            let breaks: Vec<_> = self
                .repo
                .list_recurring_breaks(worker.id)
                .await?
                .into_iter()
                .filter(|b| b.day_of_week == day_of_week)
                .collect();
            let exceptions = self.repo.list_exceptions(worker.id, date).await?;
            let busy = self.repo.list_busy_blocks(worker.id, window).await?;

            let free = domain::free_intervals(
                date,
                self.config.shop_timezone,
                window,
                &rules,
                &breaks,
                &exceptions,
                &busy,
            );
            free_by_worker.insert(worker.id, free);
        }

        Ok(free_by_worker)
    }

    /// GenerateOptions(date, request) — resolves the catalog and live
    /// calendars, then delegates to the pure C3 algorithm (§4.3).
    #[instrument(skip(self), fields(date = %date, service_count = request.service_ids.len()))]
    pub async fn generate_options(
        &self,
        date: NaiveDate,
        request: OptionRequest,
    ) -> Result<Vec<BookingOption>, AppError> {
        let service_rows = self.repo.list_services(&request.service_ids).await?;
        if service_rows.len() != request.service_ids.len() {
            return Err(AppError::Validation(
                "one or more requested services do not exist".to_string(),
            ));
        }
        if let Some(inactive) = service_rows.iter().find(|s| !s.active) {
            return Err(AppError::Validation(format!("service {} is not active", inactive.id)));
        }
        let services: HashMap<Uuid, Service> = service_rows.into_iter().map(|s| (s.id, s)).collect();

        let mut categories: HashMap<Uuid, ServiceCategory> = HashMap::new();
        for service in services.values() {
            if categories.contains_key(&service.category_id) {
                continue;
            }
            let category = self
                .repo
                .get_category(service.category_id)
                .await?
                .ok_or_else(|| AppError::Internal(format!("service {} references a missing category", service.id)))?;
            categories.insert(category.id, category);
        }

        let workers: HashMap<Uuid, Worker> = self
            .repo
            .list_active_workers()
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        let window = self.day_window(date)?;
        let free_by_worker = self.free_intervals_by_worker(date, window, &workers).await?;

        let options = domain::generate_options(&request, &services, &categories, &workers, &free_by_worker)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        tracing::info!(option_count = options.len(), "generated booking options");
        Ok(options)
    }

    /// Reserve(principal, token, customer_input) → AppointmentId (§4.5).
    #[instrument(skip(self, token, customer, principal), fields(role = ?principal.role))]
    pub async fn reserve(
        &self,
        principal: &Principal,
        token: &str,
        customer: CustomerInput,
        now_epoch: i64,
    ) -> Result<Uuid, AppError> {
        let decoded = domain::decode_option_token(
            token,
            self.config.option_token_secret(),
            now_epoch,
            self.config.option_token_ttl_seconds,
        )?;

        let channel = if principal.role == Role::Public {
            CreatedChannel::Client
        } else {
            CreatedChannel::Staff
        };

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
            created_channel: channel,
        };

        let appointment_id = self.repo.reserve(plan, customer).await?;
        tracing::info!(%appointment_id, "appointment reserved");
        Ok(appointment_id)
    }
}
