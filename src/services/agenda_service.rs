/*!
 * Agenda Views (C7)
 *
 * Read-only projections over appointments for a given day: the staff-wide
 * view (with optional worker/status/text filters) and a single worker's own
 * view (§4.7). Both delegate bulk-loading to the repository facade to avoid
 * N+1 queries; this service only applies the worker-binding rule for the
 * "my agenda" endpoint.
 */

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;
use uuid::Uuid;

use crate::models::AppointmentWithBlocks;
use crate::repository::{AgendaFilter, BookingRepository};
use crate::utils::errors::AppError;

pub struct AgendaService {
    repo: Arc<dyn BookingRepository>,
}

impl AgendaService {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    /// Staff day view(date, filters) (§4.7). Open to any staff/admin
    /// principal; role gating happens at the handler/middleware layer.
    #[instrument(skip(self), fields(%date))]
    pub async fn staff_day_view(
        &self,
        date: NaiveDate,
        filter: AgendaFilter,
    ) -> Result<Vec<AppointmentWithBlocks>, AppError> {
        self.repo.staff_day_view(date, filter).await
    }

    /// Worker day view(date) for the worker the caller is bound to (§4.7).
    #[instrument(skip(self), fields(%date, %worker_id))]
    pub async fn worker_day_view(&self, worker_id: Uuid, date: NaiveDate) -> Result<Vec<AppointmentWithBlocks>, AppError> {
        self.repo
            .get_worker(worker_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("worker {worker_id} not found")))?;
        self.repo.worker_day_view(worker_id, date).await
    }
}
