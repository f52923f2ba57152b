/*!
 * Agenda HTTP Handlers
 *
 * `GET /agenda/staff` (staff/admin) and `GET /agenda/my` (worker) (§4.7, §6).
 */

use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{AppointmentStatus, AppointmentWithBlocks, Principal, Role};
use crate::repository::AgendaFilter;
use crate::state::AppState;
use crate::utils::errors::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct StaffAgendaQuery {
    pub date: NaiveDate,
    pub worker_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub q: Option<String>,
}

/// GET /agenda/staff?date=...&worker_id=...&status=...&q=...
pub async fn staff_day_view(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StaffAgendaQuery>,
) -> Result<Json<Vec<AppointmentWithBlocks>>> {
    if !principal.is_staff_or_admin() {
        return Err(AppError::Forbidden("staff or admin role required".to_string()));
    }

    let filter = AgendaFilter {
        worker_id: query.worker_id,
        status: query.status,
        query: query.q,
    };

    let appointments = state.agenda_service.staff_day_view(query.date, filter).await?;
    Ok(Json(appointments))
}

#[derive(Debug, Deserialize)]
pub struct MyAgendaQuery {
    pub date: NaiveDate,
}

/// GET /agenda/my?date=...
pub async fn worker_day_view(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<MyAgendaQuery>,
) -> Result<Json<Vec<AppointmentWithBlocks>>> {
    if principal.role != Role::Worker {
        return Err(AppError::Forbidden("a worker-bound principal is required".to_string()));
    }
    let worker_id = principal
        .worker_id
        .ok_or_else(|| AppError::Internal("WORKER principal missing worker_id".to_string()))?;

    let appointments = state.agenda_service.worker_day_view(worker_id, query.date).await?;
    Ok(Json(appointments))
}
