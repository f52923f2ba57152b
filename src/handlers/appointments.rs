/*!
 * Staff Appointment Lifecycle HTTP Handlers
 *
 * Cancel, Attend, NoShow, Payment, Reschedule, InlineEdit (§4.6, §6).
 * All require role ∈ {STAFF, ADMIN}; the lifecycle service enforces this
 * itself, so handlers stay thin.
 */

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, Principal};
use crate::state::AppState;
use crate::utils::errors::Result;

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
    #[serde(default)]
    pub force: bool,
}

/// POST /appointments/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<Appointment>> {
    let appointment = state
        .lifecycle_service
        .cancel(&principal, appointment_id, request.reason, request.force, Utc::now())
        .await?;
    Ok(Json(appointment))
}

/// POST /appointments/{id}/attend
pub async fn attend(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>> {
    let appointment = state.lifecycle_service.mark_attended(&principal, appointment_id).await?;
    Ok(Json(appointment))
}

/// POST /appointments/{id}/no-show
pub async fn no_show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>> {
    let appointment = state.lifecycle_service.mark_no_show(&principal, appointment_id).await?;
    Ok(Json(appointment))
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub paid_total: Decimal,
    pub payment_method: Option<String>,
}

/// POST /appointments/{id}/payment
pub async fn register_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<Appointment>> {
    let appointment = state
        .lifecycle_service
        .register_payment(&principal, appointment_id, request.paid_total, request.payment_method)
        .await?;
    Ok(Json(appointment))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub option_token: String,
    pub reason: Option<String>,
}

/// POST /staff/appointments/{id}/reschedule
pub async fn reschedule(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Appointment>> {
    let appointment = state
        .lifecycle_service
        .reschedule(&principal, appointment_id, &request.option_token, request.reason, Utc::now())
        .await?;
    Ok(Json(appointment))
}

#[derive(Debug, Deserialize)]
pub struct InlineEditRequest {
    pub new_start: Option<DateTime<Utc>>,
    pub new_end: Option<DateTime<Utc>>,
    pub new_status: Option<AppointmentStatus>,
    pub note: Option<String>,
}

/// POST /staff/appointments/{id}/inline-edit
pub async fn inline_edit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<InlineEditRequest>,
) -> Result<Json<Appointment>> {
    let appointment = state
        .lifecycle_service
        .inline_edit(
            &principal,
            appointment_id,
            request.new_start,
            request.new_end,
            request.new_status,
            request.note,
        )
        .await?;
    Ok(Json(appointment))
}
