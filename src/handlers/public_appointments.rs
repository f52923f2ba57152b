/*!
 * Public Appointments HTTP Handler
 *
 * `POST /public/appointments` (§6). Public, unauthenticated; also behind
 * the §13 per-IP throttle.
 */

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CustomerInput, Principal};
use crate::state::AppState;
use crate::utils::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct PublicReservationRequest {
    /// Echoed back from the `GenerateOptions` response for the client's own
    /// bookkeeping; the server never looks this up — the self-contained
    /// `option_token` below is what's actually verified (§4.4).
    pub option_id: Option<Uuid>,
    pub option_token: String,
    #[validate(nested)]
    pub customer: CustomerInput,
}

#[derive(Debug, Serialize)]
pub struct AppointmentSummary {
    pub appointment_id: Uuid,
    pub status: &'static str,
}

/// POST /public/appointments
pub async fn reserve(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<PublicReservationRequest>,
) -> Result<(StatusCode, Json<AppointmentSummary>)> {
    request
        .customer
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    request
        .customer
        .validate_shape()
        .map_err(AppError::Validation)?;

    let now_epoch = chrono::Utc::now().timestamp();
    let appointment_id = state
        .reservation_service
        .reserve(&principal, &request.option_token, request.customer, now_epoch)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AppointmentSummary {
            appointment_id,
            status: "RESERVED",
        }),
    ))
}
