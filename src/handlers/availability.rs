/*!
 * Availability HTTP Handler
 *
 * `POST /availability/options` (§6). Public, unauthenticated, and the
 * heaviest endpoint in the system — see §13 for the per-IP throttle this
 * router sits behind.
 */

use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{self, BarberChoice, OptionRequest};
use crate::state::AppState;
use crate::utils::errors::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct TimeWindowParam {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub date: NaiveDate,
    pub service_ids: Vec<Uuid>,
    pub barber_choice: BarberChoiceParam,
    pub barber_id: Option<Uuid>,
    pub slot_interval_minutes: Option<i64>,
    pub limit: Option<usize>,
    pub time_window: Option<TimeWindowParam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarberChoiceParam {
    Specific,
    Nearest,
}

#[derive(Debug, Serialize)]
pub struct OptionServiceDto {
    pub id: Uuid,
    pub name: String,
    pub duration: i32,
    pub buffer_before: i32,
    pub buffer_after: i32,
}

#[derive(Debug, Serialize)]
pub struct OptionBlockDto {
    pub sequence: i16,
    pub worker_id: Uuid,
    pub start: chrono::DateTime<Utc>,
    pub end: chrono::DateTime<Utc>,
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BookingOptionDto {
    pub option_id: Uuid,
    pub option_token: String,
    pub appointment_start: chrono::DateTime<Utc>,
    pub appointment_end: chrono::DateTime<Utc>,
    pub gap_total_minutes: i64,
    pub blocks: Vec<OptionBlockDto>,
}

/// POST /availability/options
pub async fn generate_options(
    State(state): State<AppState>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<Vec<BookingOptionDto>>> {
    if request.service_ids.is_empty() {
        return Err(AppError::Validation("service_ids must not be empty".to_string()));
    }

    let barber_choice = match request.barber_choice {
        BarberChoiceParam::Specific => {
            let id = request
                .barber_id
                .ok_or_else(|| AppError::Validation("barber_id is required for SPECIFIC choice".to_string()))?;
            BarberChoice::Specific(id)
        }
        BarberChoiceParam::Nearest => BarberChoice::Nearest,
    };

    let option_request = OptionRequest {
        service_ids: request.service_ids.clone(),
        barber_choice,
        slot_interval_minutes: request
            .slot_interval_minutes
            .unwrap_or(state.booking.slot_interval_minutes),
        limit: request.limit.unwrap_or(state.booking.options_limit),
    };

    let mut options = state
        .reservation_service
        .generate_options(request.date, option_request)
        .await?;

    if let Some(window) = request.time_window {
        options.retain(|opt| {
            let local = state.booking.shop_timezone.from_utc_datetime(&opt.appointment_start.naive_utc());
            let time_of_day = local.time();
            time_of_day >= window.start && time_of_day < window.end
        });
    }

    let now_epoch = Utc::now().timestamp();
    let dtos = options
        .iter()
        .map(|opt| {
            let option_token = domain::encode_option_token(opt, state.booking.option_token_secret(), now_epoch);
            BookingOptionDto {
                option_id: opt.option_id,
                option_token,
                appointment_start: opt.appointment_start,
                appointment_end: opt.appointment_end,
                gap_total_minutes: opt.gap_total_minutes,
                blocks: opt
                    .blocks
                    .iter()
                    .map(|b| OptionBlockDto {
                        sequence: b.sequence,
                        worker_id: b.worker_id,
                        start: b.start,
                        end: b.end,
                        service_ids: b.service_ids.clone(),
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(Json(dtos))
}
