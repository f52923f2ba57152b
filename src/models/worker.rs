/*!
 * Worker Model
 *
 * A service provider. Workers are never hard-deleted once referenced by a
 * block; soft-deactivate via `active = false` instead.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::Type;
use uuid::Uuid;

/// The role category a worker serves. This also doubles as the "group" a
/// service is assigned to (§4.3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerRole {
    Barber,
    Nails,
    Facial,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Worker {
    pub id: Uuid,
    pub role: WorkerRole,
    pub display_name: String,
    pub active: bool,
    pub principal_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
