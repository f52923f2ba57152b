/*!
 * Customer Model
 *
 * Identity for the person receiving service. A CASUAL customer is created
 * ad hoc by a public reservation and stores only a name; a FREQUENT
 * customer must pre-exist (created by staff) and is looked up by
 * (phone, birth_date) during public reservation.
 */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::Type;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerType {
    Casual,
    Frequent,
}

/// A customer row as stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub customer_type: CustomerType,
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Customer input carried inside a public reservation request (§4.5).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerInput {
    pub customer_type: CustomerType,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl CustomerInput {
    /// Validate the cross-field invariants of §3/§4.5 that `validator`
    /// attributes alone cannot express: FREQUENT requires both phone and
    /// birth_date; CASUAL must not carry them.
    pub fn validate_shape(&self) -> Result<(), String> {
        match self.customer_type {
            CustomerType::Frequent => {
                if self.phone.is_none() || self.birth_date.is_none() {
                    return Err(
                        "frequent customers require phone and birth_date".to_string(),
                    );
                }
            }
            CustomerType::Casual => {
                if self.phone.is_some() || self.birth_date.is_some() {
                    return Err(
                        "casual customers must not provide phone or birth_date".to_string(),
                    );
                }
            }
        }
        Ok(())
    }
}
