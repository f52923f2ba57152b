/*!
 * Principal
 *
 * The already-resolved caller identity the core receives from an upstream
 * gateway. Authentication and role resolution themselves are out of scope;
 * this module only models the shape of what the core consumes.
 */

use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Caller role. PUBLIC is the unauthenticated caller of the public endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Public,
    Worker,
    Staff,
    Admin,
}

impl Role {
    pub fn is_staff_or_admin(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

/// The resolved caller, as handed to the core by the upstream gateway.
#[derive(Debug, Clone)]
pub struct Principal {
    pub role: Role,
    /// Present when role == Worker: the Worker record this principal is bound to.
    pub worker_id: Option<Uuid>,
}

impl Principal {
    pub fn public() -> Self {
        Self {
            role: Role::Public,
            worker_id: None,
        }
    }

    pub fn staff() -> Self {
        Self {
            role: Role::Staff,
            worker_id: None,
        }
    }

    pub fn is_staff_or_admin(&self) -> bool {
        self.role.is_staff_or_admin()
    }
}
