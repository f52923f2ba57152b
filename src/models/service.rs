/*!
 * Service Catalog Model
 *
 * Services and categories. Read-only from the core's point of view (§4.8,
 * §12) — CRUD lives in an out-of-scope admin surface; the core only
 * resolves the assignment group a service belongs to (§4.3).
 */

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use super::worker::WorkerRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentType {
    RoleBased,
    FixedWorker,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub default_fixed_worker: Option<Uuid>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub duration_minutes: i32,
    pub buffer_before_minutes: i32,
    pub buffer_after_minutes: i32,
    pub price: Decimal,
    pub active: bool,
    pub assignment_type: AssignmentType,
    pub fixed_worker: Option<Uuid>,
}

impl Service {
    /// buffer_before + duration + buffer_after — the amount of block time
    /// this service consumes (§4.3, GLOSSARY).
    pub fn effective_minutes(&self) -> i32 {
        self.buffer_before_minutes + self.duration_minutes + self.buffer_after_minutes
    }
}

/// The assignment group a service contributes to (§4.3). Resolved from the
/// service itself, falling back to its category's default fixed worker,
/// falling back to the flat BARBER group.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum AssignmentGroup {
    Barber,
    Fixed(WorkerRole, Uuid),
}

impl AssignmentGroup {
    pub fn role(&self) -> WorkerRole {
        match self {
            AssignmentGroup::Barber => WorkerRole::Barber,
            AssignmentGroup::Fixed(role, _) => *role,
        }
    }

    /// Resolve a service's assignment group per §4.3:
    /// 1. FIXED_WORKER service -> that worker's role group.
    /// 2. Else category.default_fixed_worker -> that worker's role group.
    /// 3. Else BARBER.
    pub fn resolve(
        service: &Service,
        category: &ServiceCategory,
        fixed_worker_role: impl Fn(Uuid) -> Option<WorkerRole>,
    ) -> Result<Self, String> {
        if service.assignment_type == AssignmentType::FixedWorker {
            let worker_id = service
                .fixed_worker
                .ok_or_else(|| "FIXED_WORKER service missing fixed_worker".to_string())?;
            let role = fixed_worker_role(worker_id)
                .ok_or_else(|| format!("unknown fixed_worker {worker_id}"))?;
            return Ok(AssignmentGroup::Fixed(role, worker_id));
        }
        if let Some(worker_id) = category.default_fixed_worker {
            if let Some(role) = fixed_worker_role(worker_id) {
                return Ok(AssignmentGroup::Fixed(role, worker_id));
            }
        }
        Ok(AssignmentGroup::Barber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(assignment_type: AssignmentType, fixed_worker: Option<Uuid>) -> Service {
        Service {
            id: Uuid::new_v4(),
            name: "Haircut".to_string(),
            category_id: Uuid::new_v4(),
            duration_minutes: 30,
            buffer_before_minutes: 5,
            buffer_after_minutes: 10,
            price: Decimal::new(2000, 2),
            active: true,
            assignment_type,
            fixed_worker,
        }
    }

    #[test]
    fn effective_minutes_sums_buffers_and_duration() {
        let s = service(AssignmentType::RoleBased, None);
        assert_eq!(s.effective_minutes(), 45);
    }

    #[test]
    fn role_based_resolves_to_barber_group() {
        let s = service(AssignmentType::RoleBased, None);
        let cat = ServiceCategory {
            id: s.category_id,
            name: "Hair".to_string(),
            active: true,
            default_fixed_worker: None,
        };
        let group = AssignmentGroup::resolve(&s, &cat, |_| None).unwrap();
        assert_eq!(group, AssignmentGroup::Barber);
    }

    #[test]
    fn fixed_worker_resolves_to_that_workers_role() {
        let worker_id = Uuid::new_v4();
        let s = service(AssignmentType::FixedWorker, Some(worker_id));
        let cat = ServiceCategory {
            id: s.category_id,
            name: "Nails".to_string(),
            active: true,
            default_fixed_worker: None,
        };
        let group =
            AssignmentGroup::resolve(&s, &cat, |id| if id == worker_id { Some(WorkerRole::Nails) } else { None })
                .unwrap();
        assert_eq!(group, AssignmentGroup::Fixed(WorkerRole::Nails, worker_id));
    }

    #[test]
    fn category_default_fixed_worker_is_fallback() {
        let s = service(AssignmentType::RoleBased, None);
        let default_worker = Uuid::new_v4();
        let cat = ServiceCategory {
            id: s.category_id,
            name: "Facial".to_string(),
            active: true,
            default_fixed_worker: Some(default_worker),
        };
        let group = AssignmentGroup::resolve(&s, &cat, |id| {
            if id == default_worker {
                Some(WorkerRole::Facial)
            } else {
                None
            }
        })
        .unwrap();
        assert_eq!(group, AssignmentGroup::Fixed(WorkerRole::Facial, default_worker));
    }
}
