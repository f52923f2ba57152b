/*!
 * Option Generator (C3)
 *
 * Enumerates candidate start times x group-order permutations x barber
 * candidates, assembling contiguous, conflict-free block sequences (§4.3).
 *
 * This module is pure: it is handed pre-fetched per-worker free-interval
 * lists (computed by C2 for the target date and window) and the resolved
 * service/category/worker rows, and produces options without touching
 * storage. The per-request cache described in §5 is exactly this input.
 */

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::intervals::{contains, Interval};
use crate::models::{AssignmentGroup, Service, ServiceCategory, Worker, WorkerRole};

#[derive(Debug, Clone, Copy)]
pub enum BarberChoice {
    Specific(Uuid),
    Nearest,
}

#[derive(Debug, Clone)]
pub struct OptionRequest {
    pub service_ids: Vec<Uuid>,
    pub barber_choice: BarberChoice,
    pub slot_interval_minutes: i64,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionBlock {
    pub sequence: i16,
    pub worker_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct BookingOption {
    pub option_id: Uuid,
    pub appointment_start: DateTime<Utc>,
    pub appointment_end: DateTime<Utc>,
    pub gap_total_minutes: i64,
    pub blocks: Vec<OptionBlock>,
}

#[derive(Debug, thiserror::Error)]
pub enum OptionGenerationError {
    #[error("service {0} references an unknown category")]
    UnknownCategory(Uuid),
    #[error("service {0} has no resolvable assignment group: {1}")]
    UnresolvableGroup(Uuid, String),
    #[error("group {0:?} is claimed by more than one fixed worker")]
    ConflictingFixedWorker(WorkerRole),
}

struct Group {
    role: WorkerRole,
    fixed_worker: Option<Uuid>,
    service_ids: Vec<Uuid>,
    effective_minutes: i64,
}

/// Resolves requested services into per-group bundles (§4.3 "Grouping").
fn build_groups(
    service_ids: &[Uuid],
    services: &HashMap<Uuid, Service>,
    categories: &HashMap<Uuid, ServiceCategory>,
    workers: &HashMap<Uuid, Worker>,
) -> Result<Vec<Group>, OptionGenerationError> {
    let mut groups: Vec<Group> = Vec::new();

    for &service_id in service_ids {
        let service = services
            .get(&service_id)
            .ok_or(OptionGenerationError::UnresolvableGroup(
                service_id,
                "unknown service".to_string(),
            ))?;
        let category = categories
            .get(&service.category_id)
            .ok_or(OptionGenerationError::UnknownCategory(service.category_id))?;

        let group = AssignmentGroup::resolve(service, category, |worker_id| {
            workers.get(&worker_id).map(|w| w.role)
        })
        .map_err(|e| OptionGenerationError::UnresolvableGroup(service_id, e))?;

        let (role, fixed_worker) = match group {
            AssignmentGroup::Barber => (WorkerRole::Barber, None),
            AssignmentGroup::Fixed(role, worker_id) => (role, Some(worker_id)),
        };

        match groups.iter_mut().find(|g| g.role == role) {
            Some(existing) => {
                if existing.fixed_worker != fixed_worker {
                    return Err(OptionGenerationError::ConflictingFixedWorker(role));
                }
                existing.service_ids.push(service_id);
                existing.effective_minutes += service.effective_minutes() as i64;
            }
            None => groups.push(Group {
                role,
                fixed_worker,
                service_ids: vec![service_id],
                effective_minutes: service.effective_minutes() as i64,
            }),
        }
    }

    Ok(groups)
}

fn permutations(roles: &[WorkerRole]) -> Vec<Vec<WorkerRole>> {
    if roles.len() <= 1 {
        return vec![roles.to_vec()];
    }
    let mut result = Vec::new();
    for i in 0..roles.len() {
        let mut rest = roles.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            result.push(tail);
        }
    }
    result
}

fn signature(blocks: &[OptionBlock]) -> String {
    let mut parts = Vec::with_capacity(blocks.len());
    for b in blocks {
        let services = b
            .service_ids
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",");
        parts.push(format!(
            "{}:{}:{}:{}",
            b.worker_id,
            b.start.to_rfc3339(),
            b.end.to_rfc3339(),
            services
        ));
    }
    format!(
        "{}|{}|{}",
        blocks.first().map(|b| b.start.to_rfc3339()).unwrap_or_default(),
        blocks.last().map(|b| b.end.to_rfc3339()).unwrap_or_default(),
        parts.join(";")
    )
}

/// Attempts to place every group of `order`, starting at `cursor`, back to
/// back (contiguous — no internal gaps). Returns the assembled blocks, or
/// `None` if any group's placement is not fully covered by that worker's
/// free intervals.
fn try_build(
    order: &[WorkerRole],
    groups: &[Group],
    barber_worker: Option<Uuid>,
    cursor: DateTime<Utc>,
    free_by_worker: &HashMap<Uuid, Vec<Interval>>,
) -> Option<Vec<OptionBlock>> {
    let mut blocks = Vec::with_capacity(order.len());
    let mut start = cursor;

    for (idx, role) in order.iter().enumerate() {
        let group = groups.iter().find(|g| g.role == *role)?;
        let worker_id = match group.fixed_worker {
            Some(id) => id,
            None => barber_worker?,
        };
        let end = start + chrono::Duration::minutes(group.effective_minutes);
        let block_interval = Interval::new(start, end)?;

        let free = free_by_worker.get(&worker_id)?;
        if !free.iter().any(|f| contains(f, &block_interval)) {
            return None;
        }

        blocks.push(OptionBlock {
            sequence: (idx + 1) as i16,
            worker_id,
            start,
            end,
            service_ids: group.service_ids.clone(),
        });
        start = end;
    }

    Some(blocks)
}

/// Generates up to `request.limit` options for date D, given the resolved
/// catalog rows and the per-worker free-interval cache (§4.3, §5).
pub fn generate_options(
    request: &OptionRequest,
    services: &HashMap<Uuid, Service>,
    categories: &HashMap<Uuid, ServiceCategory>,
    workers: &HashMap<Uuid, Worker>,
    free_by_worker: &HashMap<Uuid, Vec<Interval>>,
) -> Result<Vec<BookingOption>, OptionGenerationError> {
    let groups = build_groups(&request.service_ids, services, categories, workers)?;
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let used_roles: Vec<WorkerRole> = groups.iter().map(|g| g.role).collect();
    let has_barber_group = used_roles.contains(&WorkerRole::Barber);

    let barber_candidates: Vec<Uuid> = if !has_barber_group {
        Vec::new()
    } else {
        match request.barber_choice {
            BarberChoice::Specific(id) => match workers.get(&id) {
                Some(w) if w.active && w.role == WorkerRole::Barber => vec![id],
                _ => Vec::new(),
            },
            BarberChoice::Nearest => {
                let mut candidates: Vec<Uuid> = workers
                    .values()
                    .filter(|w| w.active && w.role == WorkerRole::Barber)
                    .map(|w| w.id)
                    .collect();
                candidates.sort();
                candidates
            }
        }
    };

    // Involved workers: barber candidates plus every fixed worker used.
    let mut involved: Vec<Uuid> = barber_candidates.clone();
    for g in &groups {
        if let Some(w) = g.fixed_worker {
            involved.push(w);
        }
    }

    let total_minutes: i64 = groups.iter().map(|g| g.effective_minutes).sum();

    let mut day_open: Option<DateTime<Utc>> = None;
    let mut day_close: Option<DateTime<Utc>> = None;
    for worker_id in &involved {
        if let Some(free) = free_by_worker.get(worker_id) {
            for iv in free {
                day_open = Some(day_open.map_or(iv.start, |o| o.min(iv.start)));
                day_close = Some(day_close.map_or(iv.end, |c| c.max(iv.end)));
            }
        }
    }
    let (day_open, day_close) = match (day_open, day_close) {
        (Some(o), Some(c)) => (o, c),
        _ => return Ok(Vec::new()),
    };

    let last_start = day_close - chrono::Duration::minutes(total_minutes);
    if last_start < day_open {
        return Ok(Vec::new());
    }

    let all_permutations = permutations(&used_roles);
    let step = chrono::Duration::minutes(request.slot_interval_minutes.max(1));

    let mut results: Vec<BookingOption> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut cursor = day_open;
    'outer: while cursor <= last_start {
        // Permutation ordering heuristic (§4.3): prefer BARBER-first
        // sequences when some barber candidate can start exactly at the
        // cursor; otherwise prefer sequences that don't start with BARBER.
        let barber_ready = has_barber_group
            && groups
                .iter()
                .find(|g| g.role == WorkerRole::Barber)
                .map(|barber_group| {
                    let end = cursor + chrono::Duration::minutes(barber_group.effective_minutes);
                    Interval::new(cursor, end).map_or(false, |iv| {
                        barber_candidates.iter().any(|b| {
                            free_by_worker
                                .get(b)
                                .map(|free| free.iter().any(|f| contains(f, &iv)))
                                .unwrap_or(false)
                        })
                    })
                })
                .unwrap_or(false);

        let mut ordered_permutations = all_permutations.clone();
        ordered_permutations.sort_by_key(|perm| {
            let starts_with_barber = perm.first() == Some(&WorkerRole::Barber);
            if barber_ready {
                !starts_with_barber
            } else {
                starts_with_barber
            }
        });

        for perm in &ordered_permutations {
            if perm.contains(&WorkerRole::Barber) {
                for &barber in &barber_candidates {
                    if let Some(blocks) = try_build(perm, &groups, Some(barber), cursor, free_by_worker) {
                        let sig = signature(&blocks);
                        if seen.insert(sig) {
                            results.push(assemble(blocks));
                            if results.len() >= request.limit {
                                break 'outer;
                            }
                        }
                    }
                }
            } else if let Some(blocks) = try_build(perm, &groups, None, cursor, free_by_worker) {
                let sig = signature(&blocks);
                if seen.insert(sig) {
                    results.push(assemble(blocks));
                    if results.len() >= request.limit {
                        break 'outer;
                    }
                }
            }
        }

        cursor += step;
    }

    Ok(results)
}

fn assemble(blocks: Vec<OptionBlock>) -> BookingOption {
    let start = blocks.first().expect("non-empty option").start;
    let end = blocks.last().expect("non-empty option").end;
    BookingOption {
        option_id: Uuid::new_v4(),
        appointment_start: start,
        appointment_end: end,
        gap_total_minutes: 0, // options are contiguous by construction (§4.3)
        blocks,
    }
}
