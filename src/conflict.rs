use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Interval, Resource, ResourceKind};
use crate::repository::SchedulingRepository;

/// A candidate (resource, interval) assignment to be checked against the
/// existing commitments. Durations are assumed positive; callers validate
/// before reaching this point.
#[derive(Debug, Clone)]
pub struct Candidate {
  pub scheduled_at: DateTime<Utc>,
  pub duration_min: i32,
  pub machine_id: Option<Uuid>,
  pub operator_id: Option<Uuid>,
  pub exclude_task_id: Option<Uuid>,
  pub exclude_time_slot_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSlot {
  pub id: Uuid,
  pub start_date_time: DateTime<Utc>,
  /// Resolved end: the stored end when present, else start + duration.
  pub end_date_time: DateTime<Utc>,
  pub duration_min: i32,
}

/// A detected double-booking, with enough detail for the caller to present
/// a resolvable message or retry with a different interval. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
  pub conflict_type: ResourceKind,
  pub task_id: Uuid,
  pub title: String,
  pub time_slot: ConflictSlot,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub resource: Option<Resource>,
}

/// Check the candidate against each supplied resource, machine first. When
/// both resources would conflict only the machine conflict is surfaced, and
/// within one resource the first overlapping slot wins; the caller only
/// needs one conflict to act on.
pub async fn check_conflicts<R>(
  repo: &R,
  candidate: &Candidate,
) -> Result<Option<Conflict>, StoreError>
where
  R: SchedulingRepository + ?Sized,
{
  let window = Interval::from_start_and_minutes(candidate.scheduled_at, candidate.duration_min);
  let targets = [
    (ResourceKind::Machine, candidate.machine_id),
    (ResourceKind::Operator, candidate.operator_id),
  ];

  for (kind, resource_id) in targets {
    let Some(resource_id) = resource_id else {
      continue;
    };
    let slots = repo
      .find_candidate_slots(
        kind,
        resource_id,
        window.end,
        candidate.exclude_task_id,
        candidate.exclude_time_slot_id,
      )
      .await?;
    for slot in slots {
      let booked = Interval::new(slot.start_date_time, slot.effective_end());
      if !window.overlaps(&booked) {
        continue;
      }
      let resource = repo.get_resource(kind, resource_id).await?;
      return Ok(Some(Conflict {
        conflict_type: kind,
        task_id: slot.task_id,
        title: slot.task_title,
        time_slot: ConflictSlot {
          id: slot.id,
          start_date_time: slot.start_date_time,
          end_date_time: booked.end,
          duration_min: slot.duration_min,
        },
        resource,
      }));
    }
  }
  Ok(None)
}
