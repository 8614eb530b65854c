use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::{check_conflicts, Candidate};
use crate::error::ScheduleError;
use crate::models::{Task, TimeSlot};
use crate::repository::{NewTimeSlot, SchedulingRepository};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
  pub task_id: Uuid,
  pub item_id: Option<Uuid>,
  pub project_id: Option<Uuid>,
  pub machine_id: Option<Uuid>,
  pub operator_id: Option<Uuid>,
  pub scheduled_at: DateTime<Utc>,
  pub duration_min: i32,
}

/// A task together with its current slot set, as returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithSlots {
  #[serde(flatten)]
  pub task: Task,
  pub time_slots: Vec<TimeSlot>,
}

/// Commit a (resource, interval) assignment to a task, or reject it with a
/// structured conflict. This is the only path that persists an interval
/// together with resource links; every write goes through the conflict
/// check first when a resource is attached. Null resource ids unassign.
pub async fn schedule_task<R>(
  repo: &R,
  request: &ScheduleRequest,
) -> Result<TaskWithSlots, ScheduleError>
where
  R: SchedulingRepository + ?Sized,
{
  if request.duration_min <= 0 {
    return Err(ScheduleError::Validation(
      "durationMin must be a positive number of minutes".to_string(),
    ));
  }

  let task = repo
    .get_task(request.task_id)
    .await?
    .ok_or(ScheduleError::TaskNotFound(request.task_id))?;

  if request.machine_id.is_some() || request.operator_id.is_some() {
    // A task being rescheduled must not collide with its own prior slots.
    let candidate = Candidate {
      scheduled_at: request.scheduled_at,
      duration_min: request.duration_min,
      machine_id: request.machine_id,
      operator_id: request.operator_id,
      exclude_task_id: Some(task.id),
      exclude_time_slot_id: None,
    };
    if let Some(conflict) = check_conflicts(repo, &candidate).await? {
      return Err(ScheduleError::Conflict(conflict));
    }
  }

  let task = repo
    .replace_schedule(
      task.id,
      request.item_id,
      request.machine_id,
      request.operator_id,
      NewTimeSlot {
        start_date_time: request.scheduled_at,
        duration_min: request.duration_min,
      },
    )
    .await?;
  let time_slots = repo.list_slots(task.id).await?;
  Ok(TaskWithSlots { task, time_slots })
}
