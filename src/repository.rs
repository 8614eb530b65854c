use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{self, Resource, ResourceKind, Task, TimeSlot};

/// A stored slot that might collide with a candidate interval, joined with
/// the identity of its owning task. The repository only narrows by resource
/// and a coarse time bound; deciding actual overlap is the detector's job.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateSlot {
  pub id: Uuid,
  pub task_id: Uuid,
  pub task_title: String,
  pub start_date_time: DateTime<Utc>,
  pub end_date_time: Option<DateTime<Utc>>,
  pub duration_min: i32,
}

impl CandidateSlot {
  pub fn effective_end(&self) -> DateTime<Utc> {
    models::effective_end(self.start_date_time, self.end_date_time, self.duration_min)
  }
}

/// Interval to be written when a task is (re)scheduled. The end instant is
/// left unstored; `duration_min` stays the single source of truth.
#[derive(Debug, Clone)]
pub struct NewTimeSlot {
  pub start_date_time: DateTime<Utc>,
  pub duration_min: i32,
}

#[async_trait]
pub trait SchedulingRepository: Send + Sync {
  /// Slots owned by tasks linked to `resource_id` through the column named
  /// by `kind`, starting before `before`, minus the excluded task and/or
  /// slot. Both exclusions may apply at once.
  async fn find_candidate_slots(
    &self,
    kind: ResourceKind,
    resource_id: Uuid,
    before: DateTime<Utc>,
    exclude_task_id: Option<Uuid>,
    exclude_time_slot_id: Option<Uuid>,
  ) -> Result<Vec<CandidateSlot>, StoreError>;

  async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, StoreError>;

  async fn list_slots(&self, task_id: Uuid) -> Result<Vec<TimeSlot>, StoreError>;

  async fn get_resource(
    &self,
    kind: ResourceKind,
    resource_id: Uuid,
  ) -> Result<Option<Resource>, StoreError>;

  /// Replace the task's schedule in one transaction: drop its slots, insert
  /// the new one, rewrite the resource links (null unassigns) and mark the
  /// task scheduled. Rescheduling clears prior slots rather than patching
  /// them; the slot set just written is always the task's whole schedule.
  async fn replace_schedule(
    &self,
    task_id: Uuid,
    item_id: Option<Uuid>,
    machine_id: Option<Uuid>,
    operator_id: Option<Uuid>,
    slot: NewTimeSlot,
  ) -> Result<Task, StoreError>;
}

#[derive(Clone)]
pub struct PgRepository {
  pool: Pool<Postgres>,
}

impl PgRepository {
  pub fn new(pool: Pool<Postgres>) -> Self {
    Self { pool }
  }
}

const TASK_COLUMNS: &str =
  "id, title, status, item_id, machine_id, operator_id, created_at, updated_at";

#[async_trait]
impl SchedulingRepository for PgRepository {
  async fn find_candidate_slots(
    &self,
    kind: ResourceKind,
    resource_id: Uuid,
    before: DateTime<Utc>,
    exclude_task_id: Option<Uuid>,
    exclude_time_slot_id: Option<Uuid>,
  ) -> Result<Vec<CandidateSlot>, StoreError> {
    // kind.task_column() is a static identifier, not user input.
    let sql = format!(
      "SELECT ts.id, ts.task_id, t.title AS task_title,
              ts.start_date_time, ts.end_date_time, ts.duration_min
       FROM time_slots ts
       JOIN tasks t ON t.id = ts.task_id
       WHERE t.{} = $1
         AND ts.start_date_time < $2
         AND ($3::uuid IS NULL OR ts.task_id <> $3)
         AND ($4::uuid IS NULL OR ts.id <> $4)
       ORDER BY ts.start_date_time",
      kind.task_column()
    );
    let slots = sqlx::query_as::<_, CandidateSlot>(&sql)
      .bind(resource_id)
      .bind(before)
      .bind(exclude_task_id)
      .bind(exclude_time_slot_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(slots)
  }

  async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, StoreError> {
    let task = sqlx::query_as::<_, Task>(&format!(
      "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
    ))
      .bind(task_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(task)
  }

  async fn list_slots(&self, task_id: Uuid) -> Result<Vec<TimeSlot>, StoreError> {
    let slots = sqlx::query_as::<_, TimeSlot>(
      "SELECT id, task_id, start_date_time, end_date_time, duration_min, is_primary
       FROM time_slots WHERE task_id = $1
       ORDER BY start_date_time",
    )
      .bind(task_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(slots)
  }

  async fn get_resource(
    &self,
    kind: ResourceKind,
    resource_id: Uuid,
  ) -> Result<Option<Resource>, StoreError> {
    let sql = format!("SELECT id, name, status FROM {} WHERE id = $1", kind.table());
    let resource = sqlx::query_as::<_, Resource>(&sql)
      .bind(resource_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(resource)
  }

  async fn replace_schedule(
    &self,
    task_id: Uuid,
    item_id: Option<Uuid>,
    machine_id: Option<Uuid>,
    operator_id: Option<Uuid>,
    slot: NewTimeSlot,
  ) -> Result<Task, StoreError> {
    let mut tx = self.pool.begin().await?;

    sqlx::query("DELETE FROM time_slots WHERE task_id = $1")
      .bind(task_id)
      .execute(&mut *tx)
      .await?;

    sqlx::query(
      "INSERT INTO time_slots (id, task_id, start_date_time, end_date_time, duration_min, is_primary)
       VALUES ($1, $2, $3, NULL, $4, TRUE)",
    )
      .bind(Uuid::new_v4())
      .bind(task_id)
      .bind(slot.start_date_time)
      .bind(slot.duration_min)
      .execute(&mut *tx)
      .await?;

    let task = sqlx::query_as::<_, Task>(&format!(
      "UPDATE tasks
       SET machine_id = $2,
           operator_id = $3,
           item_id = COALESCE($4, item_id),
           status = 'scheduled',
           updated_at = NOW()
       WHERE id = $1
       RETURNING {TASK_COLUMNS}"
    ))
      .bind(task_id)
      .bind(machine_id)
      .bind(operator_id)
      .bind(item_id)
      .fetch_one(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(task)
  }
}

#[cfg(test)]
pub(crate) mod memory {
  use std::sync::{Arc, Mutex};

  use super::*;

  #[derive(Default)]
  struct State {
    tasks: Vec<Task>,
    slots: Vec<TimeSlot>,
    machines: Vec<Resource>,
    operators: Vec<Resource>,
  }

  /// In-memory stand-in for `PgRepository`, mirroring its filter semantics.
  #[derive(Clone, Default)]
  pub(crate) struct MemoryRepository {
    state: Arc<Mutex<State>>,
  }

  impl MemoryRepository {
    pub fn new() -> Self {
      Self::default()
    }

    pub fn insert_task(&self, task: Task) {
      self.state.lock().unwrap().tasks.push(task);
    }

    pub fn insert_slot(&self, slot: TimeSlot) {
      self.state.lock().unwrap().slots.push(slot);
    }

    pub fn insert_machine(&self, resource: Resource) {
      self.state.lock().unwrap().machines.push(resource);
    }

    pub fn insert_operator(&self, resource: Resource) {
      self.state.lock().unwrap().operators.push(resource);
    }
  }

  #[async_trait]
  impl SchedulingRepository for MemoryRepository {
    async fn find_candidate_slots(
      &self,
      kind: ResourceKind,
      resource_id: Uuid,
      before: DateTime<Utc>,
      exclude_task_id: Option<Uuid>,
      exclude_time_slot_id: Option<Uuid>,
    ) -> Result<Vec<CandidateSlot>, StoreError> {
      let state = self.state.lock().unwrap();
      let mut out = Vec::new();
      for slot in &state.slots {
        let Some(task) = state.tasks.iter().find(|t| t.id == slot.task_id) else {
          continue;
        };
        let linked = match kind {
          ResourceKind::Machine => task.machine_id == Some(resource_id),
          ResourceKind::Operator => task.operator_id == Some(resource_id),
        };
        if !linked || slot.start_date_time >= before {
          continue;
        }
        if exclude_task_id == Some(slot.task_id) || exclude_time_slot_id == Some(slot.id) {
          continue;
        }
        out.push(CandidateSlot {
          id: slot.id,
          task_id: task.id,
          task_title: task.title.clone(),
          start_date_time: slot.start_date_time,
          end_date_time: slot.end_date_time,
          duration_min: slot.duration_min,
        });
      }
      out.sort_by_key(|s| s.start_date_time);
      Ok(out)
    }

    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, StoreError> {
      let state = self.state.lock().unwrap();
      Ok(state.tasks.iter().find(|t| t.id == task_id).cloned())
    }

    async fn list_slots(&self, task_id: Uuid) -> Result<Vec<TimeSlot>, StoreError> {
      let state = self.state.lock().unwrap();
      let mut slots: Vec<TimeSlot> = state
        .slots
        .iter()
        .filter(|s| s.task_id == task_id)
        .cloned()
        .collect();
      slots.sort_by_key(|s| s.start_date_time);
      Ok(slots)
    }

    async fn get_resource(
      &self,
      kind: ResourceKind,
      resource_id: Uuid,
    ) -> Result<Option<Resource>, StoreError> {
      let state = self.state.lock().unwrap();
      let pool = match kind {
        ResourceKind::Machine => &state.machines,
        ResourceKind::Operator => &state.operators,
      };
      Ok(pool.iter().find(|r| r.id == resource_id).cloned())
    }

    async fn replace_schedule(
      &self,
      task_id: Uuid,
      item_id: Option<Uuid>,
      machine_id: Option<Uuid>,
      operator_id: Option<Uuid>,
      slot: NewTimeSlot,
    ) -> Result<Task, StoreError> {
      let mut state = self.state.lock().unwrap();
      let pos = state
        .tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
      {
        let task = &mut state.tasks[pos];
        task.machine_id = machine_id;
        task.operator_id = operator_id;
        if item_id.is_some() {
          task.item_id = item_id;
        }
        task.status = "scheduled".to_string();
        task.updated_at = Utc::now();
      }
      state.slots.retain(|s| s.task_id != task_id);
      state.slots.push(TimeSlot {
        id: Uuid::new_v4(),
        task_id,
        start_date_time: slot.start_date_time,
        end_date_time: None,
        duration_min: slot.duration_min,
        is_primary: true,
      });
      Ok(state.tasks[pos].clone())
    }
  }
}
