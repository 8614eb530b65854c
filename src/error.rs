use thiserror::Error;
use uuid::Uuid;
use crate::conflict::Conflict;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Outcomes of the scheduling use case. A conflict is a legitimate business
/// result, not a transient fault; nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum ScheduleError {
  #[error("{0}")]
  Validation(String),
  #[error("task not found: {0}")]
  TaskNotFound(Uuid),
  #[error("{} scheduling conflict detected", .0.conflict_type.display_name())]
  Conflict(Conflict),
  #[error(transparent)]
  Store(#[from] StoreError),
}
