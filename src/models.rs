use serde::{Serialize, Deserialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};

/// The two kinds of schedulable resource. Machine and operator bookings are
/// structurally identical; downstream code branches on this enum rather
/// than carrying two copies of the query and check logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
  Machine,
  Operator,
}

impl ResourceKind {
  /// Column on `tasks` linking a task to this kind of resource.
  pub fn task_column(&self) -> &'static str {
    match self {
      ResourceKind::Machine => "machine_id",
      ResourceKind::Operator => "operator_id",
    }
  }

  pub fn table(&self) -> &'static str {
    match self {
      ResourceKind::Machine => "machines",
      ResourceKind::Operator => "operators",
    }
  }

  pub fn display_name(&self) -> &'static str {
    match self {
      ResourceKind::Machine => "Machine",
      ResourceKind::Operator => "Operator",
    }
  }
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl Interval {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self { start, end }
  }

  pub fn from_start_and_minutes(start: DateTime<Utc>, minutes: i32) -> Self {
    Self { start, end: start + Duration::minutes(minutes as i64) }
  }

  /// Strict overlap: intervals that merely touch at an endpoint do not
  /// overlap.
  pub fn overlaps(&self, other: &Interval) -> bool {
    self.start < other.end && other.start < self.end
  }
}

/// Resolve a slot's end instant. `duration_min` is authoritative when no
/// explicit end was stored; a slot is never treated as open-ended.
pub fn effective_end(
  start: DateTime<Utc>,
  end: Option<DateTime<Utc>>,
  duration_min: i32,
) -> DateTime<Utc> {
  end.unwrap_or_else(|| start + Duration::minutes(duration_min as i64))
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id: Uuid,
  pub title: String,
  pub status: String,
  pub item_id: Option<Uuid>,
  pub machine_id: Option<Uuid>,
  pub operator_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
  pub id: Uuid,
  pub task_id: Uuid,
  pub start_date_time: DateTime<Utc>,
  pub end_date_time: Option<DateTime<Utc>>,
  pub duration_min: i32,
  pub is_primary: bool,
}

impl TimeSlot {
  pub fn effective_end(&self) -> DateTime<Utc> {
    effective_end(self.start_date_time, self.end_date_time, self.duration_min)
  }

  pub fn interval(&self) -> Interval {
    Interval::new(self.start_date_time, self.effective_end())
  }
}

/// A machine or operator row. Both tables carry the same shape.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
  pub id: Uuid,
  pub name: String,
  pub status: String,
}
