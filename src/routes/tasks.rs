use std::convert::Infallible;

use serde_json::json;
use tracing::{info, error};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

use crate::error::ScheduleError;
use crate::repository::SchedulingRepository;
use crate::scheduling::{schedule_task, ScheduleRequest, TaskWithSlots};

pub fn schedule_route<R>(
  store: R,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
where
  R: SchedulingRepository + Clone + Send + Sync + 'static,
{
  warp::path!("tasks" / "schedule")
    .and(warp::post())
    .and(warp::body::json())
    .and(with_store(store))
    .and_then(handle_schedule)
}

pub fn task_route<R>(
  store: R,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
where
  R: SchedulingRepository + Clone + Send + Sync + 'static,
{
  warp::path!("tasks" / Uuid)
    .and(warp::get())
    .and(with_store(store))
    .and_then(handle_get_task)
}

fn with_store<R>(store: R) -> impl Filter<Extract = (R,), Error = Infallible> + Clone
where
  R: SchedulingRepository + Clone + Send + Sync + 'static,
{
  warp::any().map(move || store.clone())
}

async fn handle_schedule<R>(
  request: ScheduleRequest,
  store: R,
) -> Result<WithStatus<Json>, warp::Rejection>
where
  R: SchedulingRepository + Send + Sync + 'static,
{
  match schedule_task(&store, &request).await {
    Ok(scheduled) => {
      info!(
        "Task {} scheduled at {} for {} min",
        scheduled.task.id, request.scheduled_at, request.duration_min
      );
      Ok(json_reply(&scheduled, StatusCode::OK))
    }
    Err(err) => Ok(schedule_error_reply(err)),
  }
}

fn schedule_error_reply(err: ScheduleError) -> WithStatus<Json> {
  match &err {
    ScheduleError::Validation(_) => {
      json_reply(&json!({ "error": err.to_string() }), StatusCode::BAD_REQUEST)
    }
    ScheduleError::TaskNotFound(_) => {
      json_reply(&json!({ "error": err.to_string() }), StatusCode::NOT_FOUND)
    }
    ScheduleError::Conflict(conflict) => {
      info!("Scheduling rejected: {}", err);
      json_reply(
        &json!({ "error": err.to_string(), "conflict": conflict }),
        StatusCode::CONFLICT,
      )
    }
    ScheduleError::Store(e) => {
      error!("Scheduling failed at the store: {:?}", e);
      json_reply(&json!({ "error": "internal error" }), StatusCode::INTERNAL_SERVER_ERROR)
    }
  }
}

async fn handle_get_task<R>(
  task_id: Uuid,
  store: R,
) -> Result<WithStatus<Json>, warp::Rejection>
where
  R: SchedulingRepository + Send + Sync + 'static,
{
  let task = match store.get_task(task_id).await {
    Ok(Some(task)) => task,
    Ok(None) => {
      return Ok(json_reply(
        &json!({ "error": format!("task not found: {task_id}") }),
        StatusCode::NOT_FOUND,
      ));
    }
    Err(e) => {
      error!("Task lookup failed: {:?}", e);
      return Ok(json_reply(
        &json!({ "error": "internal error" }),
        StatusCode::INTERNAL_SERVER_ERROR,
      ));
    }
  };
  match store.list_slots(task.id).await {
    Ok(time_slots) => Ok(json_reply(&TaskWithSlots { task, time_slots }, StatusCode::OK)),
    Err(e) => {
      error!("Slot lookup failed: {:?}", e);
      Ok(json_reply(
        &json!({ "error": "internal error" }),
        StatusCode::INTERNAL_SERVER_ERROR,
      ))
    }
  }
}

fn json_reply<T: serde::Serialize>(value: &T, status: StatusCode) -> WithStatus<Json> {
  warp::reply::with_status(warp::reply::json(value), status)
}
