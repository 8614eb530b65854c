use std::convert::Infallible;

use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::repository::PgRepository;

pub mod tasks;

pub fn routes(
  db_pool: Pool<Postgres>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
  let store = PgRepository::new(db_pool);
  tasks::schedule_route(store.clone())
    .or(tasks::task_route(store))
    .recover(handle_rejection)
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
  let (status, message) = if err.is_not_found() {
    (StatusCode::NOT_FOUND, "not found".to_string())
  } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
    (StatusCode::BAD_REQUEST, e.to_string())
  } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
  } else {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
  };
  Ok(warp::reply::with_status(
    warp::reply::json(&json!({ "error": message })),
    status,
  ))
}
