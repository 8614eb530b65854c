use warp::Filter;
use tracing_subscriber;
use shopfloor::{config::Config, database::setup_database, routes::routes};

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt::init();
  let config = Config::from_env();
  let db_pool = setup_database(&config.database_url, config.db_connect_attempts)
    .await
    .expect("Failed to set up database");

  // Metrics first: routes() recovers rejections into JSON replies, so
  // anything or'd after it is unreachable.
  let api = warp::path("metrics")
    .map(|| "prometheus_metrics_placeholder")
    .or(routes(db_pool));

  warp::serve(api)
    .run(([0, 0, 0, 0], config.server_port))
    .await;
}
