use anyhow::Result;
use sqlx::migrate::Migrator;
use sqlx::{Pool, Postgres};
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!();

static DELAY_MS: u64 = 100;

pub async fn setup_database(database_url: &str, connect_attempts: usize) -> Result<Pool<Postgres>> {
  let pool = Retry::spawn(
    ExponentialBackoff::from_millis(DELAY_MS).take(connect_attempts),
    || Pool::<Postgres>::connect(database_url),
  )
  .await?;

  MIGRATOR.run(&pool).await?;
  info!("Database migrations complete");
  Ok(pool)
}
