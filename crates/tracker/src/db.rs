use std::time::Duration;

use deadpool_sqlite::{Config, Hook, Pool, PoolConfig, Runtime};
use domain::db;
use tracing::instrument;

use crate::AppError;

/// Every pooled connection gets the same pragmas and busy timeout as a
/// directly opened one.
#[instrument]
pub fn create_pool(
    connection_string: &str,
    pool_size: usize,
    busy_timeout: Duration,
) -> Result<Pool, anyhow::Error> {
    let mut config = Config::new(connection_string);
    config.pool = Some(PoolConfig::new(pool_size));

    let pool = config
        .builder(Runtime::Tokio1)?
        .post_create(Hook::async_fn(move |object, _| {
            Box::pin(async move {
                object
                    .interact(move |conn| db::configure_connection(conn, busy_timeout))
                    .await
                    .map_err(AppError::from)?
                    .map_err(AppError::from)?;
                Ok(())
            })
        }))
        .build()?;

    Ok(pool)
}
