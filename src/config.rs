use std::env;

use anyhow::{Context, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Port the server binds when `PORT` is not set.
pub const DEFAULT_PORT: &str = "3005";

/// Build the connection pool from the externally supplied `DATABASE_URL`
/// connection string.
pub fn get_pg_pool() -> Result<Pool> {
    let url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let pg_config: tokio_postgres::Config = url
        .parse()
        .context("DATABASE_URL is not a valid postgres connection string")?;

    let mgr = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(mgr)
        .max_size(16)
        .build()
        .context("failed to create postgres pool")
}

pub fn bind_address() -> String {
    let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
    format!("0.0.0.0:{}", port)
}
