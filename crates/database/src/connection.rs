use crate::error::DbError;
use configuration::DatabaseSettings;
use dotenvy::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The connection string comes from the `DATABASE_URL` environment variable
/// (a `.env` file is honored when present); pool sizing and the checkout
/// timeout come from the `[database]` configuration section. The schema
/// itself is defined and migrated by the collection pipeline that owns it;
/// this pool only ever reads.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    // Load environment variables from the .env file, if one exists.
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_e| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout())
        .connect(&database_url)
        .await?;

    Ok(pool)
}
