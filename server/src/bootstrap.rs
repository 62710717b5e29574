//! Creates the target database on first start.

use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use std::str::FromStr;

const MAINTENANCE_DB: &str = "postgres";

/// Splits `database_url` into options for the maintenance database and the name of the target one.
/// Returns `None` for the name when there is nothing to create.
fn maintenance_target(database_url: &str) -> Result<(PgConnectOptions, Option<String>), sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?;
    let target = options
        .get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != MAINTENANCE_DB)
        .map(str::to_string);
    Ok((options.database(MAINTENANCE_DB), target))
}

pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    let (options, Some(name)) = maintenance_target(database_url)? else {
        return Ok(());
    };
    let mut conn = options.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", model_forge::schema::quoted(&name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}
