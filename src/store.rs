//! Model definition store: `model_definitions` DDL, persistence, and database bootstrap.

use crate::definition::{DefinitionBody, ModelDefinition, NewModelDefinition, DEFINITIONS_TABLE};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// All definitions, newest first.
    async fn list(&self) -> Result<Vec<ModelDefinition>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<ModelDefinition>, AppError>;

    /// A definition by model name, only if it has been published.
    async fn find_published(&self, name: &str) -> Result<Option<ModelDefinition>, AppError>;

    /// True if another definition (other than `exclude_id`) already uses the name.
    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn table_name_taken(&self, table_name: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn insert(&self, new: NewModelDefinition) -> Result<ModelDefinition, AppError>;

    /// Persist name, table name and body of a draft. Returns None if it is gone or already published.
    async fn update_draft(&self, def: &ModelDefinition) -> Result<Option<ModelDefinition>, AppError>;

    async fn mark_published(&self, id: i64) -> Result<(), AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

type DefinitionRow = (
    i64,
    String,
    String,
    Json<DefinitionBody>,
    bool,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
);

const COLUMNS: &str = "id, name, table_name, definition, is_published, created_by, created_at, updated_at";

fn from_row(row: DefinitionRow) -> ModelDefinition {
    let (id, name, table_name, definition, is_published, created_by, created_at, updated_at) = row;
    ModelDefinition {
        id,
        name,
        table_name,
        definition: definition.0,
        is_published,
        created_by,
        created_at,
        updated_at,
    }
}

/// Unique-violation on name/table_name becomes a Conflict rather than a 500.
fn conflict_or_db(e: sqlx::Error) -> AppError {
    let is_unique = e
        .as_database_error()
        .and_then(|d| d.code())
        .map(|c| c == "23505")
        .unwrap_or(false);
    if is_unique {
        AppError::Conflict("model name or table name already exists".into())
    } else {
        AppError::Db(e)
    }
}

#[derive(Clone)]
pub struct PgDefinitionStore {
    pool: PgPool,
}

impl PgDefinitionStore {
    pub fn new(pool: PgPool) -> Self {
        PgDefinitionStore { pool }
    }
}

#[async_trait]
impl DefinitionStore for PgDefinitionStore {
    async fn list(&self) -> Result<Vec<ModelDefinition>, AppError> {
        let rows: Vec<DefinitionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} ORDER BY created_at DESC, id DESC",
            COLUMNS, DEFINITIONS_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<ModelDefinition>, AppError> {
        let row: Option<DefinitionRow> =
            sqlx::query_as(&format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, DEFINITIONS_TABLE))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(from_row))
    }

    async fn find_published(&self, name: &str) -> Result<Option<ModelDefinition>, AppError> {
        let row: Option<DefinitionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM {} WHERE name = $1 AND is_published",
            COLUMNS, DEFINITIONS_TABLE
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let (taken,): (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE name = $1 AND id IS DISTINCT FROM $2)",
            DEFINITIONS_TABLE
        ))
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn table_name_taken(&self, table_name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let (taken,): (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE table_name = $1 AND id IS DISTINCT FROM $2)",
            DEFINITIONS_TABLE
        ))
        .bind(table_name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, new: NewModelDefinition) -> Result<ModelDefinition, AppError> {
        let row: DefinitionRow = sqlx::query_as(&format!(
            "INSERT INTO {} (name, table_name, definition, created_by) VALUES ($1, $2, $3, $4) RETURNING {}",
            DEFINITIONS_TABLE, COLUMNS
        ))
        .bind(&new.name)
        .bind(&new.table_name)
        .bind(Json(&new.definition))
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_db)?;
        Ok(from_row(row))
    }

    async fn update_draft(&self, def: &ModelDefinition) -> Result<Option<ModelDefinition>, AppError> {
        let row: Option<DefinitionRow> = sqlx::query_as(&format!(
            "UPDATE {} SET name = $1, table_name = $2, definition = $3, updated_at = NOW() \
             WHERE id = $4 AND NOT is_published RETURNING {}",
            DEFINITIONS_TABLE, COLUMNS
        ))
        .bind(&def.name)
        .bind(&def.table_name)
        .bind(Json(&def.definition))
        .bind(def.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conflict_or_db)?;
        Ok(row.map(from_row))
    }

    async fn mark_published(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(&format!(
            "UPDATE {} SET is_published = TRUE, updated_at = NOW() WHERE id = $1",
            DEFINITIONS_TABLE
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", DEFINITIONS_TABLE))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Create `model_definitions` if missing.
pub async fn ensure_system_tables(pool: &PgPool) -> Result<(), AppError> {
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            table_name TEXT NOT NULL UNIQUE,
            definition JSONB NOT NULL,
            is_published BOOLEAN NOT NULL DEFAULT FALSE,
            created_by BIGINT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        DEFINITIONS_TABLE
    );
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}
