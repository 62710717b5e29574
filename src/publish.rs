//! Table publisher: turns a draft definition into a live table.
//!
//! Steps run as separate statements: snapshot, DDL, then the published flag. A failure part way
//! leaves the table without the flag; a retry is safe because the DDL uses IF NOT EXISTS.

use crate::artifact::ArtifactStore;
use crate::definition::ModelDefinition;
use crate::error::AppError;
use crate::schema::ResolvedTable;
use crate::service::SqlExecutor;
use crate::sql::{create_table, drop_table};
use crate::store::DefinitionStore;
use chrono::Utc;
use serde_json::json;

pub struct Publisher<'a> {
    definitions: &'a dyn DefinitionStore,
    executor: &'a dyn SqlExecutor,
    artifacts: &'a dyn ArtifactStore,
}

impl<'a> Publisher<'a> {
    pub fn new(
        definitions: &'a dyn DefinitionStore,
        executor: &'a dyn SqlExecutor,
        artifacts: &'a dyn ArtifactStore,
    ) -> Self {
        Publisher {
            definitions,
            executor,
            artifacts,
        }
    }

    pub async fn publish(&self, id: i64) -> Result<ModelDefinition, AppError> {
        let mut def = self
            .definitions
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("model definition {}", id)))?;
        if def.is_published {
            return Err(AppError::AlreadyPublished(format!(
                "model {} is already published",
                def.name
            )));
        }
        let table = ResolvedTable::from_definition(&def)?;
        let published_at = Utc::now();

        let snapshot = json!({
            "name": def.name,
            "tableName": def.table_name,
            "fields": def.definition.fields,
            "ownerField": def.definition.owner_field,
            "rbac": def.definition.rbac,
            "columns": table.columns,
            "publishedAt": published_at,
        });
        self.artifacts.write(&def.name, &snapshot).await?;

        self.executor.execute(&create_table(&table)).await?;
        self.definitions.mark_published(def.id).await?;
        tracing::info!(model = %def.name, table = %def.table_name, "model published");

        def.is_published = true;
        def.updated_at = published_at;
        Ok(def)
    }

    /// Drop the table and snapshot of a published definition. Drafts have neither.
    pub async fn unpublish(&self, def: &ModelDefinition) -> Result<(), AppError> {
        if !def.is_published {
            return Ok(());
        }
        crate::definition::validate_table_name(&def.table_name)?;
        self.executor.execute(&drop_table(&def.table_name)).await?;
        self.artifacts.remove(&def.name).await?;
        tracing::info!(model = %def.name, table = %def.table_name, "model table dropped");
        Ok(())
    }
}
