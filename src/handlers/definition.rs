//! Model definition handlers: list, get, create, update draft, delete, publish.

use crate::access::{ensure_can_publish, ensure_definition_editor};
use crate::definition::{default_table_name, validate_draft, DefinitionBody, ModelDefinition, NewModelDefinition};
use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::handlers::parse_id;
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::AppState;
use crate::store::DefinitionStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelRequest {
    pub name: String,
    #[serde(default)]
    pub table_name: Option<String>,
    pub definition: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub definition: Option<Value>,
}

async fn load(state: &AppState, id: i64) -> Result<ModelDefinition, AppError> {
    state
        .definitions
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("model definition {}", id)))
}

async fn ensure_unique(
    store: &dyn DefinitionStore,
    name: &str,
    table_name: &str,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    if store.name_taken(name, exclude_id).await? {
        return Err(AppError::Conflict(format!("model name '{}' already exists", name)));
    }
    if store.table_name_taken(table_name, exclude_id).await? {
        return Err(AppError::Conflict(format!("table name '{}' already exists", table_name)));
    }
    Ok(())
}

pub async fn list_models(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let defs = state.definitions.list().await?;
    Ok(success_many(defs))
}

pub async fn get_model(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let def = load(&state, parse_id(&id)?).await?;
    Ok(success_one_ok(def))
}

pub async fn create_model(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<CreateModelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = req.name.trim().to_string();
    let table_name = match req.table_name.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => default_table_name(&name),
    };
    let body = DefinitionBody::from_value(req.definition)?;
    validate_draft(&name, &table_name, &body)?;
    ensure_unique(state.definitions.as_ref(), &name, &table_name, None).await?;

    let def = state
        .definitions
        .insert(NewModelDefinition {
            name,
            table_name,
            definition: body,
            created_by: actor.id,
        })
        .await?;
    tracing::info!(model = %def.name, id = def.id, created_by = actor.id, "model definition created");
    Ok(success_one(def))
}

pub async fn update_model(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateModelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut def = load(&state, parse_id(&id)?).await?;
    ensure_definition_editor(&def, &actor)?;
    if def.is_published {
        return Err(AppError::AlreadyPublished("cannot update published model".into()));
    }
    if let Some(name) = req.name {
        def.name = name.trim().to_string();
    }
    if let Some(table_name) = req.table_name {
        def.table_name = table_name.trim().to_string();
    }
    if let Some(definition) = req.definition {
        def.definition = DefinitionBody::from_value(definition)?;
    }
    validate_draft(&def.name, &def.table_name, &def.definition)?;
    ensure_unique(state.definitions.as_ref(), &def.name, &def.table_name, Some(def.id)).await?;

    let updated = state
        .definitions
        .update_draft(&def)
        .await?
        .ok_or_else(|| AppError::AlreadyPublished("cannot update published model".into()))?;
    Ok(success_one_ok(updated))
}

/// Deleting a published definition also drops its table and snapshot.
pub async fn delete_model(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let def = load(&state, parse_id(&id)?).await?;
    ensure_definition_editor(&def, &actor)?;
    state.publisher().unpublish(&def).await?;
    if !state.definitions.delete(def.id).await? {
        return Err(AppError::NotFound(format!("model definition {}", def.id)));
    }
    tracing::info!(model = %def.name, id = def.id, "model definition deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_model(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_can_publish(&actor)?;
    let def = state.publisher().publish(parse_id(&id)?).await?;
    Ok(success_one_ok(def))
}
