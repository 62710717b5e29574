//! Record handlers for published models: list, get, create, update, delete.

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::handlers::parse_id;
use crate::response::{success_one, success_one_ok, success_page};
use crate::service::ListQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let query = ListQuery::from_params(&params)?;
    let (rows, meta) = state.records().list(&model, &actor, &query).await?;
    Ok(success_page(rows, meta))
}

pub async fn read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((model, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let row = state.records().get(&model, &actor, parse_id(&id)?).await?;
    Ok(success_one_ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(model): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let row = state.records().create(&model, &actor, body).await?;
    Ok(success_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((model, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let row = state.records().update(&model, &actor, parse_id(&id)?, body).await?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((model, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.records().delete(&model, &actor, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
