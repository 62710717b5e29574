//! Model definition routes.

use crate::handlers::definition::{create_model, delete_model, get_model, list_models, publish_model, update_model};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn definition_routes(state: AppState) -> Router {
    Router::new()
        .route("/models", get(list_models).post(create_model))
        .route("/models/:id", get(get_model).put(update_model).delete(delete_model))
        .route("/models/:id/publish", post(publish_model))
        .with_state(state)
}
