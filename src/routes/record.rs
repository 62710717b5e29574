//! Record routes, keyed by published model name.
//!
//! Served under `/api/records/:model`, not `/api/:model`, so a model named
//! `models` or `health` cannot shadow the fixed API routes.

use crate::handlers::record::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn record_routes(state: AppState) -> Router {
    Router::new()
        .route("/records/:model", get(list).post(create))
        .route("/records/:model/:id", get(read).put(update).delete(delete_handler))
        .with_state(state)
}
