//! Routers: common probes, model definitions, records; and the layered application router.

pub mod common;
pub mod definition;
pub mod record;

pub use common::common_routes;
pub use definition::definition_routes;
pub use record::record_routes;

use crate::error::ConfigError;
use crate::settings::Settings;
use crate::state::AppState;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// All routes, unlayered, under `/api`.
pub fn api_routes(state: AppState) -> Router {
    let api = Router::new()
        .merge(common_routes(state.clone()))
        .merge(definition_routes(state.clone()))
        .merge(record_routes(state));
    Router::new().nest("/api", api)
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    let allow_origin = match origin {
        Some(o) => AllowOrigin::exact(HeaderValue::from_str(o).map_err(|_| ConfigError::Invalid {
            key: "CORS_ORIGIN",
            value: o.to_string(),
        })?),
        None => AllowOrigin::from(Any),
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers(Any)
        .allow_methods(Any))
}

/// The served application: API routes with tracing, CORS and a request body limit.
pub fn build_router(state: AppState, settings: &Settings) -> Result<Router, ConfigError> {
    Ok(api_routes(state)
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes))
        .layer(cors_layer(settings.cors_origin.as_deref())?)
        .layer(TraceLayer::new_for_http()))
}
