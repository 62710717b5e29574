//! Model Forge: user-defined data models published as live tables with generic, access-controlled CRUD.

pub mod access;
pub mod artifact;
pub mod definition;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod publish;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use access::{authorize, check_ownership, Actor, Decision};
pub use definition::{FieldType, ModelDefinition, Role};
pub use error::{AppError, ConfigError};
pub use publish::Publisher;
pub use response::{success_many, success_one};
pub use routes::{api_routes, build_router};
pub use schema::compile;
pub use service::{RecordService, SqlExecutor};
pub use settings::Settings;
pub use state::AppState;
pub use store::{ensure_system_tables, DefinitionStore};
