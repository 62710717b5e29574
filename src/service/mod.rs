//! Record CRUD over published models, the SQL executor it runs on, and payload validation.

mod crud;
mod executor;
mod validation;
pub use crud::{ListQuery, RecordService};
pub use executor::{PgExecutor, SqlExecutor};
pub use validation::{validate_owner_value, RequestValidator};
