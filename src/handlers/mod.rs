//! HTTP handlers for model definitions and their records.

pub mod definition;
pub mod record;
pub use definition::*;


use crate::error::AppError;

/// Path ids are integers; anything else is a validation error rather than a routing miss.
pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::validation(format!("invalid id: {}", raw)))
}
