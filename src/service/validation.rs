//! Record payload validation against a published model's fields.

use crate::definition::{FieldDef, FieldType};
use crate::error::AppError;
use serde_json::{json, Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create payload. All required fields must be present and non-null; keys that are
    /// not declared fields are dropped. Returns the (field, value) pairs in declared order.
    pub fn validate(body: &Map<String, Value>, fields: &[FieldDef]) -> Result<Vec<(String, Value)>, AppError> {
        let missing: Vec<&str> = fields
            .iter()
            .filter(|f| f.required && body.get(&f.name).map_or(true, Value::is_null))
            .map(|f| f.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::validation_with(
                "missing required fields",
                json!({ "missingFields": missing }),
            ));
        }
        let mut values = Vec::new();
        for field in fields {
            if let Some(v) = body.get(&field.name) {
                validate_field(field, v)?;
                values.push((field.name.clone(), v.clone()));
            }
        }
        Ok(values)
    }

    /// Validate only the fields present (for update). Required fields may be absent but not nulled.
    pub fn validate_partial(body: &Map<String, Value>, fields: &[FieldDef]) -> Result<(), AppError> {
        for (key, v) in body {
            if let Some(field) = fields.iter().find(|f| &f.name == key) {
                validate_field(field, v)?;
            }
        }
        Ok(())
    }
}

fn validate_field(field: &FieldDef, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        if field.required {
            return Err(AppError::validation(format!("{} is required", field.name)));
        }
        return Ok(());
    }
    let ok = match field.field_type {
        FieldType::String | FieldType::Text | FieldType::Date => v.is_string(),
        FieldType::Number => v.as_i64().is_some(),
        FieldType::Boolean => v.is_boolean(),
    };
    if !ok {
        return Err(AppError::validation(format!(
            "{} must be {}",
            field.name,
            expected(field.field_type)
        )));
    }
    Ok(())
}

fn expected(t: FieldType) -> &'static str {
    match t {
        FieldType::String | FieldType::Text => "a string",
        FieldType::Date => "a date string",
        FieldType::Number => "an integer",
        FieldType::Boolean => "a boolean",
    }
}

/// An owner column value set by an Admin: a user id or null.
pub fn validate_owner_value(column: &str, v: &Value) -> Result<(), AppError> {
    if v.is_null() || v.as_i64().is_some() {
        return Ok(());
    }
    Err(AppError::validation(format!("{} must be a user id", column)))
}
