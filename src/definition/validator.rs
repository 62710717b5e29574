//! Naming rules for definitions and the full check a draft must pass before it is stored.

use crate::definition::DefinitionBody;
use crate::error::AppError;
use crate::schema::{compile, is_safe_identifier};
use regex::Regex;
use std::sync::LazyLock;

/// Table holding the definitions themselves; no model may claim it.
pub const DEFINITIONS_TABLE: &str = "model_definitions";

static MODEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,99}$").expect("static regex"));

/// Model names key artifact files and URL paths.
pub fn validate_model_name(name: &str) -> Result<(), AppError> {
    if !MODEL_NAME.is_match(name) {
        return Err(AppError::validation(format!(
            "model name '{}' must be 1-100 characters of letters, digits, '_' or '-', starting with a letter",
            name
        )));
    }
    Ok(())
}

pub fn default_table_name(model_name: &str) -> String {
    format!("{}s", model_name.to_lowercase())
}

pub fn validate_table_name(table_name: &str) -> Result<(), AppError> {
    if !is_safe_identifier(table_name) {
        return Err(AppError::validation(format!(
            "table name '{}' must be a plain identifier (letters, digits, '_', at most 63 characters)",
            table_name
        )));
    }
    if table_name.eq_ignore_ascii_case(DEFINITIONS_TABLE) {
        return Err(AppError::validation(format!("table name '{}' is reserved", table_name)));
    }
    Ok(())
}

/// Everything a draft must satisfy: valid names and a schema that compiles.
pub fn validate_draft(name: &str, table_name: &str, body: &DefinitionBody) -> Result<(), AppError> {
    validate_model_name(name)?;
    validate_table_name(table_name)?;
    compile(&body.fields, body.owner_field.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FieldDef, FieldType};

    #[test]
    fn default_table_name_is_lowercase_plural() {
        assert_eq!(default_table_name("Task"), "tasks");
    }

    #[test]
    fn model_names() {
        assert!(validate_model_name("Task").is_ok());
        assert!(validate_model_name("order-line_2").is_ok());
        assert!(validate_model_name("").is_err());
        assert!(validate_model_name("../etc").is_err());
        assert!(validate_model_name("9lives").is_err());
    }

    #[test]
    fn table_names() {
        assert!(validate_table_name("tasks").is_ok());
        assert!(validate_table_name("task-lines").is_err());
        assert!(validate_table_name("Model_Definitions").is_err());
    }

    #[test]
    fn draft_with_bad_schema_fails() {
        let body = DefinitionBody {
            fields: vec![FieldDef::new("id", FieldType::Number)],
            ..Default::default()
        };
        assert!(matches!(
            validate_draft("Task", "tasks", &body),
            Err(AppError::InvalidSchema(_))
        ));
    }
}
