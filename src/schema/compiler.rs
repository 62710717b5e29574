//! Schema compiler: (fields, owner field) -> ordered column specs for a published table.

use crate::definition::{FieldDef, FieldDefault, FieldType};
use crate::error::AppError;
use crate::schema::ident::{is_safe_identifier, is_system_column};
use chrono::DateTime;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Column types used by published tables, rendered for PostgreSQL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    VarChar255,
    Integer,
    Boolean,
    Timestamp,
    Text,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::VarChar255 => "VARCHAR(255)",
            SqlType::Integer => "INTEGER",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamp => "TIMESTAMPTZ",
            SqlType::Text => "TEXT",
        }
    }

    /// Cast applied to bound parameters. Strings bind as TEXT so over-long values error instead of truncating.
    pub fn bind_cast(self) -> &'static str {
        match self {
            SqlType::VarChar255 | SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamp => "TIMESTAMPTZ",
        }
    }
}

impl From<FieldType> for SqlType {
    fn from(t: FieldType) -> Self {
        match t {
            FieldType::String => SqlType::VarChar255,
            FieldType::Number => SqlType::Integer,
            FieldType::Boolean => SqlType::Boolean,
            FieldType::Date => SqlType::Timestamp,
            FieldType::Text => SqlType::Text,
        }
    }
}

impl Serialize for SqlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnDefault {
    Text(String),
    Integer(i64),
    Bool(bool),
    CurrentTimestamp,
}

impl ColumnDefault {
    /// SQL for the DEFAULT clause. Strings are quote-escaped; the timestamp sentinel stays an unquoted call.
    pub fn to_sql(&self) -> String {
        match self {
            ColumnDefault::Text(s) => format!("'{}'", s.replace('\'', "''")),
            ColumnDefault::Integer(n) => n.to_string(),
            ColumnDefault::Bool(true) => "TRUE".to_string(),
            ColumnDefault::Bool(false) => "FALSE".to_string(),
            ColumnDefault::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        }
    }
}

impl Serialize for ColumnDefault {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_sql())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub nullable: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
    /// Holds a user id; the user store lives outside this database, so no FK is emitted.
    pub references_user: bool,
}

impl ColumnSpec {
    fn system(name: &str, sql_type: SqlType) -> Self {
        ColumnSpec {
            name: name.to_string(),
            sql_type,
            primary_key: false,
            auto_increment: false,
            nullable: false,
            unique: false,
            default: Some(ColumnDefault::CurrentTimestamp),
            references_user: false,
        }
    }

    /// Column definition fragment for CREATE TABLE (identifier already validated).
    pub fn to_ddl(&self) -> String {
        let mut def = format!("{} {}", crate::schema::quoted(&self.name), self.sql_type.as_sql());
        if self.auto_increment {
            def.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(d) = &self.default {
            def.push_str(" DEFAULT ");
            def.push_str(&d.to_sql());
        }
        def
    }
}

fn invalid(msg: String) -> AppError {
    AppError::InvalidSchema(msg)
}

fn check_name(kind: &str, name: &str, seen: &mut HashSet<String>) -> Result<(), AppError> {
    if !is_safe_identifier(name) {
        return Err(invalid(format!("{} '{}' is not a valid column name", kind, name)));
    }
    if is_system_column(name) {
        return Err(invalid(format!("{} '{}' is a reserved column name", kind, name)));
    }
    if !seen.insert(name.to_string()) {
        return Err(invalid(format!("duplicate {} name '{}'", kind, name)));
    }
    Ok(())
}

fn column_default(field: &FieldDef) -> Result<Option<ColumnDefault>, AppError> {
    let Some(default) = &field.default else {
        return Ok(None);
    };
    let mismatch = || {
        invalid(format!(
            "default for '{}' does not match its type {:?}",
            field.name, field.field_type
        ))
    };
    let d = match (field.field_type, default) {
        (FieldType::String | FieldType::Text, FieldDefault::Text(s)) => ColumnDefault::Text(s.clone()),
        // A blank default on a non-string field is an unset default.
        (_, FieldDefault::Text(s)) if s.trim().is_empty() => return Ok(None),
        (FieldType::Date, FieldDefault::Text(s)) => {
            DateTime::parse_from_rfc3339(s.trim()).map_err(|_| {
                invalid(format!(
                    "default for '{}' must be an RFC 3339 timestamp or CURRENT_TIMESTAMP",
                    field.name
                ))
            })?;
            ColumnDefault::Text(s.trim().to_string())
        }
        (FieldType::Date, FieldDefault::CurrentTimestamp) => ColumnDefault::CurrentTimestamp,
        (FieldType::Number, FieldDefault::Number(n)) => ColumnDefault::Integer(n.as_i64().ok_or_else(mismatch)?),
        (FieldType::Boolean, FieldDefault::Bool(b)) => ColumnDefault::Bool(*b),
        _ => return Err(mismatch()),
    };
    Ok(Some(d))
}

/// Compile a field list into column specs: `id`, `created_at`, `updated_at`, the fields in
/// declared order, then the owner column when configured.
pub fn compile(fields: &[FieldDef], owner_field: Option<&str>) -> Result<Vec<ColumnSpec>, AppError> {
    if fields.is_empty() {
        return Err(invalid("at least one field is required".into()));
    }
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(fields.len() + 4);
    columns.push(ColumnSpec {
        name: "id".into(),
        sql_type: SqlType::Integer,
        primary_key: true,
        auto_increment: true,
        nullable: false,
        unique: false,
        default: None,
        references_user: false,
    });
    columns.push(ColumnSpec::system("created_at", SqlType::Timestamp));
    columns.push(ColumnSpec::system("updated_at", SqlType::Timestamp));

    for field in fields {
        check_name("field", &field.name, &mut seen)?;
        columns.push(ColumnSpec {
            name: field.name.clone(),
            sql_type: field.field_type.into(),
            primary_key: false,
            auto_increment: false,
            nullable: !field.required,
            unique: field.unique,
            default: column_default(field)?,
            references_user: false,
        });
    }

    if let Some(owner) = owner_field {
        check_name("owner field", owner, &mut seen)?;
        columns.push(ColumnSpec {
            name: owner.to_string(),
            sql_type: SqlType::Integer,
            primary_key: false,
            auto_increment: false,
            nullable: true,
            unique: false,
            default: None,
            references_user: true,
        });
    }
    Ok(columns)
}
