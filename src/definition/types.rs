//! Model definition types matching the JSON authored in the model editor.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Closed set of user roles. Admin bypasses every per-model check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Viewer,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Viewer => "Viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Manager" => Ok(Role::Manager),
            "Viewer" => Ok(Role::Viewer),
            _ => Err(AppError::validation(format!(
                "invalid role: {} (expected Admin, Manager or Viewer)",
                s
            ))),
        }
    }
}

/// Operation requested against a model's records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Update and delete target an existing row and may be scoped to its owner.
    pub fn mutates_existing(self) -> bool {
        matches!(self, Action::Update | Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grant stored in a definition's rbac map. `All` is shorthand for the four actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
    All,
}

impl Permission {
    pub fn grants(self, action: Action) -> bool {
        match self {
            Permission::All => true,
            Permission::Create => action == Action::Create,
            Permission::Read => action == Action::Read,
            Permission::Update => action == Action::Update,
            Permission::Delete => action == Action::Delete,
        }
    }
}

pub type Rbac = BTreeMap<Role, BTreeSet<Permission>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Text,
}

impl FieldType {
    /// String and text fields take part in free-text search.
    pub fn is_searchable(self) -> bool {
        matches!(self, FieldType::String | FieldType::Text)
    }
}

/// Default value of a field. `CURRENT_TIMESTAMP` is a sentinel for the SQL function, never a literal.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldDefault {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    CurrentTimestamp,
}

const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

impl<'de> Deserialize<'de> for FieldDefault {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) if s.eq_ignore_ascii_case(CURRENT_TIMESTAMP) => {
                Ok(FieldDefault::CurrentTimestamp)
            }
            serde_json::Value::String(s) => Ok(FieldDefault::Text(s)),
            serde_json::Value::Number(n) => Ok(FieldDefault::Number(n)),
            serde_json::Value::Bool(b) => Ok(FieldDefault::Bool(b)),
            other => Err(serde::de::Error::custom(format!(
                "field default must be a string, number or boolean; got {}",
                other
            ))),
        }
    }
}

impl Serialize for FieldDefault {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldDefault::Text(s) => serializer.serialize_str(s),
            FieldDefault::Number(n) => n.serialize(serializer),
            FieldDefault::Bool(b) => serializer.serialize_bool(*b),
            FieldDefault::CurrentTimestamp => serializer.serialize_str(CURRENT_TIMESTAMP),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
}

impl FieldDef {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        FieldDef {
            name: name.to_string(),
            field_type,
            required: false,
            unique: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The schema part of a definition: frozen once the model is published.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionBody {
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_field: Option<String>,
    #[serde(default)]
    pub rbac: Rbac,
}

/// An empty or whitespace-only owner field means the model has no owner column.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl DefinitionBody {
    /// Parse an authored definition. Unknown field types, roles or permissions are schema errors.
    pub fn from_value(value: serde_json::Value) -> Result<Self, AppError> {
        serde_json::from_value(value).map_err(|e| AppError::InvalidSchema(e.to_string()))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub id: i64,
    pub name: String,
    pub table_name: String,
    pub definition: DefinitionBody,
    pub is_published: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModelDefinition {
    pub fn fields(&self) -> &[FieldDef] {
        &self.definition.fields
    }

    pub fn owner_field(&self) -> Option<&str> {
        self.definition.owner_field.as_deref()
    }
}

/// A definition about to be inserted; the store assigns id and timestamps.
#[derive(Clone, Debug)]
pub struct NewModelDefinition {
    pub name: String,
    pub table_name: String,
    pub definition: DefinitionBody,
    pub created_by: i64,
}
