//! Resolved table: a published definition flattened for query building.

use crate::definition::ModelDefinition;
use crate::error::AppError;
use crate::schema::compiler::{compile, ColumnSpec};
use crate::schema::ident::{is_safe_identifier, ColumnAllowList};

#[derive(Clone, Debug)]
pub struct ResolvedTable {
    pub model_name: String,
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
    /// String and text fields, in declared order.
    pub searchable: Vec<String>,
    pub owner_column: Option<String>,
    pub allow_list: ColumnAllowList,
}

impl ResolvedTable {
    pub fn from_definition(def: &ModelDefinition) -> Result<Self, AppError> {
        if !is_safe_identifier(&def.table_name) {
            return Err(AppError::validation(format!("invalid table name: {}", def.table_name)));
        }
        let columns = compile(def.fields(), def.owner_field())?;
        let searchable = def
            .fields()
            .iter()
            .filter(|f| f.field_type.is_searchable())
            .map(|f| f.name.clone())
            .collect();
        let allow_list = ColumnAllowList::new(columns.iter().map(|c| c.name.as_str()));
        Ok(ResolvedTable {
            model_name: def.name.clone(),
            table_name: def.table_name.clone(),
            columns,
            searchable,
            owner_column: def.owner_field().map(str::to_string),
            allow_list,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// True for user-declared fields; false for system and owner columns.
    pub fn is_field(&self, name: &str) -> bool {
        self.column(name)
            .map(|c| !c.primary_key && !c.references_user && !crate::schema::is_system_column(&c.name))
            .unwrap_or(false)
    }

    pub fn is_owner_column(&self, name: &str) -> bool {
        self.owner_column.as_deref() == Some(name)
    }
}
