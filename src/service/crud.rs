//! Generic record CRUD over published models.

use crate::access::{authorize, check_ownership, Actor};
use crate::definition::{Action, ModelDefinition};
use crate::error::AppError;
use crate::response::PageMeta;
use crate::schema::{is_system_column, ResolvedTable};
use crate::service::executor::SqlExecutor;
use crate::service::validation::{validate_owner_value, RequestValidator};
use crate::sql::{count, delete, insert, select_by_id, select_page, update, ListParams, SortOrder};
use crate::store::DefinitionStore;
use serde_json::{Map, Value};
use std::collections::HashMap;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 1000;

/// Parsed list query string.
#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            page: 1,
            limit: DEFAULT_LIMIT,
            search: None,
            sort_by: None,
            order: SortOrder::Asc,
        }
    }
}

impl ListQuery {
    /// Reads `page`, `limit` (capped at 1000), `search`, `sortBy` and `sortOrder`; other keys are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut q = ListQuery::default();
        if let Some(v) = params.get("page") {
            q.page = v
                .parse()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| AppError::validation(format!("page must be a positive integer, got '{}'", v)))?;
        }
        if let Some(v) = params.get("limit") {
            let limit: u32 = v
                .parse()
                .ok()
                .filter(|l| *l >= 1)
                .ok_or_else(|| AppError::validation(format!("limit must be a positive integer, got '{}'", v)))?;
            q.limit = limit.min(MAX_LIMIT);
        }
        q.search = params.get("search").filter(|s| !s.is_empty()).cloned();
        q.sort_by = params.get("sortBy").filter(|s| !s.is_empty()).cloned();
        if let Some(v) = params.get("sortOrder") {
            q.order = match v.to_ascii_lowercase().as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                _ => return Err(AppError::validation(format!("sortOrder must be asc or desc, got '{}'", v))),
            };
        }
        Ok(q)
    }

    fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

pub struct RecordService<'a> {
    definitions: &'a dyn DefinitionStore,
    executor: &'a dyn SqlExecutor,
}

impl<'a> RecordService<'a> {
    pub fn new(definitions: &'a dyn DefinitionStore, executor: &'a dyn SqlExecutor) -> Self {
        RecordService {
            definitions,
            executor,
        }
    }

    /// Published definition and its table; drafts and unknown names are both NotFound.
    async fn resolve(&self, model: &str) -> Result<(ModelDefinition, ResolvedTable), AppError> {
        let def = self
            .definitions
            .find_published(model)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("model {}", model)))?;
        let table = ResolvedTable::from_definition(&def)?;
        Ok((def, table))
    }

    pub async fn list(&self, model: &str, actor: &Actor, query: &ListQuery) -> Result<(Vec<Value>, PageMeta), AppError> {
        let (def, table) = self.resolve(model).await?;
        authorize(actor.role, Action::Read, &def)?;
        let sort_by = match &query.sort_by {
            Some(col) => Some(table.allow_list.check(col)?.to_string()),
            None => None,
        };
        let params = ListParams {
            limit: query.limit,
            offset: query.offset(),
            search: query.search.clone(),
            sort_by,
            order: query.order,
        };
        let total = self
            .executor
            .fetch_optional(&count(&table, params.search.as_deref()))
            .await?
            .and_then(|row| row.get("total").and_then(Value::as_u64))
            .unwrap_or(0);
        let rows = self.executor.fetch_all(&select_page(&table, &params)).await?;
        Ok((rows, PageMeta::new(query.page, query.limit, total)))
    }

    pub async fn get(&self, model: &str, actor: &Actor, id: i64) -> Result<Value, AppError> {
        let (def, table) = self.resolve(model).await?;
        authorize(actor.role, Action::Read, &def)?;
        let mut q = select_by_id(&table);
        q.params.push(Value::from(id));
        self.executor
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| record_not_found(&table, id))
    }

    /// The payload is checked before permissions, so a caller learns about missing fields first.
    /// The owner column is always set to the caller.
    pub async fn create(&self, model: &str, actor: &Actor, body: Value) -> Result<Value, AppError> {
        let (def, table) = self.resolve(model).await?;
        let body = into_object(body)?;
        let mut values = RequestValidator::validate(&body, def.fields())?;
        authorize(actor.role, Action::Create, &def)?;
        if let Some(owner) = &table.owner_column {
            values.retain(|(k, _)| k != owner);
            values.push((owner.clone(), Value::from(actor.id)));
        }
        let row = self
            .executor
            .fetch_optional(&insert(&table, &values))
            .await?
            .ok_or_else(|| AppError::Internal(format!("insert into {} returned no row", table.table_name)))?;
        Ok(row)
    }

    pub async fn update(&self, model: &str, actor: &Actor, id: i64, body: Value) -> Result<Value, AppError> {
        let (def, table) = self.resolve(model).await?;
        let decision = authorize(actor.role, Action::Update, &def)?;
        check_ownership(self.executor, &table, &decision, id, actor).await?;

        let mut body = into_object(body)?;
        body.retain(|k, _| !is_system_column(k));
        if let Some(owner) = &table.owner_column {
            if !actor.role.is_admin() {
                body.remove(owner);
            }
        }
        RequestValidator::validate_partial(&body, def.fields())?;
        let mut sets = Vec::with_capacity(body.len());
        for (key, value) in body {
            if table.is_owner_column(&key) {
                validate_owner_value(&key, &value)?;
            } else if !table.is_field(&key) {
                return Err(AppError::validation(format!("unknown column: {}", key)));
            }
            sets.push((key, value));
        }
        if sets.is_empty() {
            return Err(AppError::validation("no updatable fields in request body"));
        }

        self.executor
            .fetch_optional(&update(&table, id, &sets))
            .await?
            .ok_or_else(|| record_not_found(&table, id))
    }

    pub async fn delete(&self, model: &str, actor: &Actor, id: i64) -> Result<(), AppError> {
        let (def, table) = self.resolve(model).await?;
        let decision = authorize(actor.role, Action::Delete, &def)?;
        check_ownership(self.executor, &table, &decision, id, actor).await?;
        let mut q = delete(&table);
        q.params.push(Value::from(id));
        if self.executor.execute(&q).await? == 0 {
            return Err(record_not_found(&table, id));
        }
        Ok(())
    }
}

fn into_object(body: Value) -> Result<Map<String, Value>, AppError> {
    match body {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::validation("body must be a JSON object")),
    }
}

fn record_not_found(table: &ResolvedTable, id: i64) -> AppError {
    AppError::NotFound(format!("record {} in {}", id, table.model_name))
}
