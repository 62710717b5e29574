//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and DDL for a resolved table.
//! Identifiers come from the resolved table only; values are always parameters.

use crate::schema::{quoted, ResolvedTable};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// A statement without parameters (DDL, probes).
    pub fn raw(sql: impl Into<String>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Page window and filters of a list query. `sort_by` must already be checked against the allow-list.
#[derive(Clone, Debug, PartialEq)]
pub struct ListParams {
    pub limit: u32,
    pub offset: u64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

fn table(t: &ResolvedTable) -> String {
    quoted(&t.table_name)
}

fn select_column_list(t: &ResolvedTable) -> String {
    t.columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `$n::TYPE` for a column, so text-encoded values land in typed columns.
fn placeholder(t: &ResolvedTable, column: &str, param_num: u32) -> String {
    t.column(column)
        .map(|c| format!("${}::{}", param_num, c.sql_type.bind_cast()))
        .unwrap_or_else(|| format!("${}", param_num))
}

/// Escape LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Case-insensitive substring match OR-ed across searchable columns; one shared parameter.
fn search_clause(t: &ResolvedTable, q: &mut QueryBuf, search: Option<&str>) -> String {
    let Some(term) = search.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    if t.searchable.is_empty() {
        return String::new();
    }
    let n = q.push_param(Value::String(like_pattern(term)));
    let parts: Vec<String> = t
        .searchable
        .iter()
        .map(|c| format!("{} ILIKE ${}", quoted(c), n))
        .collect();
    format!(" WHERE ({})", parts.join(" OR "))
}

/// SELECT by primary key. Caller binds the id as `$1`.
pub fn select_by_id(t: &ResolvedTable) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        select_column_list(t),
        table(t),
        quoted("id")
    );
    q
}

/// SELECT the owner column of one row. Caller binds the id as `$1`.
pub fn select_owner(t: &ResolvedTable, owner_column: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        quoted(owner_column),
        table(t),
        quoted("id")
    );
    q
}

/// One page of rows, optionally searched and sorted. Falls back to `id DESC`.
pub fn select_page(t: &ResolvedTable, p: &ListParams) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = search_clause(t, &mut q, p.search.as_deref());
    let order_clause = match &p.sort_by {
        Some(col) => format!(" ORDER BY {} {}", quoted(col), p.order.as_sql()),
        None => format!(" ORDER BY {} DESC", quoted("id")),
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select_column_list(t),
        table(t),
        where_clause,
        order_clause,
        p.limit,
        p.offset
    );
    q
}

/// COUNT of rows matching the same search as `select_page`.
pub fn count(t: &ResolvedTable, search: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = search_clause(t, &mut q, search);
    q.sql = format!(
        "SELECT COUNT(*) AS {} FROM {}{}",
        quoted("total"),
        table(t),
        where_clause
    );
    q
}

/// INSERT the given (column, value) pairs plus both timestamps. Columns must be known to the table.
pub fn insert(t: &ResolvedTable, values: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(values.len() + 2);
    let mut placeholders = Vec::with_capacity(values.len() + 2);
    for (col, val) in values {
        let n = q.push_param(val.clone());
        cols.push(quoted(col));
        placeholders.push(placeholder(t, col, n));
    }
    for ts in ["created_at", "updated_at"] {
        cols.push(quoted(ts));
        placeholders.push("NOW()".to_string());
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table(t),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(t)
    );
    q
}

/// UPDATE by id: SET the given pairs and bump `updated_at`. Returns the row, or nothing when no id matched.
pub fn update(t: &ResolvedTable, id: i64, sets: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut parts: Vec<String> = sets
        .iter()
        .map(|(col, val)| {
            let n = q.push_param(val.clone());
            format!("{} = {}", quoted(col), placeholder(t, col, n))
        })
        .collect();
    parts.push(format!("{} = NOW()", quoted("updated_at")));
    let id_param = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        table(t),
        parts.join(", "),
        quoted("id"),
        id_param,
        select_column_list(t)
    );
    q
}

/// DELETE by id. Caller binds the id as `$1` and checks rows affected.
pub fn delete(t: &ResolvedTable) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {} WHERE {} = $1", table(t), quoted("id"));
    q
}

/// CREATE TABLE IF NOT EXISTS from compiled column specs. Safe to retry.
pub fn create_table(t: &ResolvedTable) -> QueryBuf {
    let col_defs: Vec<String> = t.columns.iter().map(|c| c.to_ddl()).collect();
    QueryBuf::raw(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        table(t),
        col_defs.join(",\n  ")
    ))
}

pub fn drop_table(table_name: &str) -> QueryBuf {
    QueryBuf::raw(format!("DROP TABLE IF EXISTS {}", quoted(table_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{DefinitionBody, FieldDef, FieldType, ModelDefinition};
    use chrono::Utc;
    use serde_json::json;

    fn tasks() -> ResolvedTable {
        let def = ModelDefinition {
            id: 1,
            name: "Task".into(),
            table_name: "tasks".into(),
            definition: DefinitionBody {
                fields: vec![
                    FieldDef::new("title", FieldType::String).required(),
                    FieldDef::new("points", FieldType::Number),
                    FieldDef::new("notes", FieldType::Text),
                ],
                owner_field: Some("ownerId".into()),
                ..Default::default()
            },
            is_published: true,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        ResolvedTable::from_definition(&def).unwrap()
    }

    fn params(limit: u32, offset: u64) -> ListParams {
        ListParams {
            limit,
            offset,
            search: None,
            sort_by: None,
            order: SortOrder::Asc,
        }
    }

    #[test]
    fn page_defaults_to_id_desc() {
        let q = select_page(&tasks(), &params(10, 20));
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"created_at\", \"updated_at\", \"title\", \"points\", \"notes\", \"ownerId\" \
             FROM \"tasks\" ORDER BY \"id\" DESC LIMIT 10 OFFSET 20"
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn search_ors_text_columns_with_one_escaped_param() {
        let mut p = params(10, 0);
        p.search = Some("50%_off".into());
        p.sort_by = Some("points".into());
        p.order = SortOrder::Desc;
        let q = select_page(&tasks(), &p);
        assert!(q.sql.contains("WHERE (\"title\" ILIKE $1 OR \"notes\" ILIKE $1)"));
        assert!(q.sql.contains("ORDER BY \"points\" DESC"));
        assert_eq!(q.params, vec![json!("%50\\%\\_off%")]);

        let c = count(&tasks(), Some("50%_off"));
        assert_eq!(
            c.sql,
            "SELECT COUNT(*) AS \"total\" FROM \"tasks\" WHERE (\"title\" ILIKE $1 OR \"notes\" ILIKE $1)"
        );
    }

    #[test]
    fn empty_search_is_ignored() {
        let c = count(&tasks(), Some(""));
        assert_eq!(c.sql, "SELECT COUNT(*) AS \"total\" FROM \"tasks\"");
        assert!(c.params.is_empty());
    }

    #[test]
    fn insert_casts_and_stamps() {
        let q = insert(
            &tasks(),
            &[("title".into(), json!("x")), ("ownerId".into(), json!(7))],
        );
        assert!(q.sql.starts_with(
            "INSERT INTO \"tasks\" (\"title\", \"ownerId\", \"created_at\", \"updated_at\") \
             VALUES ($1::TEXT, $2::INTEGER, NOW(), NOW()) RETURNING"
        ));
        assert_eq!(q.params, vec![json!("x"), json!(7)]);
    }

    #[test]
    fn update_binds_id_last() {
        let q = update(&tasks(), 5, &[("points".into(), json!(3))]);
        assert!(q.sql.starts_with(
            "UPDATE \"tasks\" SET \"points\" = $1::INTEGER, \"updated_at\" = NOW() WHERE \"id\" = $2 RETURNING"
        ));
        assert_eq!(q.params, vec![json!(3), json!(5)]);
    }

    #[test]
    fn ddl_quotes_every_identifier() {
        let q = create_table(&tasks());
        assert!(q.sql.starts_with("CREATE TABLE IF NOT EXISTS \"tasks\" (\n  \"id\" INTEGER"));
        assert!(q.sql.contains("\"title\" VARCHAR(255) NOT NULL"));
        assert!(q.sql.contains("\"ownerId\" INTEGER"));
        assert_eq!(drop_table("tasks").sql, "DROP TABLE IF EXISTS \"tasks\"");
    }

    #[test]
    fn owner_lookup() {
        assert_eq!(
            select_owner(&tasks(), "ownerId").sql,
            "SELECT \"ownerId\" FROM \"tasks\" WHERE \"id\" = $1"
        );
    }
}
