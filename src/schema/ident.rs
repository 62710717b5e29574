//! Identifier safety: every name spliced into SQL passes through here first.

use crate::error::AppError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Columns every published table carries, in creation order.
pub const SYSTEM_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

static SAFE_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("static regex"));

pub fn is_safe_identifier(s: &str) -> bool {
    SAFE_IDENT.is_match(s)
}

pub fn is_system_column(s: &str) -> bool {
    SYSTEM_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(s))
}

/// Quote identifier for PostgreSQL. Callers validate before quoting; quoting alone is not the gate.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Known column names of one table: system columns, declared fields, owner column.
#[derive(Clone, Debug)]
pub struct ColumnAllowList {
    names: HashSet<String>,
}

impl ColumnAllowList {
    pub fn new<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        ColumnAllowList {
            names: columns.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Pass a name through only if it is both well-formed and a known column.
    pub fn check<'a>(&self, name: &'a str) -> Result<&'a str, AppError> {
        if !is_safe_identifier(name) || !self.names.contains(name) {
            return Err(AppError::validation(format!("unknown column: {}", name)));
        }
        Ok(name)
    }
}
