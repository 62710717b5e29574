//! In-memory collaborators for unit and router tests.

use crate::artifact::ArtifactStore;
use crate::definition::{ModelDefinition, NewModelDefinition};
use crate::error::AppError;
use crate::service::SqlExecutor;
use crate::sql::QueryBuf;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::store::DefinitionStore;

/// Canned answer for the next executor call.
#[derive(Clone, Debug)]
pub enum Reply {
    Rows(Vec<Value>),
    Row(Option<Value>),
    Affected(u64),
    Fail(String),
}

/// Replays scripted replies in order and records every statement it was given.
/// With the script exhausted it answers empty: no rows, None, 0 affected.
#[derive(Default)]
pub struct ScriptedExecutor {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<QueryBuf>>,
}

impl ScriptedExecutor {
    pub fn new(replies: Vec<Reply>) -> Self {
        ScriptedExecutor {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<QueryBuf> {
        self.seen.lock().unwrap().clone()
    }

    fn next(&self, q: &QueryBuf) -> Option<Reply> {
        self.seen.lock().unwrap().push(q.clone());
        self.replies.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl SqlExecutor for ScriptedExecutor {
    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        match self.next(q) {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Row(row)) => Ok(row.into_iter().collect()),
            Some(Reply::Fail(msg)) => Err(AppError::Internal(msg)),
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        match self.next(q) {
            Some(Reply::Row(row)) => Ok(row),
            Some(Reply::Rows(rows)) => Ok(rows.into_iter().next()),
            Some(Reply::Fail(msg)) => Err(AppError::Internal(msg)),
            _ => Ok(None),
        }
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        match self.next(q) {
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Fail(msg)) => Err(AppError::Internal(msg)),
            _ => Ok(0),
        }
    }
}

#[derive(Default)]
pub struct MemoryDefinitionStore {
    rows: Mutex<BTreeMap<i64, ModelDefinition>>,
    fail_mark_published: AtomicBool,
}

impl MemoryDefinitionStore {
    pub fn new() -> Self {
        MemoryDefinitionStore::default()
    }

    /// The next `mark_published` call fails without touching the row.
    pub fn fail_next_mark_published(&self) {
        self.fail_mark_published.store(true, Ordering::SeqCst);
    }

    fn clash(
        rows: &BTreeMap<i64, ModelDefinition>,
        exclude_id: Option<i64>,
        pred: impl Fn(&ModelDefinition) -> bool,
    ) -> bool {
        rows.values().any(|d| Some(d.id) != exclude_id && pred(d))
    }
}

#[async_trait]
impl DefinitionStore for MemoryDefinitionStore {
    async fn list(&self) -> Result<Vec<ModelDefinition>, AppError> {
        Ok(self.rows.lock().unwrap().values().rev().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<ModelDefinition>, AppError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_published(&self, name: &str) -> Result<Option<ModelDefinition>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|d| d.is_published && d.name == name)
            .cloned())
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(Self::clash(&rows, exclude_id, |d| d.name == name))
    }

    async fn table_name_taken(&self, table_name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(Self::clash(&rows, exclude_id, |d| d.table_name == table_name))
    }

    async fn insert(&self, new: NewModelDefinition) -> Result<ModelDefinition, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if Self::clash(&rows, None, |d| d.name == new.name || d.table_name == new.table_name) {
            return Err(AppError::Conflict("model name or table name already exists".into()));
        }
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        let now = Utc::now();
        let def = ModelDefinition {
            id,
            name: new.name,
            table_name: new.table_name,
            definition: new.definition,
            is_published: false,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        rows.insert(id, def.clone());
        Ok(def)
    }

    async fn update_draft(&self, def: &ModelDefinition) -> Result<Option<ModelDefinition>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&def.id) {
            Some(stored) if !stored.is_published => {
                stored.name = def.name.clone();
                stored.table_name = def.table_name.clone();
                stored.definition = def.definition.clone();
                stored.updated_at = Utc::now();
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_published(&self, id: i64) -> Result<(), AppError> {
        if self.fail_mark_published.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal("connection reset".into()));
        }
        if let Some(stored) = self.rows.lock().unwrap().get_mut(&id) {
            stored.is_published = true;
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryArtifactStore {
    blobs: Mutex<HashMap<String, Value>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        MemoryArtifactStore::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.blobs.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn write(&self, key: &str, blob: &Value) -> Result<(), AppError> {
        self.blobs.lock().unwrap().insert(key.to_string(), blob.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}
