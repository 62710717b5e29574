//! Publish snapshots: durable name -> JSON blobs, written as an audit trail and never read back.

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn write(&self, key: &str, blob: &Value) -> Result<(), AppError>;

    /// Remove a blob; removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Stores each blob as `<dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsArtifactStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let ok = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !ok {
            return Err(AppError::validation(format!("invalid artifact key: {}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write(&self, key: &str, blob: &Value) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(blob)?;
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "artifact written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("model-forge-artifacts-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn write_then_remove() {
        let dir = scratch_dir();
        let store = FsArtifactStore::new(&dir);
        store.write("Task", &json!({ "name": "Task" })).await.unwrap();
        let written: Value =
            serde_json::from_slice(&tokio::fs::read(dir.join("Task.json")).await.unwrap()).unwrap();
        assert_eq!(written["name"], "Task");

        store.remove("Task").await.unwrap();
        assert!(!dir.join("Task.json").exists());
        store.remove("Task").await.unwrap();
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn path_traversal_keys_are_rejected() {
        let store = FsArtifactStore::new(scratch_dir());
        assert!(store.write("../escape", &json!({})).await.is_err());
        assert!(store.remove("a/b").await.is_err());
    }
}
