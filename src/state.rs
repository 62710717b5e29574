//! Shared application state for all routes.

use crate::artifact::{ArtifactStore, FsArtifactStore};
use crate::publish::Publisher;
use crate::service::{PgExecutor, RecordService, SqlExecutor};
use crate::store::{DefinitionStore, PgDefinitionStore};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub definitions: Arc<dyn DefinitionStore>,
    pub executor: Arc<dyn SqlExecutor>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl AppState {
    /// Postgres-backed stores with publish snapshots under `artifact_dir`.
    pub fn postgres(pool: PgPool, artifact_dir: impl Into<PathBuf>) -> Self {
        AppState {
            definitions: Arc::new(PgDefinitionStore::new(pool.clone())),
            executor: Arc::new(PgExecutor::new(pool)),
            artifacts: Arc::new(FsArtifactStore::new(artifact_dir)),
        }
    }

    pub fn publisher(&self) -> Publisher<'_> {
        Publisher::new(
            self.definitions.as_ref(),
            self.executor.as_ref(),
            self.artifacts.as_ref(),
        )
    }

    pub fn records(&self) -> RecordService<'_> {
        RecordService::new(self.definitions.as_ref(), self.executor.as_ref())
    }
}
