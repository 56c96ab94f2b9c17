//! Shared handler state.

use std::sync::Arc;

use crate::db::{
    Database, EventStore, ExportJobStore, JobQueue, ResourceDirectory, RoleStore,
};

/// State behind every request handler.
///
/// Cloning is an `Arc` bump. Store handles are cheap pool clones, so
/// handlers construct them on demand instead of holding them here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(AppStateInner { db }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn events(&self) -> EventStore {
        EventStore::new(self.inner.db.pool().clone())
    }

    pub fn roles(&self) -> RoleStore {
        RoleStore::new(self.inner.db.pool().clone())
    }

    pub fn resources(&self) -> ResourceDirectory {
        ResourceDirectory::new(self.inner.db.pool().clone())
    }

    pub fn job_queue(&self) -> JobQueue {
        JobQueue::new(self.inner.db.pool().clone())
    }

    pub fn export_jobs(&self) -> ExportJobStore {
        ExportJobStore::new(self.inner.db.pool().clone())
    }
}
