use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::knowledge::KnowledgeBase;
use crate::services::notify::EmailProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub mailer: Box<dyn EmailProvider>,
    /// Absent when no retrieval API is configured.
    pub knowledge: Option<Box<dyn KnowledgeBase>>,
}

impl AppState {
    /// Locks the shared connection. A panic while holding the lock leaves
    /// SQLite itself consistent, so a poisoned lock is still usable.
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}
