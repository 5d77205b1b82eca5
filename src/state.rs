use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::operations::history::SqliteHistoryStore;
use crate::db::Database;
use crate::services::grammar::AttemptRegistry;
use crate::services::question_source::QuestionSource;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db: Database,
    history: SqliteHistoryStore,
    questions: Arc<dyn QuestionSource>,
    attempts: Arc<AttemptRegistry>,
}

impl AppState {
    pub fn new(db: Database, questions: Arc<dyn QuestionSource>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            history: db.history(),
            db,
            questions,
            attempts: Arc::new(AttemptRegistry::new()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn history(&self) -> &SqliteHistoryStore {
        &self.history
    }

    pub fn questions(&self) -> &dyn QuestionSource {
        self.questions.as_ref()
    }

    pub fn attempts(&self) -> &AttemptRegistry {
        &self.attempts
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }
}
