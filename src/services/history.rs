//! Bounded, deduplicated quiz history.
//!
//! The log keeps the [`HISTORY_CAP`] newest entries. An entry whose topic
//! matches an existing one and whose timestamp is less than
//! [`DUPLICATE_WINDOW_MS`] away from it is the same attempt submitted twice
//! and is dropped.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::{QuizHistoryEntry, QuizType};
use crate::services::ServiceResult;

pub const HISTORY_CAP: usize = 10;
pub const DUPLICATE_WINDOW_MS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    Duplicate,
}

pub trait HistoryStore: Send + Sync {
    fn record(
        &self,
        entry: QuizHistoryEntry,
    ) -> impl Future<Output = ServiceResult<RecordOutcome>> + Send;

    /// Newest first.
    fn list(&self) -> impl Future<Output = ServiceResult<Vec<QuizHistoryEntry>>> + Send;

    /// Newest `limit` entries of one quiz type.
    fn recent(
        &self,
        quiz_type: QuizType,
        limit: usize,
    ) -> impl Future<Output = ServiceResult<Vec<QuizHistoryEntry>>> + Send;
}

pub fn is_duplicate(existing: &QuizHistoryEntry, candidate: &QuizHistoryEntry) -> bool {
    existing.topic == candidate.topic
        && (existing.timestamp_ms() - candidate.timestamp_ms()).abs() < DUPLICATE_WINDOW_MS
}

/// Applies one `record` to an in-memory log kept newest-first.
pub fn apply_record(log: &mut Vec<QuizHistoryEntry>, entry: QuizHistoryEntry) -> RecordOutcome {
    if log.iter().any(|existing| is_duplicate(existing, &entry)) {
        return RecordOutcome::Duplicate;
    }

    let position = log
        .iter()
        .position(|existing| existing.timestamp < entry.timestamp)
        .unwrap_or(log.len());
    log.insert(position, entry);
    log.truncate(HISTORY_CAP);
    RecordOutcome::Recorded
}

/// Process-local history, mostly useful for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    entries: Arc<Mutex<Vec<QuizHistoryEntry>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    async fn record(&self, entry: QuizHistoryEntry) -> ServiceResult<RecordOutcome> {
        Ok(apply_record(&mut self.entries.lock(), entry))
    }

    async fn list(&self) -> ServiceResult<Vec<QuizHistoryEntry>> {
        Ok(self.entries.lock().clone())
    }

    async fn recent(&self, quiz_type: QuizType, limit: usize) -> ServiceResult<Vec<QuizHistoryEntry>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.quiz_type == quiz_type)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Records `entry` and logs the outcome.
pub async fn record<H: HistoryStore>(
    history: &H,
    entry: QuizHistoryEntry,
) -> ServiceResult<RecordOutcome> {
    let topic = entry.topic.clone();
    let quiz_type = entry.quiz_type;
    let outcome = history.record(entry).await?;
    match outcome {
        RecordOutcome::Recorded => {
            tracing::info!(topic = %topic, quiz_type = quiz_type.as_str(), "quiz history recorded")
        }
        RecordOutcome::Duplicate => {
            tracing::debug!(topic = %topic, quiz_type = quiz_type.as_str(), "duplicate quiz history entry discarded")
        }
    }
    Ok(outcome)
}
