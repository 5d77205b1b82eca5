use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::models::{QuizHistoryEntry, QuizType};
use crate::services::history::{HistoryStore, RecordOutcome, DUPLICATE_WINDOW_MS, HISTORY_CAP};
use crate::services::ServiceResult;

const HISTORY_COLUMNS: &str =
    r#""id", "timestamp", "quizType", "topic", "correctCount", "total", "wordIds""#;

/// `quiz_history` table behind the [`HistoryStore`] trait.
///
/// Writers are serialized on a lock shared by every store from the same
/// [`crate::db::Database`], so the duplicate check and the insert are atomic.
#[derive(Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
    writes: Arc<Mutex<()>>,
}

impl SqliteHistoryStore {
    pub fn new(pool: SqlitePool, writes: Arc<Mutex<()>>) -> Self {
        Self { pool, writes }
    }
}

impl HistoryStore for SqliteHistoryStore {
    async fn record(&self, entry: QuizHistoryEntry) -> ServiceResult<RecordOutcome> {
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;

        let duplicate: Option<String> = sqlx::query_scalar(
            r#"
            SELECT "id" FROM "quiz_history"
            WHERE "topic" = ? AND ABS("timestamp" - ?) < ?
            LIMIT 1
            "#,
        )
        .bind(&entry.topic)
        .bind(entry.timestamp_ms())
        .bind(DUPLICATE_WINDOW_MS)
        .fetch_optional(&mut *tx)
        .await?;

        if duplicate.is_some() {
            tx.rollback().await?;
            return Ok(RecordOutcome::Duplicate);
        }

        let word_ids = serde_json::to_string(&entry.word_ids).unwrap_or_else(|_| "[]".to_string());
        sqlx::query(
            r#"
            INSERT INTO "quiz_history"
                ("id", "timestamp", "quizType", "topic", "correctCount", "total", "wordIds")
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.timestamp_ms())
        .bind(entry.quiz_type.as_str())
        .bind(&entry.topic)
        .bind(i64::from(entry.correct_count))
        .bind(i64::from(entry.total))
        .bind(word_ids)
        .execute(&mut *tx)
        .await?;

        let evicted = sqlx::query(
            r#"
            DELETE FROM "quiz_history"
            WHERE "id" NOT IN (
                SELECT "id" FROM "quiz_history"
                ORDER BY "timestamp" DESC, rowid DESC
                LIMIT ?
            )
            "#,
        )
        .bind(HISTORY_CAP as i64)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if evicted > 0 {
            tracing::debug!(evicted, "evicted oldest quiz history entries");
        }
        Ok(RecordOutcome::Recorded)
    }

    async fn list(&self) -> ServiceResult<Vec<QuizHistoryEntry>> {
        let sql = format!(
            r#"SELECT {HISTORY_COLUMNS} FROM "quiz_history" ORDER BY "timestamp" DESC, rowid DESC LIMIT ?"#
        );
        let rows = sqlx::query(&sql)
            .bind(HISTORY_CAP as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().filter_map(map_history_row).collect())
    }

    async fn recent(&self, quiz_type: QuizType, limit: usize) -> ServiceResult<Vec<QuizHistoryEntry>> {
        let sql = format!(
            r#"
            SELECT {HISTORY_COLUMNS} FROM "quiz_history"
            WHERE "quizType" = ?
            ORDER BY "timestamp" DESC, rowid DESC
            LIMIT ?
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(quiz_type.as_str())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().filter_map(map_history_row).collect())
    }
}

fn map_history_row(row: &SqliteRow) -> Option<QuizHistoryEntry> {
    let raw_type: String = row.try_get("quizType").ok()?;
    let Some(quiz_type) = QuizType::parse(&raw_type) else {
        tracing::warn!(quiz_type = %raw_type, "skipping history row with unknown quiz type");
        return None;
    };
    let timestamp_ms: i64 = row.try_get("timestamp").ok()?;
    let word_ids: String = row.try_get("wordIds").unwrap_or_default();

    Some(QuizHistoryEntry::restore(
        row.try_get("id").ok()?,
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms).unwrap_or_default(),
        quiz_type,
        row.try_get("topic").unwrap_or_default(),
        row.try_get::<i64, _>("correctCount").unwrap_or(0).max(0) as u32,
        row.try_get::<i64, _>("total").unwrap_or(0).max(0) as u32,
        serde_json::from_str(&word_ids).unwrap_or_default(),
    ))
}
