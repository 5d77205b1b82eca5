use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use crate::db::operations::{format_timestamp, parse_timestamp};
use crate::models::{Session, SessionStatus};

const SELECT_SESSION: &str = r#"
    SELECT s."id", s."createdAt", s."status", s."topic",
           (SELECT COUNT(*) FROM "words" w WHERE w."sessionId" = s."id") AS "wordCount"
    FROM "sessions" s
"#;

pub async fn insert_session<'e, E>(executor: E, session: &Session) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"INSERT INTO "sessions" ("id", "createdAt", "status", "topic") VALUES (?, ?, ?, ?)"#,
    )
    .bind(&session.id)
    .bind(format_timestamp(&session.created_at))
    .bind(session.status.as_str())
    .bind(session.topic.as_deref())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn fetch_session<'e, E>(executor: E, id: &str) -> Result<Option<Session>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(r#"{SELECT_SESSION} WHERE s."id" = ?"#);
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    Ok(row.map(|r| map_session_row(&r)))
}

/// Newest first. `rowid` breaks ties between sessions created in the same millisecond.
pub async fn fetch_sessions<'e, E>(executor: E) -> Result<Vec<Session>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(r#"{SELECT_SESSION} ORDER BY s."createdAt" DESC, s.rowid DESC"#);
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    Ok(rows.iter().map(map_session_row).collect())
}

pub async fn fetch_session_status<'e, E>(
    executor: E,
    id: &str,
) -> Result<Option<SessionStatus>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let raw: Option<String> = sqlx::query_scalar(r#"SELECT "status" FROM "sessions" WHERE "id" = ?"#)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(raw.map(|value| parse_status(&value)))
}

pub async fn update_session_status<'e, E>(
    executor: E,
    id: &str,
    status: SessionStatus,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(r#"UPDATE "sessions" SET "status" = ? WHERE "id" = ?"#)
        .bind(status.as_str())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_session_topic<'e, E>(
    executor: E,
    id: &str,
    topic: &str,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(r#"UPDATE "sessions" SET "topic" = ? WHERE "id" = ?"#)
        .bind(topic)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_session<'e, E>(executor: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(r#"DELETE FROM "sessions" WHERE "id" = ?"#)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn map_session_row(row: &SqliteRow) -> Session {
    let created_at: String = row.try_get("createdAt").unwrap_or_default();
    let status: String = row.try_get("status").unwrap_or_default();
    Session {
        id: row.try_get("id").unwrap_or_default(),
        created_at: parse_timestamp(&created_at),
        status: parse_status(&status),
        topic: row.try_get::<Option<String>, _>("topic").unwrap_or(None),
        word_count: row.try_get("wordCount").unwrap_or(0),
    }
}

fn parse_status(raw: &str) -> SessionStatus {
    SessionStatus::parse(raw).unwrap_or_else(|| {
        tracing::warn!(status = raw, "unknown stored session status");
        SessionStatus::New
    })
}
