use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteExecutor};

use crate::models::Word;

const WORD_COLUMNS: &str =
    r#""id", "sessionId", "english", "vietnamese", "orderIndex", "imageUrl""#;

/// A word together with its last graded submission, if any.
#[derive(Debug, Clone)]
pub struct WordSnapshot {
    pub word: Word,
    pub last_answer: Option<String>,
    pub last_correct: Option<bool>,
}

pub async fn insert_word<'e, E>(executor: E, word: &Word) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO "words" ("id", "sessionId", "english", "vietnamese", "orderIndex", "imageUrl")
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&word.id)
    .bind(&word.session_id)
    .bind(&word.english)
    .bind(&word.vietnamese)
    .bind(word.order_index)
    .bind(word.image_url.as_deref())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_words_for_session<'e, E>(executor: E, session_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(r#"DELETE FROM "words" WHERE "sessionId" = ?"#)
        .bind(session_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_words<'e, E>(executor: E, session_id: &str) -> Result<Vec<Word>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "sessionId" = ? ORDER BY "orderIndex" ASC"#
    );
    let rows = sqlx::query(&sql).bind(session_id).fetch_all(executor).await?;
    Ok(rows.iter().map(map_word_row).collect())
}

pub async fn fetch_all_words<'e, E>(executor: E) -> Result<Vec<Word>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"SELECT {WORD_COLUMNS} FROM "words" ORDER BY "sessionId" ASC, "orderIndex" ASC"#
    );
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    Ok(rows.iter().map(map_word_row).collect())
}

pub async fn fetch_words_by_ids<'e, E>(executor: E, ids: &[String]) -> Result<Vec<Word>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "id" IN ("#
    ));
    {
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id.clone());
        }
        sep.push_unseparated(")");
    }
    let rows = qb.build().fetch_all(executor).await?;
    Ok(rows.iter().map(map_word_row).collect())
}

pub async fn fetch_word<'e, E>(executor: E, word_id: &str) -> Result<Option<Word>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "id" = ?"#);
    let row = sqlx::query(&sql).bind(word_id).fetch_optional(executor).await?;
    Ok(row.map(|r| map_word_row(&r)))
}

/// Writes text and image fields only; `orderIndex` is fixed at save time.
pub async fn update_word_fields<'e, E>(executor: E, word: &Word) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"UPDATE "words" SET "english" = ?, "vietnamese" = ?, "imageUrl" = ? WHERE "id" = ?"#,
    )
    .bind(&word.english)
    .bind(&word.vietnamese)
    .bind(word.image_url.as_deref())
    .bind(&word.id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn record_submission<'e, E>(
    executor: E,
    word_id: &str,
    answer: &str,
    correct: bool,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(r#"UPDATE "words" SET "lastAnswer" = ?, "lastCorrect" = ? WHERE "id" = ?"#)
        .bind(answer)
        .bind(correct)
        .bind(word_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn fetch_snapshots<'e, E>(
    executor: E,
    session_id: &str,
) -> Result<Vec<WordSnapshot>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {WORD_COLUMNS}, "lastAnswer", "lastCorrect"
        FROM "words"
        WHERE "sessionId" = ?
        ORDER BY "orderIndex" ASC
        "#
    );
    let rows = sqlx::query(&sql).bind(session_id).fetch_all(executor).await?;
    Ok(rows
        .iter()
        .map(|row| WordSnapshot {
            word: map_word_row(row),
            last_answer: row.try_get::<Option<String>, _>("lastAnswer").unwrap_or(None),
            last_correct: row.try_get::<Option<bool>, _>("lastCorrect").unwrap_or(None),
        })
        .collect())
}

fn map_word_row(row: &SqliteRow) -> Word {
    Word {
        id: row.try_get("id").unwrap_or_default(),
        session_id: row.try_get("sessionId").unwrap_or_default(),
        english: row.try_get("english").unwrap_or_default(),
        vietnamese: row.try_get("vietnamese").unwrap_or_default(),
        order_index: row.try_get("orderIndex").unwrap_or(0),
        image_url: row.try_get::<Option<String>, _>("imageUrl").unwrap_or(None),
    }
}
