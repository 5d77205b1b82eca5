use uuid::Uuid;

use crate::db::operations::{sessions as session_ops, words as word_ops};
use crate::db::Database;
use crate::models::{NewWord, SessionStatus, Word, WordUpdate};
use crate::services::{ServiceError, ServiceResult};

/// Trims every row and drops the ones missing either side of the pair.
/// Surviving rows keep their relative order.
pub fn filter_blank_rows(rows: Vec<NewWord>) -> Vec<NewWord> {
    rows.into_iter()
        .filter(|row| !row.is_blank())
        .map(|row| NewWord {
            english: row.english.trim().to_string(),
            vietnamese: row.vietnamese.trim().to_string(),
            image_url: row
                .image_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        })
        .collect()
}

/// Replaces the session's word list and moves the session into LEARNING.
pub async fn save_words(
    db: &Database,
    session_id: &str,
    rows: Vec<NewWord>,
) -> ServiceResult<Vec<Word>> {
    let submitted = rows.len();
    let rows = filter_blank_rows(rows);
    let dropped = submitted - rows.len();

    let mut tx = db.pool().begin().await?;

    let status = session_ops::fetch_session_status(&mut *tx, session_id)
        .await?
        .ok_or_else(|| ServiceError::session_not_found(session_id))?;

    if rows.is_empty() {
        return Err(ServiceError::Validation(
            "at least one word with both English and Vietnamese text is required".to_string(),
        ));
    }

    let next = status.transition(SessionStatus::Learning)?;

    word_ops::delete_words_for_session(&mut *tx, session_id).await?;

    let mut saved = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let word = Word {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            english: row.english,
            vietnamese: row.vietnamese,
            order_index: index as i64,
            image_url: row.image_url,
        };
        word_ops::insert_word(&mut *tx, &word).await?;
        saved.push(word);
    }

    session_ops::update_session_status(&mut *tx, session_id, next).await?;
    tx.commit().await?;

    tracing::info!(
        session_id = %session_id,
        saved = saved.len(),
        dropped,
        status = next.as_str(),
        "session words saved"
    );
    Ok(saved)
}

pub async fn list_words(db: &Database, session_id: &str) -> ServiceResult<Vec<Word>> {
    if session_ops::fetch_session_status(db.pool(), session_id)
        .await?
        .is_none()
    {
        return Err(ServiceError::session_not_found(session_id));
    }
    Ok(word_ops::fetch_words(db.pool(), session_id).await?)
}

pub async fn update_word(
    db: &Database,
    session_id: &str,
    word_id: &str,
    fields: WordUpdate,
) -> ServiceResult<Word> {
    let mut tx = db.pool().begin().await?;

    if session_ops::fetch_session_status(&mut *tx, session_id)
        .await?
        .is_none()
    {
        return Err(ServiceError::session_not_found(session_id));
    }

    let mut word = word_ops::fetch_word(&mut *tx, word_id)
        .await?
        .filter(|word| word.session_id == session_id)
        .ok_or_else(|| ServiceError::word_not_found(word_id))?;

    if let Some(english) = fields.english {
        word.english = required_text("english", &english)?;
    }
    if let Some(vietnamese) = fields.vietnamese {
        word.vietnamese = required_text("vietnamese", &vietnamese)?;
    }
    if let Some(image_url) = fields.image_url {
        word.image_url = image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
    }

    word_ops::update_word_fields(&mut *tx, &word).await?;
    tx.commit().await?;

    tracing::debug!(session_id = %session_id, word_id = %word_id, "word updated");
    Ok(word)
}

fn required_text(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
