use std::collections::HashMap;

use crate::db::operations::{sessions as session_ops, words as word_ops};
use crate::db::Database;
use crate::models::{EvaluationResult, Word};
use crate::services::normalize::answers_match;
use crate::services::{ServiceError, ServiceResult};

/// Grades one word. A missing answer counts as an empty (wrong) one.
pub fn grade_word(word: &Word, answer: Option<&str>) -> EvaluationResult {
    let raw = answer.unwrap_or_default();
    EvaluationResult::graded(word, raw, answers_match(raw, &word.english))
}

/// Grades every word of the session in display order, stores the submission
/// and marks the session DONE. Never rejects an incomplete submission.
pub async fn submit_learning(
    db: &Database,
    session_id: &str,
    answers: &HashMap<String, String>,
) -> ServiceResult<Vec<EvaluationResult>> {
    let mut tx = db.pool().begin().await?;

    let status = session_ops::fetch_session_status(&mut *tx, session_id)
        .await?
        .ok_or_else(|| ServiceError::session_not_found(session_id))?;

    let words = word_ops::fetch_words(&mut *tx, session_id).await?;
    let results: Vec<EvaluationResult> = words
        .iter()
        .map(|word| grade_word(word, answers.get(&word.id).map(String::as_str)))
        .collect();

    for result in &results {
        word_ops::record_submission(&mut *tx, &result.id, &result.user_answer, result.correct)
            .await?;
    }

    let next = status.complete();
    session_ops::update_session_status(&mut *tx, session_id, next).await?;
    tx.commit().await?;

    let correct = results.iter().filter(|r| r.correct).count();
    let unknown = answers
        .keys()
        .filter(|id| !words.iter().any(|w| &w.id == *id))
        .count();
    if unknown > 0 {
        tracing::warn!(session_id = %session_id, unknown, "ignored answers for unknown words");
    }
    tracing::info!(
        session_id = %session_id,
        correct,
        total = results.len(),
        from = status.as_str(),
        "learning session graded"
    );

    Ok(results)
}

/// Results of the last submission, rebuilt from the stored snapshot.
/// Words that were never graded report an empty, incorrect answer.
pub async fn get_results(db: &Database, session_id: &str) -> ServiceResult<Vec<EvaluationResult>> {
    if session_ops::fetch_session_status(db.pool(), session_id)
        .await?
        .is_none()
    {
        return Err(ServiceError::session_not_found(session_id));
    }

    let snapshots = word_ops::fetch_snapshots(db.pool(), session_id).await?;
    Ok(snapshots
        .into_iter()
        .map(|snapshot| {
            EvaluationResult::graded(
                &snapshot.word,
                snapshot.last_answer.unwrap_or_default(),
                snapshot.last_correct.unwrap_or(false),
            )
        })
        .collect())
}
