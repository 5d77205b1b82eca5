//! Cross-session random quiz.
//!
//! Words seen often in recent random quizzes are rotated out so repeated
//! practice covers the whole vocabulary.

use std::collections::HashMap;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::operations::words as word_ops;
use crate::db::Database;
use crate::models::{EvaluationResult, QuizHistoryEntry, QuizType, Word};
use crate::services::evaluation::grade_word;
use crate::services::history::{self, HistoryStore};
use crate::services::{ServiceError, ServiceResult};

pub const RANDOM_QUIZ_SIZE: usize = 10;
/// Number of recent random quizzes considered for rotation.
pub const ROTATION_WINDOW: usize = 5;
/// A word seen this many times in the window is rested.
const OVERUSE_THRESHOLD: usize = 2;
pub const RANDOM_QUIZ_TOPIC: &str = "Luyện tập ngẫu nhiên";

/// How many of the given entries drew each word.
pub fn count_occurrences(entries: &[QuizHistoryEntry]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for entry in entries {
        for id in &entry.word_ids {
            *counts.entry(id.clone()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn select_rotation<R: Rng + ?Sized>(
    words: Vec<Word>,
    occurrences: &HashMap<String, usize>,
    size: usize,
    rng: &mut R,
) -> Vec<Word> {
    let seen = |word: &Word| occurrences.get(&word.id).copied().unwrap_or(0);

    let rested = words.iter().filter(|w| seen(w) < OVERUSE_THRESHOLD).count();
    let candidates: Vec<Word> = if rested < size {
        words
    } else {
        words
            .into_iter()
            .filter(|w| seen(w) < OVERUSE_THRESHOLD)
            .collect()
    };

    let (mut fresh, rest): (Vec<Word>, Vec<Word>) =
        candidates.into_iter().partition(|w| seen(w) == 0);
    let (mut once, mut others): (Vec<Word>, Vec<Word>) =
        rest.into_iter().partition(|w| seen(w) == 1);

    fresh.shuffle(rng);
    once.shuffle(rng);
    others.shuffle(rng);

    fresh
        .into_iter()
        .chain(once)
        .chain(others)
        .take(size)
        .collect()
}

/// Up to [`RANDOM_QUIZ_SIZE`] words drawn from every session.
pub async fn compose_random_quiz<H: HistoryStore>(
    db: &Database,
    history: &H,
) -> ServiceResult<Vec<Word>> {
    let words = word_ops::fetch_all_words(db.pool()).await?;
    if words.is_empty() {
        return Err(ServiceError::InsufficientData(
            "no words saved yet; add words to a session first".to_string(),
        ));
    }

    let recent = history.recent(QuizType::Random, ROTATION_WINDOW).await?;
    let occurrences = count_occurrences(&recent);
    let available = words.len();
    let quiz = select_rotation(words, &occurrences, RANDOM_QUIZ_SIZE, &mut rand::rng());

    tracing::debug!(available, drawn = quiz.len(), "random quiz composed");
    Ok(quiz)
}

/// Grades `(wordId, answer)` pairs in the order given and records the attempt.
pub async fn submit_random_quiz<H: HistoryStore>(
    db: &Database,
    history: &H,
    answers: &[(String, String)],
) -> ServiceResult<Vec<EvaluationResult>> {
    if answers.is_empty() {
        return Err(ServiceError::Validation(
            "a random quiz submission needs at least one answer".to_string(),
        ));
    }

    let ids: Vec<String> = answers.iter().map(|(id, _)| id.clone()).collect();
    let words: HashMap<String, Word> = word_ops::fetch_words_by_ids(db.pool(), &ids)
        .await?
        .into_iter()
        .map(|word| (word.id.clone(), word))
        .collect();

    let mut results = Vec::with_capacity(answers.len());
    for (word_id, answer) in answers {
        match words.get(word_id) {
            Some(word) => results.push(grade_word(word, Some(answer))),
            None => tracing::warn!(word_id = %word_id, "skipping answer for unknown word"),
        }
    }

    let correct = results.iter().filter(|r| r.correct).count() as u32;
    let entry = QuizHistoryEntry::new(
        QuizType::Random,
        RANDOM_QUIZ_TOPIC,
        correct,
        results.len() as u32,
        Utc::now(),
    )
    .with_word_ids(results.iter().map(|r| r.id.clone()).collect());
    history::record(history, entry).await?;

    Ok(results)
}
