//! Grammar quizzes: tense catalog, question selection, grading, scoring and
//! the per-attempt state machine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ten_point_score, QuizHistoryEntry, QuizType};
use crate::services::history::{self, HistoryStore};
use crate::services::normalize::answers_match;
use crate::services::question_source::{
    FitbQuestion, GrammarQuestion, QuestionSource, QuizMode, TenseCategory, TenseConfig,
};
use crate::services::{ServiceError, ServiceResult};

pub const ALL_RANDOM_TENSE_ID: &str = "all-random";
pub const QUESTION_LIMIT: usize = 20;
const MAX_TRACKED_ATTEMPTS: usize = 64;

impl QuizMode {
    pub const fn quiz_type(self) -> QuizType {
        match self {
            QuizMode::Mcq => QuizType::GrammarMcq,
            QuizMode::Fitb => QuizType::GrammarFitb,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            QuizMode::Mcq => "Trắc nghiệm",
            QuizMode::Fitb => "Điền từ",
        }
    }
}

/// Questions for one attempt; the variant is the quiz mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "questions", rename_all = "lowercase")]
pub enum QuestionSet {
    Mcq(Vec<GrammarQuestion>),
    Fitb(Vec<FitbQuestion>),
}

impl QuestionSet {
    pub fn mode(&self) -> QuizMode {
        match self {
            QuestionSet::Mcq(_) => QuizMode::Mcq,
            QuestionSet::Fitb(_) => QuizMode::Fitb,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QuestionSet::Mcq(questions) => questions.len(),
            QuestionSet::Fitb(questions) => questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prompt(&self, index: usize) -> Option<QuestionPrompt> {
        match self {
            QuestionSet::Mcq(questions) => questions.get(index).map(|q| QuestionPrompt {
                sentence: q.sentence.clone(),
                options: Some(q.options.clone()),
            }),
            QuestionSet::Fitb(questions) => questions.get(index).map(|q| QuestionPrompt {
                sentence: q.question.clone(),
                options: None,
            }),
        }
    }
}

/// What the learner sees for the current question: no answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPrompt {
    pub sentence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum GrammarAnswer {
    #[serde(rename_all = "camelCase")]
    Selected { selected_index: usize },
    Text { input: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question_index: usize,
    pub sentence: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub tense_id: String,
    pub tense_name: String,
    pub mode: QuizMode,
    /// 0–10 scale.
    pub score: f64,
    pub total: u32,
    pub correct_count: u32,
    pub breakdown: Vec<AnsweredQuestion>,
}

pub fn catalog(source: &dyn QuestionSource) -> Vec<TenseConfig> {
    let mut tenses = source.tenses().to_vec();
    tenses.push(all_random_tense());
    tenses
}

fn all_random_tense() -> TenseConfig {
    TenseConfig {
        id: ALL_RANDOM_TENSE_ID.to_string(),
        name: "Tổng hợp các thì".to_string(),
        category: TenseCategory::Mixed,
        note: Some("Câu hỏi ngẫu nhiên từ tất cả các thì".to_string()),
    }
}

pub fn find_tense(source: &dyn QuestionSource, tense_id: &str) -> ServiceResult<TenseConfig> {
    if tense_id == ALL_RANDOM_TENSE_ID {
        return Ok(all_random_tense());
    }
    source
        .tenses()
        .iter()
        .find(|t| t.id == tense_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("tense {tense_id}")))
}

/// Fisher–Yates shuffle followed by truncation.
pub fn shuffle_and_limit<T, R: Rng + ?Sized>(mut items: Vec<T>, limit: usize, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items.truncate(limit);
    items
}

pub fn get_questions(
    source: &dyn QuestionSource,
    tense_id: &str,
    mode: QuizMode,
) -> ServiceResult<QuestionSet> {
    let tense = find_tense(source, tense_id)?;
    let tense_ids: Vec<String> = if tense.id == ALL_RANDOM_TENSE_ID {
        source.tenses().iter().map(|t| t.id.clone()).collect()
    } else {
        vec![tense.id]
    };

    let mut rng = rand::rng();
    let set = match mode {
        QuizMode::Mcq => QuestionSet::Mcq(shuffle_and_limit(
            tense_ids.iter().flat_map(|id| source.mcq_questions(id)).collect(),
            QUESTION_LIMIT,
            &mut rng,
        )),
        QuizMode::Fitb => QuestionSet::Fitb(shuffle_and_limit(
            tense_ids.iter().flat_map(|id| source.fitb_questions(id)).collect(),
            QUESTION_LIMIT,
            &mut rng,
        )),
    };

    if set.is_empty() {
        tracing::debug!(tense_id, ?mode, "no grammar questions available");
    }
    Ok(set)
}

pub fn grade_mcq(question: &GrammarQuestion, selected_index: usize) -> bool {
    selected_index == question.correct_index
}

pub fn grade_fitb(question: &FitbQuestion, input: &str) -> bool {
    answers_match(input, &question.answer)
}

pub fn summarize(tense: &TenseConfig, mode: QuizMode, answered: Vec<AnsweredQuestion>) -> AttemptSummary {
    let total = answered.len() as u32;
    let correct_count = answered.iter().filter(|a| a.correct).count() as u32;
    AttemptSummary {
        tense_id: tense.id.clone(),
        tense_name: tense.name.clone(),
        mode,
        score: ten_point_score(correct_count, total),
        total,
        correct_count,
        breakdown: answered,
    }
}

pub fn history_topic(tense: &TenseConfig, mode: QuizMode) -> String {
    format!("{} ({})", tense.name, mode.label())
}

/// Scores a finished attempt and appends it to the quiz history.
pub async fn finalize_attempt<H: HistoryStore>(
    history: &H,
    tense: &TenseConfig,
    mode: QuizMode,
    answered: Vec<AnsweredQuestion>,
    finished_at: DateTime<Utc>,
) -> ServiceResult<AttemptSummary> {
    let summary = summarize(tense, mode, answered);
    let entry = QuizHistoryEntry::new(
        mode.quiz_type(),
        history_topic(tense, mode),
        summary.correct_count,
        summary.total,
        finished_at,
    );
    history::record(history, entry).await?;
    Ok(summary)
}

/// Records a grammar result scored by the client.
pub async fn record_client_result<H: HistoryStore>(
    history: &H,
    quiz_type: QuizType,
    topic: &str,
    correct_count: u32,
    total: u32,
) -> ServiceResult<QuizHistoryEntry> {
    if quiz_type == QuizType::Random {
        return Err(ServiceError::Validation(
            "random quiz results are recorded by the quiz submission itself".to_string(),
        ));
    }
    if topic.trim().is_empty() {
        return Err(ServiceError::Validation("topic must not be empty".to_string()));
    }
    if correct_count > total {
        return Err(ServiceError::Validation(format!(
            "score {correct_count} exceeds total {total}"
        )));
    }

    let entry = QuizHistoryEntry::new(quiz_type, topic.trim(), correct_count, total, Utc::now());
    history::record(history, entry.clone()).await?;
    Ok(entry)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptPhase {
    AwaitingAnswer,
    AnswerChecked,
    AttemptComplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("attempt is {0:?}; no answer is expected now")]
    NotAwaitingAnswer(AttemptPhase),
    #[error("attempt is {0:?}; answer the current question first")]
    NotChecked(AttemptPhase),
    #[error("a {expected:?} question needs a matching answer")]
    AnswerKind { expected: QuizMode },
    #[error("option {index} is out of range for {options} options")]
    OptionOutOfRange { index: usize, options: usize },
    #[error("attempt is already being scored")]
    Finalizing,
}

#[derive(Debug, Clone)]
pub struct QuizAttempt {
    id: String,
    tense: TenseConfig,
    questions: QuestionSet,
    current: usize,
    phase: AttemptPhase,
    answered: Vec<AnsweredQuestion>,
    summary: Option<AttemptSummary>,
    finalizing: bool,
    started_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn new(tense: TenseConfig, questions: QuestionSet) -> ServiceResult<Self> {
        if questions.is_empty() {
            return Err(ServiceError::InsufficientData(format!(
                "no {:?} questions available for {}",
                questions.mode(),
                tense.id
            )));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            tense,
            questions,
            current: 0,
            phase: AttemptPhase::AwaitingAnswer,
            answered: Vec::new(),
            summary: None,
            finalizing: false,
            started_at: Utc::now(),
        })
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn mode(&self) -> QuizMode {
        self.questions.mode()
    }

    pub fn answered(&self) -> &[AnsweredQuestion] {
        &self.answered
    }

    /// Grades the current question and moves to ANSWER_CHECKED.
    pub fn answer(&mut self, answer: &GrammarAnswer) -> Result<&AnsweredQuestion, AttemptError> {
        if self.phase != AttemptPhase::AwaitingAnswer {
            return Err(AttemptError::NotAwaitingAnswer(self.phase));
        }

        let index = self.current;
        let graded = match (&self.questions, answer) {
            (QuestionSet::Mcq(questions), GrammarAnswer::Selected { selected_index }) => {
                let q = &questions[index];
                let Some(choice) = q.options.get(*selected_index) else {
                    return Err(AttemptError::OptionOutOfRange {
                        index: *selected_index,
                        options: q.options.len(),
                    });
                };
                AnsweredQuestion {
                    question_index: index,
                    sentence: q.sentence.clone(),
                    correct_answer: q.options[q.correct_index].clone(),
                    user_answer: choice.clone(),
                    correct: grade_mcq(q, *selected_index),
                }
            }
            (QuestionSet::Fitb(questions), GrammarAnswer::Text { input }) => {
                let q = &questions[index];
                AnsweredQuestion {
                    question_index: index,
                    sentence: q.question.clone(),
                    correct_answer: q.answer.clone(),
                    user_answer: input.clone(),
                    correct: grade_fitb(q, input),
                }
            }
            (set, _) => return Err(AttemptError::AnswerKind { expected: set.mode() }),
        };

        self.answered.push(graded);
        self.phase = AttemptPhase::AnswerChecked;
        Ok(&self.answered[index])
    }

    fn on_last_question(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    /// Moves past a checked question. Returns ATTEMPT_COMPLETE after the last one.
    pub fn advance(&mut self) -> Result<AttemptPhase, AttemptError> {
        if self.phase != AttemptPhase::AnswerChecked {
            return Err(AttemptError::NotChecked(self.phase));
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.phase = AttemptPhase::AwaitingAnswer;
        } else {
            self.phase = AttemptPhase::AttemptComplete;
        }
        Ok(self.phase)
    }

    pub fn view(&self) -> AttemptView {
        let current_question = match self.phase {
            AttemptPhase::AttemptComplete => None,
            _ => self.questions.prompt(self.current),
        };
        let last_result = match self.phase {
            AttemptPhase::AnswerChecked => self.answered.last().cloned(),
            _ => None,
        };
        AttemptView {
            id: self.id.clone(),
            tense_id: self.tense.id.clone(),
            tense_name: self.tense.name.clone(),
            mode: self.mode(),
            phase: self.phase,
            current_index: self.current,
            total: self.questions.len(),
            current_question,
            last_result,
            summary: self.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    pub id: String,
    pub tense_id: String,
    pub tense_name: String,
    pub mode: QuizMode,
    pub phase: AttemptPhase,
    pub current_index: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionPrompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<AnsweredQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AttemptSummary>,
}

/// In-flight attempts keyed by id. Holds at most a small fixed number; the
/// oldest attempt is dropped to make room.
#[derive(Debug, Default)]
pub struct AttemptRegistry {
    attempts: RwLock<HashMap<String, QuizAttempt>>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &self,
        source: &dyn QuestionSource,
        tense_id: &str,
        mode: QuizMode,
    ) -> ServiceResult<AttemptView> {
        let tense = find_tense(source, tense_id)?;
        let questions = get_questions(source, tense_id, mode)?;
        let attempt = QuizAttempt::new(tense, questions)?;
        let view = attempt.view();

        let mut attempts = self.attempts.write();
        if attempts.len() >= MAX_TRACKED_ATTEMPTS {
            let oldest = attempts
                .values()
                .min_by_key(|a| a.started_at)
                .map(|a| a.id.clone());
            if let Some(oldest) = oldest {
                attempts.remove(&oldest);
            }
        }
        attempts.insert(attempt.id.clone(), attempt);

        tracing::info!(attempt_id = %view.id, tense_id, ?mode, total = view.total, "grammar attempt started");
        Ok(view)
    }

    pub fn view(&self, id: &str) -> ServiceResult<AttemptView> {
        self.attempts
            .read()
            .get(id)
            .map(QuizAttempt::view)
            .ok_or_else(|| attempt_not_found(id))
    }

    pub fn answer(&self, id: &str, answer: &GrammarAnswer) -> ServiceResult<AttemptView> {
        let mut attempts = self.attempts.write();
        let attempt = attempts.get_mut(id).ok_or_else(|| attempt_not_found(id))?;
        attempt.answer(answer)?;
        Ok(attempt.view())
    }

    /// Advances the attempt; on completion scores it and records history once.
    ///
    /// The last question stays ANSWER_CHECKED until its history entry is
    /// stored, so a failed write can be retried with another `advance`.
    pub async fn advance<H: HistoryStore>(&self, id: &str, history: &H) -> ServiceResult<AttemptView> {
        let (tense, mode, answered) = {
            let mut attempts = self.attempts.write();
            let attempt = attempts.get_mut(id).ok_or_else(|| attempt_not_found(id))?;
            if attempt.phase != AttemptPhase::AnswerChecked || !attempt.on_last_question() {
                attempt.advance()?;
                return Ok(attempt.view());
            }
            if attempt.finalizing {
                return Err(AttemptError::Finalizing.into());
            }
            attempt.finalizing = true;
            (attempt.tense.clone(), attempt.mode(), attempt.answered.clone())
        };

        let finalized = finalize_attempt(history, &tense, mode, answered, Utc::now()).await;

        let mut attempts = self.attempts.write();
        let attempt = attempts.get_mut(id).ok_or_else(|| attempt_not_found(id))?;
        attempt.finalizing = false;
        let summary = finalized.inspect_err(|err| {
            tracing::warn!(attempt_id = %id, error = %err, "grammar attempt not finalized");
        })?;
        attempt.advance()?;
        tracing::info!(
            attempt_id = %id,
            correct = summary.correct_count,
            total = summary.total,
            "grammar attempt complete"
        );
        attempt.summary = Some(summary);
        Ok(attempt.view())
    }
}

fn attempt_not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("attempt {id}"))
}
