use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_TOPIC: &str = "Chưa thêm chủ đề";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    New,
    Learning,
    Done,
}

impl SessionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionStatus::New => "NEW",
            SessionStatus::Learning => "LEARNING",
            SessionStatus::Done => "DONE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(SessionStatus::New),
            "LEARNING" => Some(SessionStatus::Learning),
            "DONE" => Some(SessionStatus::Done),
            _ => None,
        }
    }

    /// Transitions a caller may request directly. LEARNING is reachable from
    /// every state (NEW starts learning, LEARNING/DONE retry). DONE is only
    /// reached through [`SessionStatus::complete`].
    pub fn can_transition_to(self, target: SessionStatus) -> bool {
        matches!(
            (self, target),
            (SessionStatus::New, SessionStatus::Learning)
                | (SessionStatus::Learning, SessionStatus::Learning)
                | (SessionStatus::Done, SessionStatus::Learning)
        )
    }

    pub fn transition(self, target: SessionStatus) -> Result<SessionStatus, TransitionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(TransitionError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    /// Evaluation completion. Every state ends in DONE once answers are graded.
    pub fn complete(self) -> SessionStatus {
        SessionStatus::Done
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid session transition from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub topic: Option<String>,
    pub word_count: i64,
}

impl Session {
    pub fn new(topic: Option<&str>) -> Self {
        let topic = topic
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.to_string());
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            status: SessionStatus::New,
            topic,
            word_count: 0,
        }
    }

    /// Label to show when rendering; an unset topic falls back to the placeholder.
    pub fn display_topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub session_id: String,
    pub english: String,
    pub vietnamese: String,
    pub order_index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One row of a word batch as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWord {
    #[serde(default)]
    pub english: String,
    #[serde(default)]
    pub vietnamese: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewWord {
    pub fn new(english: impl Into<String>, vietnamese: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            vietnamese: vietnamese.into(),
            image_url: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.english.trim().is_empty() || self.vietnamese.trim().is_empty()
    }
}

/// Partial word edit. `imageUrl: null` clears the image, an absent key keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordUpdate {
    pub english: Option<String>,
    pub vietnamese: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub image_url: Option<Option<String>>,
}

fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub id: String,
    pub english: String,
    pub vietnamese: String,
    pub user_answer: String,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EvaluationResult {
    pub fn graded(word: &Word, user_answer: impl Into<String>, correct: bool) -> Self {
        Self {
            id: word.id.clone(),
            english: word.english.clone(),
            vietnamese: word.vietnamese.clone(),
            user_answer: user_answer.into(),
            correct,
            image_url: word.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizType {
    Random,
    GrammarMcq,
    GrammarFitb,
}

impl QuizType {
    pub const fn as_str(self) -> &'static str {
        match self {
            QuizType::Random => "RANDOM",
            QuizType::GrammarMcq => "GRAMMAR_MCQ",
            QuizType::GrammarFitb => "GRAMMAR_FITB",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RANDOM" => Some(QuizType::Random),
            "GRAMMAR_MCQ" => Some(QuizType::GrammarMcq),
            "GRAMMAR_FITB" => Some(QuizType::GrammarFitb),
            _ => None,
        }
    }

    pub const fn scoring_mode(self) -> ScoringMode {
        match self {
            QuizType::Random => ScoringMode::RawCount,
            QuizType::GrammarMcq | QuizType::GrammarFitb => ScoringMode::TenPoint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoringMode {
    RawCount,
    TenPoint,
}

impl ScoringMode {
    pub fn score(self, correct_count: u32, total: u32) -> Score {
        match self {
            ScoringMode::RawCount => Score::RawCount(correct_count),
            ScoringMode::TenPoint => Score::TenPoint(ten_point_score(correct_count, total)),
        }
    }
}

/// `correct / total * 10`, or 0 for an empty quiz.
pub fn ten_point_score(correct_count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct_count) / f64::from(total) * 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Score {
    RawCount(u32),
    TenPoint(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizHistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub quiz_type: QuizType,
    pub topic: String,
    pub correct_count: u32,
    pub total: u32,
    pub score: Score,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub word_ids: Vec<String>,
}

impl QuizHistoryEntry {
    pub fn new(
        quiz_type: QuizType,
        topic: impl Into<String>,
        correct_count: u32,
        total: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::restore(
            Uuid::new_v4().to_string(),
            timestamp,
            quiz_type,
            topic.into(),
            correct_count,
            total,
            Vec::new(),
        )
    }

    pub fn restore(
        id: String,
        timestamp: DateTime<Utc>,
        quiz_type: QuizType,
        topic: String,
        correct_count: u32,
        total: u32,
        word_ids: Vec<String>,
    ) -> Self {
        Self {
            id,
            timestamp,
            quiz_type,
            topic,
            correct_count,
            total,
            score: quiz_type.scoring_mode().score(correct_count, total),
            word_ids,
        }
    }

    pub fn with_word_ids(mut self, word_ids: Vec<String>) -> Self {
        self.word_ids = word_ids;
        self
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
