//! Read-only grammar question bank.
//!
//! The bundled bank is compiled in from `data/grammar/`: `tenses.json` holds
//! the catalog and every tense has an MCQ file and, optionally, a FITB file.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenseCategory {
    Present,
    Past,
    Future,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenseConfig {
    pub id: String,
    pub name: String,
    pub category: TenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarQuestion {
    pub sentence: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitbQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Mcq,
    Fitb,
}

impl QuizMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "mcq" => Some(QuizMode::Mcq),
            "fitb" => Some(QuizMode::Fitb),
            _ => None,
        }
    }
}

pub trait QuestionSource: Send + Sync {
    /// Real tenses only; the aggregate pseudo-tense is added by the quiz engine.
    fn tenses(&self) -> &[TenseConfig];

    fn mcq_questions(&self, tense_id: &str) -> Vec<GrammarQuestion>;

    fn fitb_questions(&self, tense_id: &str) -> Vec<FitbQuestion>;
}

#[derive(Debug, Error)]
pub enum QuestionSourceError {
    #[error("malformed question file {file}: {source}")]
    Malformed {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("tense {0} listed in the catalog has no question file")]
    MissingTense(String),
    #[error("question {index} in {file} points at option {correct_index} of {options}")]
    BadCorrectIndex {
        file: &'static str,
        index: usize,
        correct_index: usize,
        options: usize,
    },
}

struct BundledTense {
    id: &'static str,
    mcq: (&'static str, &'static str),
    fitb: Option<(&'static str, &'static str)>,
}

macro_rules! grammar_file {
    ($name:literal) => {
        ($name, include_str!(concat!("../../data/grammar/", $name)))
    };
}

const TENSES_FILE: (&str, &str) = grammar_file!("tenses.json");

const BUNDLED: &[BundledTense] = &[
    BundledTense {
        id: "present-simple",
        mcq: grammar_file!("present_simple.json"),
        fitb: Some(grammar_file!("present_simple_fitb.json")),
    },
    BundledTense {
        id: "present-continuous",
        mcq: grammar_file!("present_continuous.json"),
        fitb: Some(grammar_file!("present_continuous_fitb.json")),
    },
    BundledTense {
        id: "present-perfect",
        mcq: grammar_file!("present_perfect.json"),
        fitb: Some(grammar_file!("present_perfect_fitb.json")),
    },
    BundledTense {
        id: "present-perfect-continuous",
        mcq: grammar_file!("present_perfect_continuous.json"),
        fitb: None,
    },
    BundledTense {
        id: "past-simple",
        mcq: grammar_file!("past_simple.json"),
        fitb: Some(grammar_file!("past_simple_fitb.json")),
    },
    BundledTense {
        id: "past-continuous",
        mcq: grammar_file!("past_continuous.json"),
        fitb: Some(grammar_file!("past_continuous_fitb.json")),
    },
    BundledTense {
        id: "past-perfect",
        mcq: grammar_file!("past_perfect.json"),
        fitb: None,
    },
    BundledTense {
        id: "future-simple",
        mcq: grammar_file!("future_simple.json"),
        fitb: Some(grammar_file!("future_simple_fitb.json")),
    },
    BundledTense {
        id: "future-continuous",
        mcq: grammar_file!("future_continuous.json"),
        fitb: None,
    },
    BundledTense {
        id: "future-perfect",
        mcq: grammar_file!("future_perfect.json"),
        fitb: None,
    },
];

/// Question bank held in memory; built from the bundled files or from parts.
#[derive(Debug, Clone, Default)]
pub struct BundledQuestionSource {
    tenses: Vec<TenseConfig>,
    mcq: HashMap<String, Vec<GrammarQuestion>>,
    fitb: HashMap<String, Vec<FitbQuestion>>,
}

impl BundledQuestionSource {
    pub fn load() -> Result<Self, QuestionSourceError> {
        let tenses: Vec<TenseConfig> = parse(TENSES_FILE)?;

        let mut mcq = HashMap::new();
        let mut fitb = HashMap::new();
        for bundled in BUNDLED {
            let questions: Vec<GrammarQuestion> = parse(bundled.mcq)?;
            validate_mcq(bundled.mcq.0, &questions)?;
            mcq.insert(bundled.id.to_string(), questions);

            if let Some(file) = bundled.fitb {
                fitb.insert(bundled.id.to_string(), parse::<Vec<FitbQuestion>>(file)?);
            }
        }

        if let Some(missing) = tenses.iter().find(|t| !mcq.contains_key(&t.id)) {
            return Err(QuestionSourceError::MissingTense(missing.id.clone()));
        }

        tracing::debug!(
            tenses = tenses.len(),
            mcq_sets = mcq.len(),
            fitb_sets = fitb.len(),
            "grammar question bank loaded"
        );
        Ok(Self { tenses, mcq, fitb })
    }

    pub fn from_parts(
        tenses: Vec<TenseConfig>,
        mcq: HashMap<String, Vec<GrammarQuestion>>,
        fitb: HashMap<String, Vec<FitbQuestion>>,
    ) -> Self {
        Self { tenses, mcq, fitb }
    }
}

impl QuestionSource for BundledQuestionSource {
    fn tenses(&self) -> &[TenseConfig] {
        &self.tenses
    }

    fn mcq_questions(&self, tense_id: &str) -> Vec<GrammarQuestion> {
        self.mcq.get(tense_id).cloned().unwrap_or_default()
    }

    fn fitb_questions(&self, tense_id: &str) -> Vec<FitbQuestion> {
        self.fitb.get(tense_id).cloned().unwrap_or_default()
    }
}

fn parse<T: serde::de::DeserializeOwned>(
    (file, raw): (&'static str, &'static str),
) -> Result<T, QuestionSourceError> {
    serde_json::from_str(raw).map_err(|source| QuestionSourceError::Malformed { file, source })
}

fn validate_mcq(file: &'static str, questions: &[GrammarQuestion]) -> Result<(), QuestionSourceError> {
    for (index, q) in questions.iter().enumerate() {
        if q.correct_index >= q.options.len() {
            return Err(QuestionSourceError::BadCorrectIndex {
                file,
                index,
                correct_index: q.correct_index,
                options: q.options.len(),
            });
        }
    }
    Ok(())
}
