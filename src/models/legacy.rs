// src/models/legacy.rs

use serde::Deserialize;
use serde_json::Value;

use crate::{
    models::quiz::{MergedQuestion, QuestionId, Quiz, QuizOption, QuizSummary, StoredQuiz},
    utils::text::humanize_title,
};

/// Entry of the older bare-array quiz format.
/// Options are plain strings and the answer is the literal option text.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyQuestion {
    pub id: Option<QuestionId>,
    pub page: Option<QuestionId>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl LegacyQuestion {
    /// Converts to the canonical shape.
    /// Option keys are positional (`"1".."n"`); the answer is matched against
    /// the option texts after trimming both sides.
    pub fn into_merged(self, position: usize) -> MergedQuestion {
        let id = self
            .id
            .or(self.page)
            .unwrap_or(QuestionId::Number(position as i64 + 1));

        let answer = match self.answer {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let correct_answer = answer.and_then(|answer| {
            let wanted = answer.trim();
            self.options
                .iter()
                .position(|opt| opt.trim() == wanted)
                .map(|idx| (idx + 1).to_string())
        });

        let options = self
            .options
            .into_iter()
            .enumerate()
            .map(|(idx, text)| QuizOption {
                key: (idx + 1).to_string(),
                text,
            })
            .collect();

        MergedQuestion {
            id,
            question: self.question,
            options,
            correct_answer,
        }
    }
}

/// File-level facts used when the document itself lacks them.
#[derive(Debug, Clone)]
pub struct FileMeta {
    /// File name without the `.json` extension.
    pub stem: String,
    pub file_name: String,
    /// Modification time, RFC 3339.
    pub modified: Option<String>,
}

/// A stored quiz in either of its on-disk shapes.
/// Questions are kept raw so that listing only depends on the outer shape.
#[derive(Debug, Clone)]
pub enum QuizDocument {
    Legacy(Vec<Value>),
    Modern(StoredQuiz),
}

impl QuizDocument {
    /// Discriminates on the outer JSON shape: arrays are legacy, objects modern.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(entries) => Ok(QuizDocument::Legacy(entries)),
            Value::Object(_) => Ok(QuizDocument::Modern(serde_json::from_value(value)?)),
            other => Err(serde::de::Error::custom(format!(
                "expected a quiz object or legacy array, got {}",
                other
            ))),
        }
    }

    pub fn summary(&self, meta: &FileMeta) -> QuizSummary {
        match self {
            QuizDocument::Legacy(questions) => QuizSummary {
                id: meta.stem.clone(),
                title: humanize_title(&meta.stem),
                total_questions: questions.len(),
                created_at: meta.modified.clone().unwrap_or_default(),
                filename: meta.file_name.clone(),
            },
            QuizDocument::Modern(stored) => QuizSummary {
                id: stored.id.clone().unwrap_or_else(|| meta.stem.clone()),
                title: stored
                    .quiz_title
                    .clone()
                    .unwrap_or_else(|| "Untitled Quiz".to_string()),
                total_questions: stored.total_questions.unwrap_or(stored.questions.len()),
                created_at: stored.created_at.clone().unwrap_or_default(),
                filename: stored
                    .filename
                    .clone()
                    .unwrap_or_else(|| meta.file_name.clone()),
            },
        }
    }

    /// Resolves the document into the single in-memory shape used downstream.
    pub fn into_quiz(self, meta: &FileMeta) -> Quiz {
        match self {
            QuizDocument::Legacy(questions) => {
                let questions: Vec<MergedQuestion> = questions
                    .into_iter()
                    .enumerate()
                    .filter_map(|(idx, entry)| {
                        match serde_json::from_value::<LegacyQuestion>(entry) {
                            Ok(q) => Some(q.into_merged(idx)),
                            Err(e) => {
                                tracing::warn!(
                                    "{}: skipping legacy question {}: {}",
                                    meta.file_name,
                                    idx + 1,
                                    e
                                );
                                None
                            }
                        }
                    })
                    .collect();
                let has_answers = questions.iter().any(|q| q.correct_answer.is_some());

                Quiz {
                    id: meta.stem.clone(),
                    quiz_title: humanize_title(&meta.stem),
                    total_questions: questions.len(),
                    questions,
                    created_at: meta.modified.clone().unwrap_or_default(),
                    filename: meta.file_name.clone(),
                    has_answers,
                }
            }
            QuizDocument::Modern(stored) => {
                let questions: Vec<MergedQuestion> = stored
                    .questions
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, entry)| MergedQuestion::from_entry(entry, idx))
                    .collect();
                let has_answers = stored
                    .has_answers
                    .unwrap_or_else(|| questions.iter().any(|q| q.correct_answer.is_some()));

                Quiz {
                    id: stored.id.unwrap_or_else(|| meta.stem.clone()),
                    quiz_title: stored
                        .quiz_title
                        .unwrap_or_else(|| "Untitled Quiz".to_string()),
                    total_questions: questions.len(),
                    questions,
                    created_at: stored.created_at.unwrap_or_default(),
                    filename: stored.filename.unwrap_or_else(|| meta.file_name.clone()),
                    has_answers,
                }
            }
        }
    }
}
