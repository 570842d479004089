// src/models/quiz.rs

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Question identifier as emitted by the extractor.
/// Models return either numbers or strings, so both are kept verbatim and
/// compared through their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(n) => write!(f, "{}", n),
            QuestionId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        QuestionId::Number(n)
    }
}

/// One answer choice of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    #[serde(deserialize_with = "string_or_number")]
    pub key: String,
    pub text: String,
}

/// A question as extracted from the questions PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedQuestion {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<QuizOption>,
}

/// One row of the answer key extracted from the answers PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAnswer {
    pub question_id: QuestionId,
    #[serde(deserialize_with = "string_or_number")]
    pub correct_key: String,
}

/// Parsed output of the questions extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionsExtraction {
    pub quiz_title: Option<String>,
    pub questions: Vec<ExtractedQuestion>,
}

impl QuestionsExtraction {
    /// Reads the raw model output. Every object in `questions` becomes a
    /// question, with gaps filled from its position; a missing or non-array
    /// `questions` field yields no questions.
    pub fn from_value(raw: &Value) -> Self {
        let quiz_title = raw
            .get("quiz_title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let questions = lenient_list(raw, "questions")
            .into_iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                let question = ExtractedQuestion::from_entry(entry, position);
                if question.is_none() {
                    tracing::warn!("Skipping question entry that is not an object: {}", entry);
                }
                question
            })
            .collect();

        Self {
            quiz_title,
            questions,
        }
    }
}

impl ExtractedQuestion {
    /// Builds a question from one raw entry.
    ///
    /// A missing id falls back to the 1-based position. Options may be
    /// `{key, text}` objects or plain strings; a string or a keyless object
    /// gets its 1-based position as key. Only non-objects yield `None`.
    pub fn from_entry(entry: &Value, position: usize) -> Option<Self> {
        let fields = entry.as_object()?;

        let id = fields
            .get("id")
            .and_then(question_id)
            .unwrap_or(QuestionId::Number(position as i64 + 1));
        let question = fields
            .get("question")
            .and_then(scalar_text)
            .unwrap_or_default();
        let options = match fields.get("options") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| option_from(item, idx))
                .collect(),
            _ => Vec::new(),
        };

        Some(
            Self {
                id,
                question,
                options,
            }
            .dedup_options(),
        )
    }

    /// Keeps the first option for every key.
    fn dedup_options(mut self) -> Self {
        let mut seen = HashSet::new();
        let before = self.options.len();
        self.options.retain(|opt| seen.insert(opt.key.clone()));
        if self.options.len() != before {
            tracing::warn!(
                "Question {} had duplicate option keys; kept {} of {}",
                self.id,
                self.options.len(),
                before
            );
        }
        self
    }
}

fn question_id(value: &Value) -> Option<QuestionId> {
    match value {
        Value::Number(n) => Some(
            n.as_i64()
                .map(QuestionId::Number)
                .unwrap_or_else(|| QuestionId::Text(n.to_string())),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(QuestionId::Text(s.clone())),
        _ => None,
    }
}

fn option_from(item: &Value, idx: usize) -> Option<QuizOption> {
    let positional = || (idx + 1).to_string();
    match item {
        Value::Object(fields) => {
            let text = fields.get("text").and_then(scalar_text)?;
            let key = fields
                .get("key")
                .and_then(scalar_text)
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(positional);
            Some(QuizOption { key, text })
        }
        other => scalar_text(other).map(|text| QuizOption {
            key: positional(),
            text,
        }),
    }
}

/// Strings as-is, numbers stringified, anything else absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parsed output of the answers extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswersExtraction {
    pub answers: Vec<ExtractedAnswer>,
}

impl AnswersExtraction {
    pub fn from_value(raw: &Value) -> Self {
        let answers = lenient_list(raw, "answers")
            .into_iter()
            .filter_map(|entry| {
                match serde_json::from_value::<ExtractedAnswer>(entry.clone()) {
                    Ok(mut answer) => {
                        answer.correct_key = normalize_answer_key(&answer.correct_key);
                        Some(answer)
                    }
                    Err(e) => {
                        tracing::warn!("Skipping malformed answer entry: {}", e);
                        None
                    }
                }
            })
            .collect();

        Self { answers }
    }
}

/// Maps letter answers `A`-`D` onto option keys `1`-`4`.
pub fn normalize_answer_key(raw: &str) -> String {
    let key = raw.trim();
    match key.to_ascii_uppercase().as_str() {
        "A" => "1".to_string(),
        "B" => "2".to_string(),
        "C" => "3".to_string(),
        "D" => "4".to_string(),
        _ => key.to_string(),
    }
}

fn lenient_list<'a>(raw: &'a Value, field: &str) -> Vec<&'a Value> {
    match raw.get(field) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => {
            tracing::warn!("Expected `{}` to be a list, got {}", field, other);
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// A question joined with its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedQuestion {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<QuizOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl MergedQuestion {
    /// Reads a stored question with the same leniency as extraction output.
    pub fn from_entry(entry: &Value, position: usize) -> Option<Self> {
        let question = ExtractedQuestion::from_entry(entry, position)?;
        Some(Self {
            id: question.id,
            question: question.question,
            options: question.options,
            correct_answer: entry.get("correct_answer").and_then(scalar_text),
        })
    }
}

/// Represents one stored quiz file (`{id}.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub quiz_title: String,
    pub total_questions: usize,
    pub questions: Vec<MergedQuestion>,
    pub created_at: String,
    pub filename: String,
    pub has_answers: bool,
}

/// Modern quiz file as found on disk, top-level fields only.
/// Every field may be missing or mistyped in hand-edited or older files, so
/// such fields read as absent and the store fills the gaps. Questions stay
/// raw until the quiz is actually opened.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredQuiz {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quiz_title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_questions: Option<usize>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub questions: Vec<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_answers: Option<bool>,
}

/// Listing entry returned by `GET /quizzes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub total_questions: usize,
    pub created_at: String,
    pub filename: String,
}

/// DTO returned by `POST /upload`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub quiz_id: String,
    pub title: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_vec<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}
