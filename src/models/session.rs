// src/models/session.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::quiz::QuestionId;

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitSelectionsRequest {
    /// Key: question id (string form).
    /// Value: the selected option key.
    #[serde(default)]
    #[validate(custom(function = validate_selections))]
    pub selections: HashMap<String, String>,
}

fn validate_selections(
    selections: &HashMap<String, String>,
) -> Result<(), validator::ValidationError> {
    for key in selections.values() {
        if key.is_empty() || key.chars().count() > 16 {
            return Err(validator::ValidationError::new("invalid_option_key"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Skipped,
}

/// Per-question line of the results review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// 1-based display position.
    pub index: usize,
    pub question_id: QuestionId,
    pub question: String,
    pub selected: Option<String>,
    pub correct_answer: Option<String>,
    pub outcome: Outcome,
    /// The correct key, shown whenever the user did not get it right.
    pub reveal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResults {
    pub score: usize,
    pub attempted: usize,
    pub total: usize,
    pub percentage: u32,
    pub review: Vec<ReviewItem>,
}
