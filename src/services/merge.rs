// src/services/merge.rs

use std::collections::{HashMap, HashSet};

use crate::models::quiz::{AnswersExtraction, MergedQuestion, QuestionsExtraction, Quiz};

pub const DEFAULT_QUIZ_TITLE: &str = "Uploaded Quiz";

/// Identity of the quiz being assembled; everything not derived from the
/// extraction results.
#[derive(Debug, Clone)]
pub struct QuizMeta {
    pub id: String,
    pub filename: String,
    pub created_at: String,
}

/// Joins questions with the answer key by stringified question id.
///
/// Questions without a matching answer keep `correct_answer: None`; answers
/// pointing at unknown questions are dropped. Neither case is an error.
pub fn merge(questions: &QuestionsExtraction, answers: &AnswersExtraction, meta: QuizMeta) -> Quiz {
    let answer_map: HashMap<String, &str> = answers
        .answers
        .iter()
        .map(|a| (a.question_id.to_string(), a.correct_key.as_str()))
        .collect();

    let merged: Vec<MergedQuestion> = questions
        .questions
        .iter()
        .map(|q| MergedQuestion {
            id: q.id.clone(),
            question: q.question.clone(),
            options: q.options.clone(),
            correct_answer: answer_map.get(&q.id.to_string()).map(|k| k.to_string()),
        })
        .collect();

    let question_ids: HashSet<String> = merged.iter().map(|q| q.id.to_string()).collect();
    let unanswered = merged.iter().filter(|q| q.correct_answer.is_none()).count();
    let orphaned = answer_map
        .keys()
        .filter(|id| !question_ids.contains(*id))
        .count();
    if unanswered > 0 || orphaned > 0 {
        tracing::debug!(
            "Quiz {}: {} questions without an answer, {} answers without a question",
            meta.id,
            unanswered,
            orphaned
        );
    }

    Quiz {
        id: meta.id,
        quiz_title: questions
            .quiz_title
            .clone()
            .unwrap_or_else(|| DEFAULT_QUIZ_TITLE.to_string()),
        total_questions: merged.len(),
        questions: merged,
        created_at: meta.created_at,
        filename: meta.filename,
        has_answers: true,
    }
}
