// src/services/session.rs

use std::collections::HashMap;

use crate::models::{
    quiz::{MergedQuestion, QuestionId, Quiz},
    session::{Outcome, QuizResults, ReviewItem},
};

/// What a quiz-taking client is showing.
#[derive(Debug, Clone)]
pub enum ClientState {
    Loading,
    Error(String),
    Empty,
    Active(QuizSession),
}

impl ClientState {
    /// Moves out of `Loading` once the quiz fetch has finished.
    pub fn loaded<E: std::fmt::Display>(result: Result<Quiz, E>) -> Self {
        match result {
            Ok(quiz) if quiz.questions.is_empty() => ClientState::Empty,
            Ok(quiz) => ClientState::Active(QuizSession {
                quiz,
                position: Position::Question(0),
                selections: HashMap::new(),
            }),
            Err(e) => ClientState::Error(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Question(usize),
    Results,
}

/// One pass through a non-empty quiz.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    position: Position,
    /// Keyed by question id, not by index.
    selections: HashMap<String, String>,
}

impl QuizSession {
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position == Position::Results
    }

    pub fn current(&self) -> Option<&MergedQuestion> {
        match self.position {
            Position::Question(i) => self.quiz.questions.get(i),
            Position::Results => None,
        }
    }

    /// Records (or overwrites) the selection for the current question.
    /// Does not advance.
    pub fn select(&mut self, key: impl Into<String>) {
        if let Some(id) = self.current().map(|q| q.id.to_string()) {
            self.selections.insert(id, key.into());
        }
    }

    pub fn selection_for(&self, id: &QuestionId) -> Option<&str> {
        self.selections.get(&id.to_string()).map(String::as_str)
    }

    /// Advances; on the last question this finishes the quiz instead.
    pub fn next(&mut self) {
        if let Position::Question(i) = self.position {
            self.position = if i + 1 < self.quiz.questions.len() {
                Position::Question(i + 1)
            } else {
                Position::Results
            };
        }
    }

    /// No-op on the first question and on the results page.
    pub fn previous(&mut self) {
        if let Position::Question(i) = self.position {
            if i > 0 {
                self.position = Position::Question(i - 1);
            }
        }
    }

    /// Score and review. Available at any point, though clients only show
    /// it once the session is finished.
    pub fn results(&self) -> QuizResults {
        let total = self.quiz.questions.len();
        let mut score = 0;
        let mut attempted = 0;

        let review = self
            .quiz
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                let selected = self.selection_for(&q.id).map(str::to_string);
                let outcome = match (&selected, &q.correct_answer) {
                    (None, _) => Outcome::Skipped,
                    (Some(sel), Some(correct)) if sel == correct => Outcome::Correct,
                    (Some(_), _) => Outcome::Incorrect,
                };

                if selected.is_some() {
                    attempted += 1;
                }
                if outcome == Outcome::Correct {
                    score += 1;
                }

                let reveal = match outcome {
                    Outcome::Correct => None,
                    _ => q.correct_answer.clone(),
                };

                ReviewItem {
                    index: idx + 1,
                    question_id: q.id.clone(),
                    question: q.question.clone(),
                    selected,
                    correct_answer: q.correct_answer.clone(),
                    outcome,
                    reveal,
                }
            })
            .collect();

        let percentage = if total == 0 {
            0
        } else {
            (score as f64 / total as f64 * 100.0).round() as u32
        };

        QuizResults {
            score,
            attempted,
            total,
            percentage,
            review,
        }
    }

    /// Walks the quiz from the current question to the end, selecting
    /// whatever `selections` holds for each question on the way.
    pub fn replay(&mut self, selections: &HashMap<String, String>) {
        while let Some(id) = self.current().map(|q| q.id.to_string()) {
            if let Some(key) = selections.get(&id) {
                self.select(key.clone());
            }
            self.next();
        }
    }
}
