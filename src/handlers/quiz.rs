// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::session::SubmitSelectionsRequest,
    services::{session::ClientState, store::QuizStore},
};

/// Lists stored quizzes, newest first.
pub async fn list_quizzes(State(store): State<QuizStore>) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list().await?;
    Ok(Json(quizzes))
}

/// Retrieves one quiz in canonical form (legacy files are normalized).
pub async fn get_quiz(
    State(store): State<QuizStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store.read(&id).await?;
    Ok(Json(quiz))
}

/// Scores a finished attempt.
///
/// * Loads the quiz and starts a session on it.
/// * Walks every question in order, applying the submitted selection.
/// * Returns score, percentage and the per-question review.
pub async fn submit_quiz(
    State(store): State<QuizStore>,
    Path(id): Path<String>,
    Json(req): Json<SubmitSelectionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = store.read(&id).await?;

    let mut session = match ClientState::loaded::<AppError>(Ok(quiz)) {
        ClientState::Active(session) => session,
        ClientState::Empty => {
            return Err(AppError::BadRequest("Quiz has no questions".to_string()));
        }
        ClientState::Loading | ClientState::Error(_) => {
            return Err(AppError::InternalServerError(format!(
                "quiz {} did not load",
                id
            )));
        }
    };

    session.replay(&req.selections);
    let results = session.results();

    tracing::info!(
        "Quiz {} submitted: {}/{} ({}%)",
        id,
        results.score,
        results.total,
        results.percentage
    );

    Ok(Json(results))
}
