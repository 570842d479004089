// src/handlers/upload.rs

use std::path::PathBuf;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    response::IntoResponse,
};
use chrono::{SecondsFormat, Utc};

use crate::{
    config::Config,
    error::AppError,
    models::quiz::{AnswersExtraction, QuestionsExtraction, UploadResponse},
    services::{
        extractor::Extractor,
        merge::{QuizMeta, merge},
        prompts::{ANSWERS_TASK, PROMPT_ANSWERS, PROMPT_QUESTIONS, QUESTIONS_TASK},
        store::{QuizStore, RawKind},
    },
    utils::text::file_name_component,
};

/// One uploaded PDF held in memory until it is written to the upload dir.
struct UploadedPdf {
    file_name: String,
    data: Bytes,
}

/// Short random token used as quiz id and file prefix.
pub fn new_quiz_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Turns a questions PDF and an answers PDF into a stored quiz.
///
/// * Both PDFs are kept in the upload directory under the new quiz id.
/// * Questions are extracted first, then answers; either failure aborts
///   before anything is written to the quiz directory.
/// * Raw extractions are saved next to the merged quiz for debugging.
pub async fn upload_files(
    State(config): State<Config>,
    State(store): State<QuizStore>,
    State(extractor): State<Extractor>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut questions_file: Option<UploadedPdf> = None;
    let mut answers_file: Option<UploadedPdf> = None;

    while let Some(field) = multipart.next_field().await? {
        let slot = match field.name() {
            Some("questions_file") => &mut questions_file,
            Some("answers_file") => &mut answers_file,
            _ => continue,
        };
        let file_name = field.file_name().map(file_name_component).unwrap_or_default();
        let data = field.bytes().await?;
        *slot = Some(UploadedPdf { file_name, data });
    }

    let (Some(questions_file), Some(answers_file)) = (questions_file, answers_file) else {
        return Err(AppError::BadRequest(
            "Both questions and answers PDFs are required".to_string(),
        ));
    };

    if questions_file.file_name.is_empty() || answers_file.file_name.is_empty() {
        return Err(AppError::BadRequest("No selected file".to_string()));
    }

    let quiz_id = new_quiz_id();
    tracing::info!(
        "Upload {}: questions={} answers={}",
        quiz_id,
        questions_file.file_name,
        answers_file.file_name
    );

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let questions_path = save_upload(&config, &quiz_id, "questions", &questions_file).await?;
    let answers_path = save_upload(&config, &quiz_id, "answers", &answers_file).await?;

    // 1. Extract Questions
    let questions_raw = extractor
        .extract(&questions_path, PROMPT_QUESTIONS, QUESTIONS_TASK)
        .await
        .map_err(|e| {
            tracing::error!("Quiz {}: {}", quiz_id, e);
            AppError::ExtractionFailed("Failed to extract questions".to_string())
        })?;

    // 2. Extract Answers
    let answers_raw = extractor
        .extract(&answers_path, PROMPT_ANSWERS, ANSWERS_TASK)
        .await
        .map_err(|e| {
            tracing::error!("Quiz {}: {}", quiz_id, e);
            AppError::ExtractionFailed("Failed to extract answers".to_string())
        })?;

    // 3. Save Raw JSONs
    store.ensure_dir().await?;
    store.save_raw(&quiz_id, RawKind::Questions, &questions_raw).await?;
    store.save_raw(&quiz_id, RawKind::Answers, &answers_raw).await?;

    // 4. Merge and save
    let quiz = merge(
        &QuestionsExtraction::from_value(&questions_raw),
        &AnswersExtraction::from_value(&answers_raw),
        QuizMeta {
            id: quiz_id.clone(),
            filename: questions_file.file_name.clone(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        },
    );
    store.save(&quiz).await?;

    Ok(Json(UploadResponse {
        message: "Files processed successfully".to_string(),
        quiz_id,
        title: quiz.quiz_title,
    }))
}

async fn save_upload(
    config: &Config,
    quiz_id: &str,
    kind: &str,
    upload: &UploadedPdf,
) -> Result<PathBuf, AppError> {
    let path = config
        .upload_dir
        .join(format!("{}_{}_{}", quiz_id, kind, upload.file_name));
    tokio::fs::write(&path, &upload.data).await?;
    Ok(path)
}
