// src/services/store.rs

use std::{
    cmp::Reverse,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        legacy::{FileMeta, QuizDocument},
        quiz::{Quiz, QuizSummary},
    },
    utils::text::is_valid_quiz_id,
};

/// Which raw extraction a debug artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Questions,
    Answers,
}

impl RawKind {
    fn suffix(self) -> &'static str {
        match self {
            RawKind::Questions => "_questions",
            RawKind::Answers => "_answers",
        }
    }
}

/// Quiz records kept as one JSON file each in a directory.
#[derive(Debug, Clone)]
pub struct QuizStore {
    dir: PathBuf,
}

impl QuizStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Writes `{id}_questions.json` or `{id}_answers.json`.
    pub async fn save_raw(
        &self,
        id: &str,
        kind: RawKind,
        raw: &serde_json::Value,
    ) -> Result<PathBuf, AppError> {
        let path = self.dir.join(format!("{}{}.json", id, kind.suffix()));
        write_pretty(&path, raw).await?;
        Ok(path)
    }

    /// Writes the merged quiz as `{id}.json`.
    pub async fn save(&self, quiz: &Quiz) -> Result<PathBuf, AppError> {
        let path = self.dir.join(format!("{}.json", quiz.id));
        write_pretty(&path, quiz).await?;
        tracing::info!("Saved quiz {} ({} questions)", quiz.id, quiz.total_questions);
        Ok(path)
    }

    /// Lists every stored quiz, newest first.
    ///
    /// Raw extraction artifacts are skipped. Files that cannot be read or
    /// parsed are logged and left out.
    pub async fn list(&self) -> Result<Vec<QuizSummary>, AppError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut quizzes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !is_quiz_file(&file_name) {
                continue;
            }

            match load_document(&entry.path()).await {
                Ok((doc, meta)) => quizzes.push(doc.summary(&meta)),
                Err(e) => tracing::warn!("Error loading {}: {}", file_name, e),
            }
        }

        quizzes.sort_by_key(|q| Reverse(sort_timestamp(&q.created_at)));
        Ok(quizzes)
    }

    /// Loads one quiz in canonical form, whatever its on-disk shape.
    pub async fn read(&self, id: &str) -> Result<Quiz, AppError> {
        if !is_valid_quiz_id(id) {
            return Err(AppError::BadRequest("Invalid quiz id".to_string()));
        }

        let path = self.dir.join(format!("{}.json", id));
        let (doc, meta) = load_document(&path).await.map_err(|e| match e {
            LoadError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                AppError::NotFound("Quiz not found".to_string())
            }
            other => AppError::InternalServerError(format!("quiz {}: {}", id, other)),
        })?;

        Ok(doc.into_quiz(&meta))
    }
}

/// Merged quiz files: `.json`, but not a raw `_questions`/`_answers` artifact.
pub fn is_quiz_file(file_name: &str) -> bool {
    file_name.ends_with(".json")
        && !file_name.contains(RawKind::Questions.suffix())
        && !file_name.contains(RawKind::Answers.suffix())
}

/// Sort key for `created_at`; anything unparseable sorts as the oldest.
pub fn sort_timestamp(created_at: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(created_at) {
        return dt.with_timezone(&Utc);
    }
    // Older records carry naive local timestamps (no offset).
    if let Ok(naive) = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

#[derive(Debug)]
enum LoadError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "{}", e),
            LoadError::Parse(e) => write!(f, "{}", e),
        }
    }
}

async fn load_document(path: &Path) -> Result<(QuizDocument, FileMeta), LoadError> {
    let content = tokio::fs::read(path).await.map_err(LoadError::Io)?;
    let value: serde_json::Value = serde_json::from_slice(&content).map_err(LoadError::Parse)?;
    let doc = QuizDocument::from_value(value).map_err(LoadError::Parse)?;

    let modified = tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(chrono::SecondsFormat::Millis, true));

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(".json")
        .unwrap_or(&file_name)
        .to_string();

    Ok((
        doc,
        FileMeta {
            stem,
            file_name,
            modified,
        },
    ))
}

async fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
