// tests/store_tests.rs

mod common;

use common::scratch_dir;
use pdf_quiz::{
    error::AppError,
    models::quiz::{AnswersExtraction, QuestionsExtraction},
    services::{
        merge::{QuizMeta, merge},
        store::{QuizStore, RawKind},
    },
};
use serde_json::json;

fn write(store: &QuizStore, name: &str, content: &str) {
    std::fs::write(store.dir().join(name), content).unwrap();
}

#[tokio::test]
async fn listing_skips_corrupt_files_and_sorts_newest_first() {
    let store = QuizStore::new(scratch_dir("store"));

    write(
        &store,
        "older001.json",
        &json!({
            "id": "older001",
            "quiz_title": "Older",
            "total_questions": 3,
            "questions": [],
            "created_at": "2024-01-01T08:00:00.000Z",
            "filename": "older.pdf",
            "has_answers": true
        })
        .to_string(),
    );
    write(
        &store,
        "newer001.json",
        &json!({
            "id": "newer001",
            "quiz_title": "Newer",
            "total_questions": 5,
            "questions": [],
            "created_at": "2024-03-01T08:00:00.000Z",
            "filename": "newer.pdf",
            "has_answers": true
        })
        .to_string(),
    );
    write(&store, "broken01.json", "{ this is not json");

    let quizzes = store.list().await.unwrap();

    let ids: Vec<&str> = quizzes.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["newer001", "older001"]);
    assert_eq!(quizzes[0].title, "Newer");
    assert_eq!(quizzes[0].total_questions, 5);
    assert_eq!(quizzes[1].filename, "older.pdf");
}

#[tokio::test]
async fn listing_ignores_raw_artifacts_and_other_files() {
    let store = QuizStore::new(scratch_dir("store"));

    write(&store, "abcd1234_questions.json", r#"{"questions": []}"#);
    write(&store, "abcd1234_answers.json", r#"{"answers": []}"#);
    write(&store, "readme.txt", "hello");
    write(&store, "abcd1234.json", r#"{"id": "abcd1234", "quiz_title": "Kept"}"#);

    let quizzes = store.list().await.unwrap();

    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0].title, "Kept");
}

#[tokio::test]
async fn legacy_arrays_are_listed_with_humanized_titles() {
    let store = QuizStore::new(scratch_dir("store"));

    write(
        &store,
        "world_capitals.json",
        &json!([
            { "id": 1, "question": "Capital of Italy?", "answer": "Rome", "options": ["Rome", "Milan"] },
            { "id": 2, "question": "Capital of Spain?", "answer": "Madrid", "options": ["Seville", "Madrid"] }
        ])
        .to_string(),
    );
    write(
        &store,
        "dated001.json",
        r#"{"id": "dated001", "quiz_title": "Undated"}"#,
    );

    let quizzes = store.list().await.unwrap();

    // legacy entry gets the file's mtime; the modern one has no timestamp
    assert_eq!(quizzes.len(), 2);
    assert_eq!(quizzes[0].id, "world_capitals");
    assert_eq!(quizzes[0].title, "World Capitals");
    assert_eq!(quizzes[0].total_questions, 2);
    assert_eq!(quizzes[0].filename, "world_capitals.json");
    assert!(!quizzes[0].created_at.is_empty());
    assert_eq!(quizzes[1].id, "dated001");
    assert_eq!(quizzes[1].created_at, "");
}

#[tokio::test]
async fn quizzes_with_sparse_questions_stay_listed_and_readable() {
    let store = QuizStore::new(scratch_dir("store"));

    write(
        &store,
        "abcd1234.json",
        &json!({
            "id": "abcd1234",
            "quiz_title": "Sparse",
            "questions": [{ "id": 1, "question": "q" }],
            "created_at": "2024-05-05T05:05:05.000Z"
        })
        .to_string(),
    );

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "abcd1234");
    assert_eq!(listed[0].total_questions, 1);

    let quiz = store.read("abcd1234").await.unwrap();
    assert_eq!(quiz.total_questions, 1);
    assert!(quiz.questions[0].options.is_empty());
}

#[tokio::test]
async fn listed_legacy_ids_can_be_read_back() {
    let store = QuizStore::new(scratch_dir("store"));

    write(
        &store,
        "unit 3.1.json",
        &json!([{ "question": "Boiling point of water?", "answer": "100", "options": ["90", "100"] }])
            .to_string(),
    );

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "unit 3.1");

    let quiz = store.read(&listed[0].id).await.unwrap();
    assert_eq!(quiz.questions[0].correct_answer.as_deref(), Some("2"));
}

#[tokio::test]
async fn missing_directory_lists_nothing() {
    let store = QuizStore::new(scratch_dir("store").join("does_not_exist"));

    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn saved_quiz_reads_back_with_raw_artifacts_alongside() {
    let store = QuizStore::new(scratch_dir("store"));

    let questions_raw = json!({
        "quiz_title": "Chemistry",
        "questions": [{
            "id": 1,
            "question": "H2O is?",
            "options": [
                { "key": "1", "text": "Water" },
                { "key": "2", "text": "Salt" },
                { "key": "3", "text": "Sugar" },
                { "key": "4", "text": "Air" }
            ]
        }]
    });
    let answers_raw = json!({ "answers": [{ "question_id": 1, "correct_key": "A" }] });

    store.save_raw("chem0001", RawKind::Questions, &questions_raw).await.unwrap();
    store.save_raw("chem0001", RawKind::Answers, &answers_raw).await.unwrap();

    let quiz = merge(
        &QuestionsExtraction::from_value(&questions_raw),
        &AnswersExtraction::from_value(&answers_raw),
        QuizMeta {
            id: "chem0001".to_string(),
            filename: "chem.pdf".to_string(),
            created_at: "2024-02-02T02:02:02.000Z".to_string(),
        },
    );
    store.save(&quiz).await.unwrap();

    assert!(store.dir().join("chem0001_questions.json").exists());
    assert!(store.dir().join("chem0001_answers.json").exists());

    let loaded = store.read("chem0001").await.unwrap();
    assert_eq!(loaded, quiz);
    assert_eq!(loaded.questions[0].correct_answer.as_deref(), Some("1"));

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Chemistry");
}

#[tokio::test]
async fn reading_unknown_or_unsafe_ids_fails_cleanly() {
    let store = QuizStore::new(scratch_dir("store"));

    assert!(matches!(store.read("nope1234").await, Err(AppError::NotFound(_))));
    assert!(matches!(store.read("../etc").await, Err(AppError::BadRequest(_))));
}
