use std::collections::HashMap;

use chrono::{Duration, Utc};

use vocab_backend::models::{NewWord, QuizHistoryEntry, QuizType, SessionStatus, WordUpdate};
use vocab_backend::services::history::{HistoryStore, RecordOutcome, HISTORY_CAP};
use vocab_backend::services::{evaluation, random_quiz, sessions, words, ServiceError};

mod common;

use common::create_test_db;

#[tokio::test]
async fn cat_dog_end_to_end() {
    let db = create_test_db().await;
    let session = sessions::create_session(&db, None).await.unwrap();
    assert_eq!(session.status, SessionStatus::New);

    let saved = words::save_words(
        &db,
        &session.id,
        vec![NewWord::new("cat", "con mèo"), NewWord::new("dog", "con chó")],
    )
    .await
    .unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(
        sessions::get_session(&db, &session.id).await.unwrap().status,
        SessionStatus::Learning
    );

    let answers = HashMap::from([
        (saved[0].id.clone(), "Cat".to_string()),
        (saved[1].id.clone(), "dgo".to_string()),
    ]);
    let results = evaluation::submit_learning(&db, &session.id, &answers)
        .await
        .unwrap();

    let graded: Vec<_> = results
        .iter()
        .map(|r| (r.english.as_str(), r.user_answer.as_str(), r.correct))
        .collect();
    assert_eq!(graded, vec![("cat", "Cat", true), ("dog", "dgo", false)]);

    let session = sessions::get_session(&db, &session.id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Done);
    assert_eq!(session.word_count, 2);

    let again = evaluation::get_results(&db, &session.id).await.unwrap();
    assert_eq!(again, results);
}

#[tokio::test]
async fn empty_submission_still_completes_session() {
    let db = create_test_db().await;
    let session = sessions::create_session(&db, Some("Fruit")).await.unwrap();
    words::save_words(&db, &session.id, vec![NewWord::new("apple", "quả táo")])
        .await
        .unwrap();

    let results = evaluation::submit_learning(&db, &session.id, &HashMap::new())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].correct);
    assert_eq!(results[0].user_answer, "");

    let session = sessions::get_session(&db, &session.id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Done);
}

#[tokio::test]
async fn results_before_any_submission_are_blank() {
    let db = create_test_db().await;
    let session = sessions::create_session(&db, None).await.unwrap();
    words::save_words(&db, &session.id, vec![NewWord::new("apple", "quả táo")])
        .await
        .unwrap();

    let results = evaluation::get_results(&db, &session.id).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].user_answer, "");
    assert!(!results[0].correct);
}

#[tokio::test]
async fn done_cannot_be_requested_directly() {
    let db = create_test_db().await;
    let session = sessions::create_session(&db, None).await.unwrap();

    let err = sessions::update_status(&db, &session.id, SessionStatus::Done)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    let session = sessions::update_status(&db, &session.id, SessionStatus::Learning)
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Learning);
}

#[tokio::test]
async fn finished_session_can_be_retried() {
    let db = create_test_db().await;
    let session = sessions::create_session(&db, None).await.unwrap();
    words::save_words(&db, &session.id, vec![NewWord::new("apple", "quả táo")])
        .await
        .unwrap();
    evaluation::submit_learning(&db, &session.id, &HashMap::new())
        .await
        .unwrap();

    let retried = sessions::update_status(&db, &session.id, SessionStatus::Learning)
        .await
        .unwrap();
    assert_eq!(retried.status, SessionStatus::Learning);
}

#[tokio::test]
async fn unknown_session_is_not_found_everywhere() {
    let db = create_test_db().await;
    let missing = "00000000-0000-0000-0000-000000000000";

    assert!(matches!(
        sessions::get_session(&db, missing).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        words::list_words(&db, missing).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        words::save_words(&db, missing, vec![NewWord::new("a", "b")]).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        evaluation::submit_learning(&db, missing, &HashMap::new()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        sessions::update_topic(&db, missing, "x").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_twice_is_not_found() {
    let db = create_test_db().await;
    let session = sessions::create_session(&db, None).await.unwrap();
    words::save_words(&db, &session.id, vec![NewWord::new("cat", "con mèo")])
        .await
        .unwrap();

    sessions::delete_session(&db, &session.id).await.unwrap();
    assert!(matches!(
        sessions::delete_session(&db, &session.id).await,
        Err(ServiceError::NotFound(_))
    ));

    assert!(matches!(
        random_quiz::compose_random_quiz(&db, &db.history()).await,
        Err(ServiceError::InsufficientData(_))
    ));
}

#[tokio::test]
async fn saving_again_replaces_words() {
    let db = create_test_db().await;
    let session = sessions::create_session(&db, None).await.unwrap();
    words::save_words(&db, &session.id, vec![NewWord::new("cat", "con mèo")])
        .await
        .unwrap();
    words::save_words(
        &db,
        &session.id,
        vec![NewWord::new("sun", "mặt trời"), NewWord::new("moon", "mặt trăng")],
    )
    .await
    .unwrap();

    let listed = words::list_words(&db, &session.id).await.unwrap();
    let english: Vec<_> = listed.iter().map(|w| w.english.as_str()).collect();
    assert_eq!(english, vec!["sun", "moon"]);
    assert_eq!(
        sessions::get_session(&db, &session.id).await.unwrap().word_count,
        2
    );
}

#[tokio::test]
async fn update_word_keeps_position_and_scope() {
    let db = create_test_db().await;
    let first = sessions::create_session(&db, None).await.unwrap();
    let second = sessions::create_session(&db, None).await.unwrap();
    let saved = words::save_words(
        &db,
        &first.id,
        vec![NewWord::new("cat", "con mèo"), NewWord::new("dgo", "con chó")],
    )
    .await
    .unwrap();

    let fixed = words::update_word(
        &db,
        &first.id,
        &saved[1].id,
        WordUpdate {
            english: Some(" dog ".to_string()),
            image_url: Some(Some("https://img.example/dog.png".to_string())),
            ..WordUpdate::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(fixed.english, "dog");
    assert_eq!(fixed.order_index, 1);

    let listed = words::list_words(&db, &first.id).await.unwrap();
    assert_eq!(listed[1].english, "dog");
    assert_eq!(listed[1].image_url.as_deref(), Some("https://img.example/dog.png"));

    assert!(matches!(
        words::update_word(&db, &second.id, &saved[0].id, WordUpdate::default()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        words::update_word(
            &db,
            &first.id,
            &saved[0].id,
            WordUpdate {
                vietnamese: Some("   ".to_string()),
                ..WordUpdate::default()
            }
        )
        .await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn sessions_are_listed_newest_first() {
    let db = create_test_db().await;
    let older = sessions::create_session(&db, Some("older")).await.unwrap();
    let newer = sessions::create_session(&db, Some("newer")).await.unwrap();

    let listed = sessions::list_sessions(&db).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
}

#[tokio::test]
async fn random_quiz_serves_what_exists() {
    let db = create_test_db().await;
    let history = db.history();

    assert!(matches!(
        random_quiz::compose_random_quiz(&db, &history).await,
        Err(ServiceError::InsufficientData(_))
    ));

    let session = sessions::create_session(&db, None).await.unwrap();
    words::save_words(
        &db,
        &session.id,
        vec![
            NewWord::new("red", "màu đỏ"),
            NewWord::new("green", "màu xanh lá"),
            NewWord::new("blue", "màu xanh dương"),
        ],
    )
    .await
    .unwrap();

    let quiz = random_quiz::compose_random_quiz(&db, &history).await.unwrap();
    assert_eq!(quiz.len(), 3);
}

#[tokio::test]
async fn random_quiz_draws_across_sessions_and_records_history() {
    let db = create_test_db().await;
    let history = db.history();

    for topic in ["a", "b", "c"] {
        let session = sessions::create_session(&db, Some(topic)).await.unwrap();
        let rows = (0..5)
            .map(|i| NewWord::new(format!("{topic}{i}"), format!("nghĩa {topic}{i}")))
            .collect();
        words::save_words(&db, &session.id, rows).await.unwrap();
    }

    let quiz = random_quiz::compose_random_quiz(&db, &history).await.unwrap();
    assert_eq!(quiz.len(), random_quiz::RANDOM_QUIZ_SIZE);

    let answers: Vec<(String, String)> = quiz
        .iter()
        .map(|w| (w.id.clone(), w.english.to_uppercase()))
        .collect();
    let results = random_quiz::submit_random_quiz(&db, &history, &answers)
        .await
        .unwrap();
    assert_eq!(results.len(), quiz.len());
    assert!(results.iter().all(|r| r.correct));

    let recorded = history.list().await.unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].quiz_type, QuizType::Random);
    assert_eq!(recorded[0].correct_count as usize, quiz.len());
    assert_eq!(recorded[0].word_ids.len(), quiz.len());

    assert!(matches!(
        random_quiz::submit_random_quiz(&db, &history, &[]).await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn sqlite_history_keeps_ten_newest() {
    let db = create_test_db().await;
    let history = db.history();
    let base = Utc::now();

    for i in 0..15i64 {
        let entry = QuizHistoryEntry::new(
            QuizType::GrammarMcq,
            format!("topic {i}"),
            1,
            2,
            base + Duration::seconds(i),
        );
        assert_eq!(history.record(entry).await.unwrap(), RecordOutcome::Recorded);
    }

    let entries = history.list().await.unwrap();
    assert_eq!(entries.len(), HISTORY_CAP);
    let topics: Vec<_> = entries.iter().map(|e| e.topic.clone()).collect();
    let expected: Vec<_> = (5..15).rev().map(|i| format!("topic {i}")).collect();
    assert_eq!(topics, expected);
}

#[tokio::test]
async fn sqlite_history_discards_near_duplicates() {
    let db = create_test_db().await;
    let history = db.history();
    let base = Utc::now();

    let first = QuizHistoryEntry::new(QuizType::GrammarFitb, "Past Simple (Điền từ)", 3, 5, base);
    let echo = QuizHistoryEntry::new(
        QuizType::GrammarFitb,
        "Past Simple (Điền từ)",
        3,
        5,
        base + Duration::milliseconds(200),
    );
    let later = QuizHistoryEntry::new(
        QuizType::GrammarFitb,
        "Past Simple (Điền từ)",
        4,
        5,
        base + Duration::milliseconds(2000),
    );

    assert_eq!(history.record(first).await.unwrap(), RecordOutcome::Recorded);
    assert_eq!(history.record(echo).await.unwrap(), RecordOutcome::Duplicate);
    assert_eq!(history.record(later).await.unwrap(), RecordOutcome::Recorded);
    assert_eq!(history.list().await.unwrap().len(), 2);
}
