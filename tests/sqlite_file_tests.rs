use std::collections::HashMap;

use tempfile::TempDir;

use vocab_backend::db::schema::{split_sql_statements, SCHEMA_SQL};
use vocab_backend::db::Database;
use vocab_backend::models::{NewWord, QuizHistoryEntry, QuizType, SessionStatus};
use vocab_backend::services::history::{HistoryStore, RecordOutcome, HISTORY_CAP};
use vocab_backend::services::{evaluation, sessions, words};

fn database_url(dir: &TempDir) -> String {
    format!("sqlite:{}", dir.path().join("vocab.db").display())
}

#[test]
fn bundled_schema_splits_into_statements() {
    let statements = split_sql_statements(SCHEMA_SQL);
    assert!(statements.len() >= 4);
    assert!(statements
        .iter()
        .any(|s| s.contains(r#"CREATE TABLE IF NOT EXISTS "words""#)));
    assert!(statements.iter().all(|s| !s.trim().is_empty()));
}

#[tokio::test]
async fn results_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);

    let (session_id, before) = {
        let db = Database::connect(&url).await.unwrap();
        let session = sessions::create_session(&db, Some("Kitchen")).await.unwrap();
        let saved = words::save_words(
            &db,
            &session.id,
            vec![NewWord::new("spoon", "cái thìa"), NewWord::new("fork", "cái nĩa")],
        )
        .await
        .unwrap();
        let answers = HashMap::from([(saved[0].id.clone(), "Spoon ".to_string())]);
        let results = evaluation::submit_learning(&db, &session.id, &answers)
            .await
            .unwrap();
        db.history()
            .record(QuizHistoryEntry::new(
                QuizType::GrammarMcq,
                "Present Simple (Trắc nghiệm)",
                2,
                4,
                chrono::Utc::now(),
            ))
            .await
            .unwrap();
        db.close().await;
        (session.id, results)
    };

    let db = Database::connect(&url).await.unwrap();
    let session = sessions::get_session(&db, &session_id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Done);
    assert_eq!(session.topic.as_deref(), Some("Kitchen"));
    assert_eq!(session.word_count, 2);

    let after = evaluation::get_results(&db, &session_id).await.unwrap();
    assert_eq!(after, before);
    assert!(after[0].correct);
    assert!(!after[1].correct);

    let history = db.history().list().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].correct_count, 2);
    db.close().await;
}

#[tokio::test]
async fn deleting_a_session_cascades_to_words() {
    let dir = TempDir::new().unwrap();
    let db = Database::connect(&database_url(&dir)).await.unwrap();

    let session = sessions::create_session(&db, None).await.unwrap();
    words::save_words(&db, &session.id, vec![NewWord::new("cup", "cái cốc")])
        .await
        .unwrap();
    sessions::delete_session(&db, &session.id).await.unwrap();

    let remaining: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_double_submits_record_once() {
    let dir = TempDir::new().unwrap();
    let db = Database::connect(&database_url(&dir)).await.unwrap();
    let base = chrono::Utc::now();

    for round in 0..30i64 {
        let at = base + chrono::Duration::seconds(round * 5);
        let topic = format!("Past Perfect {round} (Trắc nghiệm)");
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let history = db.history();
                let entry = QuizHistoryEntry::new(QuizType::GrammarMcq, topic.clone(), 7, 10, at);
                tokio::spawn(async move { history.record(entry).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }
        outcomes.sort_by_key(|o| *o == RecordOutcome::Duplicate);
        assert_eq!(outcomes, vec![RecordOutcome::Recorded, RecordOutcome::Duplicate]);
    }

    let stored = db.history().list().await.unwrap();
    assert_eq!(stored.len(), HISTORY_CAP);
    db.close().await;
}
