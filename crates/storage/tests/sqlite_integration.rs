use quiz_core::model::{
    ProgressRecord, ProgressStatus, Question, QuestionCorrection, QuestionId, QuestionKind,
};
use storage::repository::{
    MistakeRepository, ProgressRepository, QuestionRepository, StorageError,
};
use storage::sqlite::{LATEST_VERSION, SqliteRepository};

fn build_question(id: u64, answer: &str) -> Question {
    Question {
        id: QuestionId::new(id),
        kind: QuestionKind::SingleChoice,
        content: format!("Question {id}"),
        options: vec!["A. 正确".into(), "B. 错误".into()],
        answer: answer.into(),
        explanation: format!("Explanation {id}"),
        ai_explanation: String::new(),
    }
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    SqliteRepository::open(&url).await.expect("open")
}

#[tokio::test]
async fn sqlite_bank_roundtrip_creates_progress() {
    let repo = connect("memdb_bank_roundtrip").await;

    let inserted = repo
        .insert_bank(&[build_question(2, "A"), build_question(1, "B")])
        .await
        .unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(repo.count_questions().await.unwrap(), 2);

    let q = repo.get_question(QuestionId::new(1)).await.unwrap().unwrap();
    assert_eq!(q, build_question(1, "B"));

    let progress = repo.list_progress().await.unwrap();
    let ids: Vec<u64> = progress.iter().map(|p| p.question_id.value()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(progress.iter().all(|p| p.status == ProgressStatus::Unanswered && !p.is_marked));

    assert!(repo.get_question(QuestionId::new(3)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_duplicate_bank_insert_conflicts_and_rolls_back() {
    let repo = connect("memdb_bank_conflict").await;
    repo.insert_bank(&[build_question(1, "A")]).await.unwrap();

    let err = repo
        .insert_bank(&[build_question(2, "A"), build_question(1, "A")])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    assert_eq!(repo.count_questions().await.unwrap(), 1);
}

#[tokio::test]
async fn sqlite_partial_update_keeps_ai_explanation() {
    let repo = connect("memdb_partial_update").await;
    repo.insert_bank(&[build_question(1, "A")]).await.unwrap();
    repo.set_ai_explanation(QuestionId::new(1), "cached text")
        .await
        .unwrap();

    let correction = QuestionCorrection {
        kind: Some(QuestionKind::TrueFalse),
        options: None,
        answer: Some("B".into()),
    };
    repo.update_question_fields(QuestionId::new(1), &correction)
        .await
        .unwrap();

    let q = repo.get_question(QuestionId::new(1)).await.unwrap().unwrap();
    assert_eq!(q.kind, QuestionKind::TrueFalse);
    assert_eq!(q.answer, "B");
    assert_eq!(q.options, build_question(1, "A").options);
    assert_eq!(q.ai_explanation, "cached text");

    let missing = repo
        .update_question_fields(QuestionId::new(9), &correction)
        .await
        .unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_progress_counts_and_filters() {
    let repo = connect("memdb_progress_counts").await;
    repo.insert_bank(&[
        build_question(1, "A"),
        build_question(2, "A"),
        build_question(3, "A"),
    ])
    .await
    .unwrap();

    repo.save_progress(&ProgressRecord {
        question_id: QuestionId::new(1),
        status: ProgressStatus::Correct,
        user_answer: "A".into(),
        is_marked: true,
    })
    .await
    .unwrap();
    repo.save_progress(&ProgressRecord {
        question_id: QuestionId::new(3),
        status: ProgressStatus::Wrong,
        user_answer: "B".into(),
        is_marked: false,
    })
    .await
    .unwrap();

    assert_eq!(repo.count_answered().await.unwrap(), 2);
    assert_eq!(repo.count_with_status(ProgressStatus::Correct).await.unwrap(), 1);
    assert_eq!(repo.count_with_status(ProgressStatus::Wrong).await.unwrap(), 1);

    assert!(repo.list_mistake_progress().await.unwrap().is_empty());
    repo.record_miss(QuestionId::new(3)).await.unwrap();
    repo.record_miss(QuestionId::new(1)).await.unwrap();
    let subset = repo.list_mistake_progress().await.unwrap();
    let ids: Vec<u64> = subset.iter().map(|p| p.question_id.value()).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(subset[0].is_marked);
    assert_eq!(subset[1].user_answer, "B");
}

#[tokio::test]
async fn sqlite_mistake_book_upserts_and_sweeps() {
    let repo = connect("memdb_mistake_book").await;
    repo.insert_bank(&[build_question(1, "A"), build_question(2, "A")])
        .await
        .unwrap();

    assert_eq!(repo.record_miss(QuestionId::new(1)).await.unwrap(), 1);
    assert_eq!(repo.record_miss(QuestionId::new(1)).await.unwrap(), 2);
    assert_eq!(repo.record_miss(QuestionId::new(2)).await.unwrap(), 1);
    assert_eq!(repo.count_mistakes().await.unwrap(), 2);

    repo.save_progress(&ProgressRecord {
        question_id: QuestionId::new(1),
        status: ProgressStatus::Correct,
        user_answer: "A".into(),
        is_marked: false,
    })
    .await
    .unwrap();

    assert_eq!(repo.count_correct_mistakes().await.unwrap(), 1);
    assert_eq!(repo.delete_correct_mistakes().await.unwrap(), 1);
    assert!(repo.get_mistake(QuestionId::new(1)).await.unwrap().is_none());
    assert_eq!(
        repo.get_mistake(QuestionId::new(2)).await.unwrap().unwrap().count,
        1
    );

    assert!(repo.remove_mistake(QuestionId::new(2)).await.unwrap());
    assert!(!repo.remove_mistake(QuestionId::new(2)).await.unwrap());
    assert!(repo.list_mistakes().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    assert_eq!(repo.schema_version().await.unwrap(), LATEST_VERSION);
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.schema_version().await.unwrap(), LATEST_VERSION);
    assert_eq!(repo.count_questions().await.unwrap(), 0);
}
