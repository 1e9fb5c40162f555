//! Conversation lifecycle integration tests

use lexbridge_common::Pagination;
use lexbridge_conversations::{ConversationStatus, ConversationStore};
use uuid::Uuid;

use crate::common::TestEngine;

#[tokio::test]
async fn start_conversation_defaults() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();

    let conv = engine
        .service
        .start_conversation(owner, "What notice period applies?", Some("Lease question"))
        .await
        .unwrap();

    assert_eq!(conv.status(), ConversationStatus::Active);
    assert_eq!(conv.title(), Some("Lease question"));
    assert_eq!(conv.message_count(), 1);
    assert_eq!(conv.total_tokens(), 0);
}

#[tokio::test]
async fn start_conversation_validates_first_message() {
    let engine = TestEngine::new();
    let err = engine
        .service
        .start_conversation(Uuid::new_v4(), "   ", None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(engine.store.is_empty());
}

#[tokio::test]
async fn list_conversations_filters_and_paginates() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();

    for i in 0..3 {
        engine
            .service
            .start_conversation(owner, &format!("question {}", i), None)
            .await
            .unwrap();
    }
    let archived = engine
        .service
        .start_conversation(owner, "to archive", None)
        .await
        .unwrap();
    engine.service.archive(archived.id(), owner).await.unwrap();

    let (all, total) = engine
        .service
        .list_conversations(owner, None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(all.len(), 4);

    let (archived_only, total) = engine
        .service
        .list_conversations(owner, Some(ConversationStatus::Archived), Pagination::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(archived_only[0].id(), archived.id());

    let page = Pagination {
        offset: Some(0),
        limit: Some(2),
    };
    let (first_page, total) = engine
        .service
        .list_conversations(owner, None, page)
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(first_page.len(), 2);
}

#[tokio::test]
async fn deleted_conversations_hidden_from_default_listing() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();

    let conv = engine
        .service
        .start_conversation(owner, "ephemeral", None)
        .await
        .unwrap();
    engine.service.delete(conv.id(), owner).await.unwrap();

    let (items, total) = engine
        .service
        .list_conversations(owner, None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(items.is_empty());

    let (deleted, _) = engine
        .service
        .list_conversations(owner, Some(ConversationStatus::Deleted), Pagination::default())
        .await
        .unwrap();
    assert_eq!(deleted[0].id(), conv.id());
}

#[tokio::test]
async fn delete_is_soft_and_terminal() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();

    let conv = engine
        .service
        .start_conversation(owner, "Hi", None)
        .await
        .unwrap();
    engine.service.delete(conv.id(), owner).await.unwrap();

    // The row survives deletion; the aggregate just refuses further work
    let stored = engine.store.load(conv.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), ConversationStatus::Deleted);

    let err = engine.service.delete(conv.id(), owner).await.unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");

    let err = engine
        .service
        .update_title(conv.id(), owner, "too late")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");
}

#[tokio::test]
async fn update_title_persists() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();

    let conv = engine
        .service
        .start_conversation(owner, "Hi", None)
        .await
        .unwrap();
    engine
        .service
        .update_title(conv.id(), owner, "Deposit dispute")
        .await
        .unwrap();

    let stored = engine.store.load(conv.id()).await.unwrap().unwrap();
    assert_eq!(stored.title(), Some("Deposit dispute"));
}

#[tokio::test]
async fn lifecycle_operations_are_owner_scoped() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let conv = engine
        .service
        .start_conversation(owner, "Hi", None)
        .await
        .unwrap();

    for err in [
        engine.service.archive(conv.id(), stranger).await.unwrap_err(),
        engine.service.delete(conv.id(), stranger).await.unwrap_err(),
        engine
            .service
            .update_title(conv.id(), stranger, "mine now")
            .await
            .unwrap_err(),
        engine.service.get(conv.id(), stranger).await.unwrap_err(),
    ] {
        assert_eq!(err.error_code(), "ACCESS_DENIED");
    }
}

#[tokio::test]
async fn token_usage_spans_owner_conversations() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();

    for text in ["first", "second"] {
        let seeded = engine.seed_answered(owner, text).await;
        engine
            .service
            .send_message(seeded.id(), owner, "follow-up", false)
            .await
            .unwrap();
    }

    let usage = engine.service.token_usage(owner).await.unwrap();
    let (items, _) = engine
        .service
        .list_conversations(owner, None, Pagination::default())
        .await
        .unwrap();
    let expected: i64 = items.iter().map(|c| c.total_tokens()).sum();
    assert_eq!(usage, expected);
    assert!(usage > 0);
}
