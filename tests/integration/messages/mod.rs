//! Turn-cycle integration tests: send_message orchestration

use lexbridge_conversations::{ConversationStore, MessageRole};
use uuid::Uuid;

use crate::common::TestEngine;

#[test_log::test(tokio::test)]
async fn full_turn_cycle_persists_user_and_assistant_messages() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;

    let conv = engine
        .service
        .send_message(seeded.id(), owner, "What notice period applies?", false)
        .await
        .unwrap();

    assert_eq!(conv.message_count(), 4);
    assert_eq!(conv.messages()[2].role, MessageRole::User);
    assert_eq!(conv.messages()[2].content, "What notice period applies?");
    assert_eq!(conv.messages()[3].role, MessageRole::Assistant);

    // The single save covered both new messages
    let stored = engine.store.load(conv.id()).await.unwrap().unwrap();
    assert_eq!(stored.message_count(), 4);
    assert_eq!(stored.total_tokens(), conv.total_tokens());
}

#[test_log::test(tokio::test)]
async fn rag_turn_grounds_reply_and_records_references() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;
    let doc = engine
        .index_document(
            owner,
            "Residential lease",
            "The security deposit must be returned within thirty days of termination.",
        )
        .await;

    let conv = engine
        .service
        .send_message(seeded.id(), owner, "security deposit returned", true)
        .await
        .unwrap();

    let reply = &conv.messages()[3];
    assert!(reply.content.starts_with("Mock grounded response"));
    assert_eq!(reply.referenced_document_ids, vec![doc]);
}

#[test_log::test(tokio::test)]
async fn rag_turn_with_empty_corpus_degrades_to_plain_generation() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;

    let conv = engine
        .service
        .send_message(seeded.id(), owner, "anything at all", true)
        .await
        .unwrap();

    let reply = &conv.messages()[3];
    assert!(reply.content.starts_with("Mock response"));
    assert!(reply.referenced_document_ids.is_empty());
}

#[test_log::test(tokio::test)]
async fn other_owners_documents_never_leak_into_context() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;
    engine
        .index_document(
            stranger,
            "Stranger's lease",
            "The security deposit must be returned promptly.",
        )
        .await;

    let conv = engine
        .service
        .send_message(seeded.id(), owner, "security deposit returned", true)
        .await
        .unwrap();

    let reply = &conv.messages()[3];
    assert!(reply.content.starts_with("Mock response"));
    assert!(reply.referenced_document_ids.is_empty());
}

#[test_log::test(tokio::test)]
async fn generation_failure_persists_nothing() {
    let engine = TestEngine::with_failing_generation();
    let owner = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;

    let err = engine
        .service
        .send_message(seeded.id(), owner, "Will this be lost?", false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "GENERATION_ERROR");

    // Full-discard policy: the user message is gone with the turn and the
    // caller must resubmit
    let stored = engine.store.load(seeded.id()).await.unwrap().unwrap();
    assert_eq!(stored.message_count(), 2);
    assert_eq!(stored.total_tokens(), seeded.total_tokens());
}

#[test_log::test(tokio::test)]
async fn consecutive_user_turns_are_rejected_without_mutation() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();

    let conv = engine
        .service
        .start_conversation(owner, "Hi", None)
        .await
        .unwrap();

    // The first message still awaits its reply
    let err = engine
        .service
        .send_message(conv.id(), owner, "again", false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");

    let stored = engine.store.load(conv.id()).await.unwrap().unwrap();
    assert_eq!(stored.message_count(), 1);
}

#[test_log::test(tokio::test)]
async fn archived_conversation_rejects_messages() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;

    engine.service.archive(seeded.id(), owner).await.unwrap();

    let err = engine
        .service
        .send_message(seeded.id(), owner, "hello?", false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");
}

#[test_log::test(tokio::test)]
async fn missing_conversation_is_not_found() {
    let engine = TestEngine::new();
    let err = engine
        .service
        .send_message(Uuid::new_v4(), Uuid::new_v4(), "Hi", false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[test_log::test(tokio::test)]
async fn foreign_conversation_is_access_denied() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;

    let err = engine
        .service
        .send_message(seeded.id(), Uuid::new_v4(), "Hi", false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ACCESS_DENIED");
}

#[test_log::test(tokio::test)]
async fn oversized_content_is_rejected() {
    let engine = TestEngine::new();
    let owner = Uuid::new_v4();
    let seeded = engine.seed_answered(owner, "Hi").await;

    let content = "x".repeat(32_001);
    let err = engine
        .service
        .send_message(seeded.id(), owner, &content, false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}
