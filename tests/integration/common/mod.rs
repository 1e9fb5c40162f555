//! Shared test harness for engine integration tests

use std::sync::Arc;

use lexbridge_conversations::{
    Conversation, ConversationService, ConversationStore, InMemoryConversationStore,
};
use lexbridge_llm::mock::FailingGenerationService;
use lexbridge_llm::MockGenerationService;
use lexbridge_retrieval::{
    DocumentMetadata, InMemoryIndex, LexicalScorer, RetrievalIndex, TextChunker,
};
use uuid::Uuid;

/// Engine wired against in-memory collaborators
pub struct TestEngine {
    pub store: Arc<InMemoryConversationStore>,
    pub index: Arc<InMemoryIndex>,
    pub service: ConversationService,
}

impl TestEngine {
    /// Engine with the deterministic mock provider
    pub fn new() -> Self {
        let store = Arc::new(InMemoryConversationStore::new());
        let index = Arc::new(InMemoryIndex::new(
            TextChunker::default(),
            Arc::new(LexicalScorer::new()),
        ));
        let service = ConversationService::new(
            store.clone(),
            Arc::new(MockGenerationService::new()),
            index.clone(),
        );
        Self {
            store,
            index,
            service,
        }
    }

    /// Engine whose generation provider always fails
    pub fn with_failing_generation() -> Self {
        let store = Arc::new(InMemoryConversationStore::new());
        let index = Arc::new(InMemoryIndex::new(
            TextChunker::default(),
            Arc::new(LexicalScorer::new()),
        ));
        let service = ConversationService::new(
            store.clone(),
            Arc::new(FailingGenerationService),
            index.clone(),
        );
        Self {
            store,
            index,
            service,
        }
    }

    /// Seed a conversation whose first user turn was already answered, so the
    /// next `send_message` is a valid user turn.
    pub async fn seed_answered(&self, owner_id: Uuid, first: &str) -> Conversation {
        let (mut conversation, _) = Conversation::start(owner_id, first, None).unwrap();
        conversation
            .add_assistant_message("Understood.", Some(3), vec![])
            .unwrap();
        self.store.save(&conversation).await.unwrap();
        conversation
    }

    /// Index a document into the owner's corpus
    pub async fn index_document(&self, owner_id: Uuid, title: &str, text: &str) -> Uuid {
        let document_id = Uuid::new_v4();
        self.index
            .index(
                document_id,
                text,
                DocumentMetadata {
                    owner_id,
                    title: title.to_string(),
                    source: None,
                },
            )
            .await
            .unwrap();
        document_id
    }
}
