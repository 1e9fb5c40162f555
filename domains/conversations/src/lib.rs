//! Conversations domain: client chat threads with retrieval-augmented completion

pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Conversation, ConversationError, Message, MessageRole};
pub use domain::events::ConversationEvent;
pub use domain::state::{ConversationStateMachine, ConversationStatus, StateError, StatusEvent};

// Re-export repository types
pub use repository::{ConversationStore, InMemoryConversationStore, PgConversationStore};

// Re-export the orchestrator
pub use service::ConversationService;
