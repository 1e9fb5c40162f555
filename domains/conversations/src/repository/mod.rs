//! Persistence for the Conversations domain
//!
//! The aggregate is saved and loaded whole; messages have no repository of
//! their own.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use lexbridge_common::{Pagination, Result};
use uuid::Uuid;

use crate::domain::entities::Conversation;
use crate::domain::state::ConversationStatus;

pub use memory::InMemoryConversationStore;
pub use postgres::PgConversationStore;

/// Storage contract for conversation aggregates.
///
/// `list_by_owner` with no status filter excludes soft-deleted conversations;
/// pass `Some(ConversationStatus::Deleted)` to see them. `sum_tokens_by_owner`
/// counts every conversation regardless of status — tokens were spent either
/// way.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load a conversation with its messages; None if absent
    async fn load(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Persist the aggregate: the conversation row and any new messages,
    /// atomically
    async fn save(&self, conversation: &Conversation) -> Result<()>;

    /// List an owner's conversations, newest activity first
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<ConversationStatus>,
        page: Pagination,
    ) -> Result<(Vec<Conversation>, i64)>;

    /// Sum of `total_tokens` across the owner's conversations
    async fn sum_tokens_by_owner(&self, owner_id: Uuid) -> Result<i64>;
}
