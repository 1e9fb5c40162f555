//! In-memory conversation store
//!
//! Same contract as the Postgres store; used by tests and local composition.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use lexbridge_common::{Error, Pagination, Result};
use uuid::Uuid;

use crate::domain::entities::Conversation;
use crate::domain::state::ConversationStatus;
use crate::repository::ConversationStore;

#[derive(Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<HashMap<Uuid, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, id: Uuid) -> Result<Option<Conversation>> {
        let map = self
            .inner
            .read()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))?;
        Ok(map.get(&id).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))?;
        map.insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<ConversationStatus>,
        page: Pagination,
    ) -> Result<(Vec<Conversation>, i64)> {
        let map = self
            .inner
            .read()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))?;

        let mut items: Vec<Conversation> = map
            .values()
            .filter(|c| c.owner_id() == owner_id)
            .filter(|c| match status {
                Some(s) => c.status() == s,
                None => c.status() != ConversationStatus::Deleted,
            })
            .cloned()
            .collect();

        // Newest activity first, matching the SQL ordering
        items.sort_by(|a, b| {
            b.last_message_at()
                .cmp(&a.last_message_at())
                .then_with(|| b.created_at().cmp(&a.created_at()))
        });

        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok((items, total))
    }

    async fn sum_tokens_by_owner(&self, owner_id: Uuid) -> Result<i64> {
        let map = self
            .inner
            .read()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))?;
        Ok(map
            .values()
            .filter(|c| c.owner_id() == owner_id)
            .map(|c| c.total_tokens())
            .sum())
    }
}
