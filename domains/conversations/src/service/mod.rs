//! Completion orchestrator
//!
//! One `send_message` call is one user turn: validate, retrieve, assemble,
//! generate, append, persist. Retrieval failures degrade the turn to
//! no-context generation; generation failures abort it before anything is
//! persisted, so the store only ever sees whole turns.

use std::sync::Arc;

use lexbridge_common::{Error, Pagination, Result};
use lexbridge_llm::{ChatMessage, ChatRole, GenerationRequest, GenerationService};
use lexbridge_retrieval::{ContextAssembler, RetrievalIndex, SearchParams};
use uuid::Uuid;

use crate::domain::entities::{Conversation, MessageRole};
use crate::domain::events::ConversationEvent;
use crate::domain::state::ConversationStatus;
use crate::repository::ConversationStore;

/// Orchestrates conversation operations against the store, generation and
/// retrieval collaborators.
///
/// Holds no locks; callers must serialize concurrent turns against the same
/// conversation id.
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
    generation: Arc<dyn GenerationService>,
    retrieval: Arc<dyn RetrievalIndex>,
    assembler: ContextAssembler,
    search_params: SearchParams,
    system_prompt: Option<String>,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        generation: Arc<dyn GenerationService>,
        retrieval: Arc<dyn RetrievalIndex>,
    ) -> Self {
        Self {
            store,
            generation,
            retrieval,
            assembler: ContextAssembler::default(),
            search_params: SearchParams::default(),
            system_prompt: None,
        }
    }

    /// Override the context budget
    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Override retrieval tuning
    pub fn with_search_params(mut self, params: SearchParams) -> Self {
        self.search_params = params;
        self
    }

    /// Base system prompt sent with every generation request
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Start a conversation with its first user message
    pub async fn start_conversation(
        &self,
        owner_id: Uuid,
        first_message: &str,
        title: Option<&str>,
    ) -> Result<Conversation> {
        let (conversation, events) = Conversation::start(owner_id, first_message, title)?;
        self.store.save(&conversation).await?;
        self.publish(&events);

        tracing::info!(
            conversation_id = %conversation.id(),
            owner_id = %owner_id,
            "conversation started"
        );
        Ok(conversation)
    }

    /// Run one user turn: append the user message, optionally retrieve
    /// context, generate the assistant reply, persist both messages in one
    /// save.
    ///
    /// On generation failure nothing is persisted — the user message is
    /// discarded and the caller must resubmit.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
        content: &str,
        use_rag: bool,
    ) -> Result<Conversation> {
        let mut conversation = self.load_owned(conversation_id, owner_id).await?;
        let mut events: Vec<ConversationEvent> = Vec::new();

        events.push(conversation.add_user_message(content)?);

        let (context, referenced_document_ids) = if use_rag {
            self.retrieve_context(owner_id, content).await
        } else {
            (None, Vec::new())
        };

        let history: Vec<ChatMessage> = conversation
            .messages()
            .iter()
            .map(|m| ChatMessage {
                role: match m.role {
                    MessageRole::User => ChatRole::User,
                    MessageRole::Assistant => ChatRole::Assistant,
                    MessageRole::System => ChatRole::System,
                },
                content: m.content.clone(),
            })
            .collect();

        let request = GenerationRequest {
            model: String::new(),
            system_prompt: self.system_prompt.clone(),
            context,
            messages: history,
            max_tokens: None,
        };

        let response = match self.generation.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    conversation_id = %conversation_id,
                    "generation failed, aborting turn"
                );
                return Err(Error::Generation(e.to_string()));
            }
        };

        events.push(conversation.add_assistant_message(
            &response.content,
            Some(response.output_tokens),
            referenced_document_ids,
        )?);

        self.store.save(&conversation).await?;
        self.publish(&events);

        tracing::info!(
            conversation_id = %conversation_id,
            output_tokens = response.output_tokens,
            used_rag = use_rag,
            "turn completed"
        );
        Ok(conversation)
    }

    /// Fetch a conversation the caller owns
    pub async fn get(&self, conversation_id: Uuid, owner_id: Uuid) -> Result<Conversation> {
        self.load_owned(conversation_id, owner_id).await
    }

    /// List the owner's conversations with an optional status filter
    pub async fn list_conversations(
        &self,
        owner_id: Uuid,
        status: Option<ConversationStatus>,
        page: Pagination,
    ) -> Result<(Vec<Conversation>, i64)> {
        self.store.list_by_owner(owner_id, status, page).await
    }

    /// Archive a conversation
    pub async fn archive(&self, conversation_id: Uuid, owner_id: Uuid) -> Result<Conversation> {
        self.mutate(conversation_id, owner_id, |c| c.archive()).await
    }

    /// Soft-delete a conversation
    pub async fn delete(&self, conversation_id: Uuid, owner_id: Uuid) -> Result<Conversation> {
        self.mutate(conversation_id, owner_id, |c| c.delete()).await
    }

    /// Rename a conversation
    pub async fn update_title(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
        title: &str,
    ) -> Result<Conversation> {
        self.mutate(conversation_id, owner_id, |c| c.update_title(title))
            .await
    }

    /// Total tokens spent across the owner's conversations
    pub async fn token_usage(&self, owner_id: Uuid) -> Result<i64> {
        self.store.sum_tokens_by_owner(owner_id).await
    }

    async fn load_owned(&self, conversation_id: Uuid, owner_id: Uuid) -> Result<Conversation> {
        let conversation = self
            .store
            .load(conversation_id)
            .await?
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        if conversation.owner_id() != owner_id {
            return Err(Error::AccessDenied(
                "Conversation belongs to another owner".to_string(),
            ));
        }

        Ok(conversation)
    }

    async fn mutate<F>(&self, conversation_id: Uuid, owner_id: Uuid, op: F) -> Result<Conversation>
    where
        F: FnOnce(
            &mut Conversation,
        ) -> std::result::Result<
            ConversationEvent,
            crate::domain::entities::ConversationError,
        >,
    {
        let mut conversation = self.load_owned(conversation_id, owner_id).await?;
        let event = op(&mut conversation)?;
        self.store.save(&conversation).await?;
        self.publish(&[event]);
        Ok(conversation)
    }

    /// Retrieval step: failures degrade the turn to no-context generation
    async fn retrieve_context(&self, owner_id: Uuid, query: &str) -> (Option<String>, Vec<Uuid>) {
        match self
            .retrieval
            .search(owner_id, query, self.search_params)
            .await
        {
            Ok(chunks) => {
                let assembled = self.assembler.assemble(&chunks);
                if assembled.is_empty() {
                    (None, Vec::new())
                } else {
                    (Some(assembled.text), assembled.document_ids)
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    owner_id = %owner_id,
                    "retrieval failed, continuing without context"
                );
                (None, Vec::new())
            }
        }
    }

    /// Drain the turn's outbox after a successful save
    fn publish(&self, events: &[ConversationEvent]) {
        for event in events {
            tracing::info!(
                event = event.name(),
                conversation_id = %event.conversation_id(),
                "domain event"
            );
        }
    }
}
