//! Domain entities for the Conversations domain
//!
//! The `Conversation` aggregate owns its messages and enforces every turn
//! invariant itself: strict role alternation, the message cap, content bounds,
//! the status lifecycle and the running token total. State never changes on a
//! failed call, and loading persisted rows goes through `rehydrate`, which
//! re-checks the same invariants instead of trusting storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::ConversationEvent;
use crate::domain::state::{ConversationStateMachine, ConversationStatus, StateError, StatusEvent};

/// Maximum number of messages a conversation may hold
pub const MAX_MESSAGES: usize = 100;

/// Maximum message content length in characters
pub const MAX_CONTENT_LENGTH: usize = 32_000;

/// Maximum title length in characters (varchar(200))
pub const MAX_TITLE_LENGTH: usize = 200;

/// Typed failures returned by aggregate mutations
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConversationError {
    #[error("conversation is not active")]
    NotActive,

    #[error("conversation has been deleted")]
    AlreadyDeleted,

    #[error("conversation already holds the maximum of {MAX_MESSAGES} messages")]
    MessageLimitExceeded,

    #[error("message role violates turn order")]
    TurnOrderViolation,

    #[error("message content cannot be empty or whitespace-only")]
    EmptyContent,

    #[error("message content exceeds {MAX_CONTENT_LENGTH} characters ({length})")]
    ContentTooLong { length: usize },

    #[error("title cannot be empty or whitespace-only")]
    EmptyTitle,

    #[error("title exceeds {MAX_TITLE_LENGTH} characters ({length})")]
    TitleTooLong { length: usize },

    #[error("token count cannot be negative")]
    InvalidTokenCount,

    #[error("stored token total {stored} does not match message sum {computed}")]
    TokenTotalMismatch { stored: i64, computed: i64 },

    #[error(transparent)]
    InvalidTransition(#[from] StateError),
}

impl From<ConversationError> for lexbridge_common::Error {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NotActive
            | ConversationError::AlreadyDeleted
            | ConversationError::MessageLimitExceeded
            | ConversationError::TurnOrderViolation
            | ConversationError::InvalidTransition(_) => {
                lexbridge_common::Error::Conflict(err.to_string())
            }
            _ => lexbridge_common::Error::Validation(err.to_string()),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Message entity, owned by a Conversation.
///
/// Immutable after creation; created only as a side effect of aggregate
/// mutations or rehydration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Generation cost of this message; assistant messages only in practice
    pub token_count: Option<i64>,
    /// Documents whose chunks grounded this message
    pub referenced_document_ids: Vec<Uuid>,
    /// Opaque key/value payload carried for downstream consumers
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new_user(
        conversation_id: Uuid,
        content: &str,
    ) -> Result<Self, ConversationError> {
        let content = Self::validate_content(content)?;

        Ok(Message {
            id: Uuid::new_v4(),
            conversation_id,
            role: MessageRole::User,
            content,
            token_count: None,
            referenced_document_ids: Vec::new(),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        })
    }

    pub(crate) fn new_assistant(
        conversation_id: Uuid,
        content: &str,
        token_count: Option<i64>,
        referenced_document_ids: Vec<Uuid>,
    ) -> Result<Self, ConversationError> {
        let content = Self::validate_content(content)?;
        if token_count.is_some_and(|t| t < 0) {
            return Err(ConversationError::InvalidTokenCount);
        }

        // Set-like: drop duplicate document references, preserving order
        let mut referenced: Vec<Uuid> = Vec::with_capacity(referenced_document_ids.len());
        for id in referenced_document_ids {
            if !referenced.contains(&id) {
                referenced.push(id);
            }
        }

        Ok(Message {
            id: Uuid::new_v4(),
            conversation_id,
            role: MessageRole::Assistant,
            content,
            token_count,
            referenced_document_ids: referenced,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        })
    }

    /// Validate and normalize content: trimmed, 1–32,000 chars
    fn validate_content(content: &str) -> Result<String, ConversationError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ConversationError::EmptyContent);
        }
        let length = trimmed.chars().count();
        if length > MAX_CONTENT_LENGTH {
            return Err(ConversationError::ContentTooLong { length });
        }
        Ok(trimmed.to_string())
    }
}

/// Conversation aggregate root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    id: Uuid,
    owner_id: Uuid,
    title: Option<String>,
    status: ConversationStatus,
    messages: Vec<Message>,
    total_tokens: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Start a new conversation with its first user message.
    ///
    /// Returns the aggregate plus the events raised (Started and
    /// UserMessageAdded), for the caller to publish after persisting.
    pub fn start(
        owner_id: Uuid,
        first_message: &str,
        title: Option<&str>,
    ) -> Result<(Self, Vec<ConversationEvent>), ConversationError> {
        let title = title.map(Self::validate_title).transpose()?;

        let now = Utc::now();
        let mut conversation = Conversation {
            id: Uuid::new_v4(),
            owner_id,
            title,
            status: ConversationStatus::default(),
            messages: Vec::new(),
            total_tokens: 0,
            created_at: now,
            updated_at: now,
            last_message_at: None,
        };

        let started = ConversationEvent::Started {
            conversation_id: conversation.id,
            owner_id,
        };
        let message_added = conversation.add_user_message(first_message)?;

        Ok((conversation, vec![started, message_added]))
    }

    /// Rebuild an aggregate from persisted state, re-enforcing every invariant
    /// so corrupted rows cannot re-enter the domain.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: Uuid,
        owner_id: Uuid,
        title: Option<String>,
        status: ConversationStatus,
        messages: Vec<Message>,
        total_tokens: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        last_message_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ConversationError> {
        if let Some(ref t) = title {
            Self::validate_title(t)?;
        }

        if messages.len() > MAX_MESSAGES {
            return Err(ConversationError::MessageLimitExceeded);
        }
        Self::validate_sequence(&messages)?;
        for message in &messages {
            Message::validate_content(&message.content)?;
            if message.token_count.is_some_and(|t| t < 0) {
                return Err(ConversationError::InvalidTokenCount);
            }
        }

        let computed = messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .map(|m| m.token_count.unwrap_or(0))
            .sum::<i64>();
        if computed != total_tokens {
            return Err(ConversationError::TokenTotalMismatch {
                stored: total_tokens,
                computed,
            });
        }

        Ok(Conversation {
            id,
            owner_id,
            title,
            status,
            messages,
            total_tokens,
            created_at,
            updated_at,
            last_message_at,
        })
    }

    /// Append a user message. Requires Active status, free capacity, and the
    /// previous message (if any) to be from the assistant.
    pub fn add_user_message(
        &mut self,
        content: &str,
    ) -> Result<ConversationEvent, ConversationError> {
        self.ensure_active()?;
        self.ensure_capacity()?;
        match self.messages.last().map(|m| m.role) {
            None | Some(MessageRole::Assistant) | Some(MessageRole::System) => {}
            Some(_) => return Err(ConversationError::TurnOrderViolation),
        }

        let message = Message::new_user(self.id, content)?;
        let event = ConversationEvent::UserMessageAdded {
            conversation_id: self.id,
            message_id: message.id,
        };
        self.push(message);
        Ok(event)
    }

    /// Append an assistant message and fold its token count into the running
    /// total. Requires Active status, free capacity, and a user message as the
    /// previous message.
    pub fn add_assistant_message(
        &mut self,
        content: &str,
        token_count: Option<i64>,
        referenced_document_ids: Vec<Uuid>,
    ) -> Result<ConversationEvent, ConversationError> {
        self.ensure_active()?;
        self.ensure_capacity()?;
        match self.messages.last().map(|m| m.role) {
            Some(MessageRole::User) => {}
            _ => return Err(ConversationError::TurnOrderViolation),
        }

        let message =
            Message::new_assistant(self.id, content, token_count, referenced_document_ids)?;
        let event = ConversationEvent::AssistantMessageAdded {
            conversation_id: self.id,
            message_id: message.id,
            token_count: message.token_count.unwrap_or(0),
        };
        self.total_tokens += message.token_count.unwrap_or(0);
        self.push(message);
        Ok(event)
    }

    /// Set a new title. Allowed in any non-deleted status.
    pub fn update_title(&mut self, title: &str) -> Result<ConversationEvent, ConversationError> {
        if self.status == ConversationStatus::Deleted {
            return Err(ConversationError::AlreadyDeleted);
        }
        let title = Self::validate_title(title)?;
        self.title = Some(title);
        self.updated_at = Utc::now();
        Ok(ConversationEvent::TitleUpdated {
            conversation_id: self.id,
        })
    }

    /// Archive the conversation. Requires Active status.
    pub fn archive(&mut self) -> Result<ConversationEvent, ConversationError> {
        self.status = ConversationStateMachine::transition(self.status, StatusEvent::Archive)?;
        self.updated_at = Utc::now();
        Ok(ConversationEvent::Archived {
            conversation_id: self.id,
        })
    }

    /// Soft-delete the conversation. Requires Active or Archived status.
    pub fn delete(&mut self) -> Result<ConversationEvent, ConversationError> {
        self.status = ConversationStateMachine::transition(self.status, StatusEvent::Delete)?;
        self.updated_at = Utc::now();
        Ok(ConversationEvent::Deleted {
            conversation_id: self.id,
        })
    }

    fn ensure_active(&self) -> Result<(), ConversationError> {
        if self.status != ConversationStatus::Active {
            return Err(ConversationError::NotActive);
        }
        Ok(())
    }

    fn ensure_capacity(&self) -> Result<(), ConversationError> {
        if self.messages.len() >= MAX_MESSAGES {
            return Err(ConversationError::MessageLimitExceeded);
        }
        Ok(())
    }

    fn push(&mut self, message: Message) {
        let now = Utc::now();
        self.last_message_at = Some(now);
        self.updated_at = now;
        self.messages.push(message);
    }

    /// Validate and normalize a title: trimmed, 1–200 chars
    fn validate_title(title: &str) -> Result<String, ConversationError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ConversationError::EmptyTitle);
        }
        let length = trimmed.chars().count();
        if length > MAX_TITLE_LENGTH {
            return Err(ConversationError::TitleTooLong { length });
        }
        Ok(trimmed.to_string())
    }

    /// Check that roles strictly alternate starting with User, with System
    /// messages tolerated only at the head (rehydrated system prompts).
    fn validate_sequence(messages: &[Message]) -> Result<(), ConversationError> {
        let mut expect_user = true;
        let mut seen_turn = false;
        for message in messages {
            match message.role {
                MessageRole::System => {
                    if seen_turn {
                        return Err(ConversationError::TurnOrderViolation);
                    }
                }
                MessageRole::User => {
                    if !expect_user {
                        return Err(ConversationError::TurnOrderViolation);
                    }
                    seen_turn = true;
                    expect_user = false;
                }
                MessageRole::Assistant => {
                    if expect_user {
                        return Err(ConversationError::TurnOrderViolation);
                    }
                    seen_turn = true;
                    expect_user = true;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[mutants::skip] // Delegates to Vec::len
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Running sum of assistant token counts; monotonic non-decreasing
    pub fn total_tokens(&self) -> i64 {
        self.total_tokens
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.last_message_at
    }
}
