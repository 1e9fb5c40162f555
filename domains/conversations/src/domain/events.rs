//! Domain events raised by conversation mutations
//!
//! Each successful mutation returns its event to the caller (an explicit
//! outbox); the orchestrator publishes collected events only after the
//! aggregate has been saved, so a failed turn emits nothing.

use serde::Serialize;
use uuid::Uuid;

/// Events raised by the Conversation aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    Started {
        conversation_id: Uuid,
        owner_id: Uuid,
    },
    UserMessageAdded {
        conversation_id: Uuid,
        message_id: Uuid,
    },
    AssistantMessageAdded {
        conversation_id: Uuid,
        message_id: Uuid,
        token_count: i64,
    },
    TitleUpdated {
        conversation_id: Uuid,
    },
    Archived {
        conversation_id: Uuid,
    },
    Deleted {
        conversation_id: Uuid,
    },
}

impl ConversationEvent {
    /// The aggregate this event belongs to
    pub fn conversation_id(&self) -> Uuid {
        match self {
            Self::Started {
                conversation_id, ..
            }
            | Self::UserMessageAdded {
                conversation_id, ..
            }
            | Self::AssistantMessageAdded {
                conversation_id, ..
            }
            | Self::TitleUpdated { conversation_id }
            | Self::Archived { conversation_id }
            | Self::Deleted { conversation_id } => *conversation_id,
        }
    }

    /// Stable event name for logs and consumers
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "conversation.started",
            Self::UserMessageAdded { .. } => "conversation.user_message_added",
            Self::AssistantMessageAdded { .. } => "conversation.assistant_message_added",
            Self::TitleUpdated { .. } => "conversation.title_updated",
            Self::Archived { .. } => "conversation.archived",
            Self::Deleted { .. } => "conversation.deleted",
        }
    }
}
