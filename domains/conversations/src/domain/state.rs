//! State machine for conversation status transitions
//!
//! Conversation states: Active → Archived → Deleted, with Active → Deleted
//! also allowed. Deleted is terminal; no event leaves it.

pub use lexbridge_common::StateError;
use serde::{Deserialize, Serialize};

/// Conversation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "conversation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    #[default]
    Active,
    Archived,
    Deleted,
}

impl ConversationStatus {
    /// Check if this is a terminal state
    #[mutants::skip] // Delegates to a matches! over a closed enum
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [ConversationStatus] {
        match self {
            Self::Active => &[Self::Archived, Self::Deleted],
            Self::Archived => &[Self::Deleted],
            Self::Deleted => &[],
        }
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Events that trigger conversation state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusEvent {
    /// Archive the conversation
    Archive,
    /// Soft-delete the conversation
    Delete,
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Archive => write!(f, "archive"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Conversation state machine
pub struct ConversationStateMachine;

impl ConversationStateMachine {
    /// Attempt a state transition
    ///
    /// Returns the new state if the transition is valid, or an error otherwise.
    pub fn transition(
        current: ConversationStatus,
        event: StatusEvent,
    ) -> Result<ConversationStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (ConversationStatus::Active, StatusEvent::Archive) => ConversationStatus::Archived,
            (ConversationStatus::Active, StatusEvent::Delete) => ConversationStatus::Deleted,
            (ConversationStatus::Archived, StatusEvent::Delete) => ConversationStatus::Deleted,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
