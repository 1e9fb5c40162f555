//! Postgres-backed conversation store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexbridge_common::{Pagination, RepositoryError, Result};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Conversation, Message, MessageRole};
use crate::domain::state::ConversationStatus;
use crate::repository::ConversationStore;

/// Conversation row mapper
#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    owner_id: Uuid,
    title: Option<String>,
    status: ConversationStatus,
    total_tokens: i64,
    last_message_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Message row mapper
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    role: MessageRole,
    content: String,
    token_count: Option<i64>,
    referenced_document_ids: Vec<Uuid>,
    metadata: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            conversation_id: row.conversation_id,
            role: row.role,
            content: row.content,
            token_count: row.token_count,
            referenced_document_ids: row.referenced_document_ids,
            metadata: row.metadata.0,
            created_at: row.created_at,
        }
    }
}

fn rehydrate(row: ConversationRow, messages: Vec<Message>) -> Result<Conversation> {
    Conversation::rehydrate(
        row.id,
        row.owner_id,
        row.title,
        row.status,
        messages,
        row.total_tokens,
        row.created_at,
        row.updated_at,
        row.last_message_at,
    )
    .map_err(|e| RepositoryError::InvalidData(format!("corrupt conversation row: {}", e)).into())
}

#[derive(Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn load(&self, id: Uuid) -> Result<Option<Conversation>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, owner_id, title, status, total_tokens,
                   last_message_at, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let messages = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, role, content, token_count,
                   referenced_document_ids, metadata, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Message::from)
        .collect();

        rehydrate(row, messages).map(Some)
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, owner_id, title, status, total_tokens,
                last_message_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                status = EXCLUDED.status,
                total_tokens = EXCLUDED.total_tokens,
                last_message_at = EXCLUDED.last_message_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(conversation.id())
        .bind(conversation.owner_id())
        .bind(conversation.title())
        .bind(conversation.status())
        .bind(conversation.total_tokens())
        .bind(conversation.last_message_at())
        .bind(conversation.created_at())
        .bind(conversation.updated_at())
        .execute(&mut *tx)
        .await?;

        // Messages are immutable: rows already stored are left untouched
        for (position, message) in conversation.messages().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO messages (
                    id, conversation_id, role, content, token_count,
                    referenced_document_ids, metadata, position, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(message.id)
            .bind(message.conversation_id)
            .bind(message.role)
            .bind(&message.content)
            .bind(message.token_count)
            .bind(&message.referenced_document_ids)
            .bind(Json(message.metadata.clone()))
            .bind(position as i32)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<ConversationStatus>,
        page: Pagination,
    ) -> Result<(Vec<Conversation>, i64)> {
        let (rows, total) = match status {
            Some(s) => {
                let rows = sqlx::query_as::<_, ConversationRow>(
                    r#"
                    SELECT id, owner_id, title, status, total_tokens,
                           last_message_at, created_at, updated_at
                    FROM conversations
                    WHERE owner_id = $1 AND status = $2
                    ORDER BY last_message_at DESC NULLS LAST, created_at DESC
                    LIMIT $3 OFFSET $4
                    "#,
                )
                .bind(owner_id)
                .bind(s)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?;

                let total = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM conversations WHERE owner_id = $1 AND status = $2",
                )
                .bind(owner_id)
                .bind(s)
                .fetch_one(&self.pool)
                .await?;

                (rows, total)
            }
            None => {
                let rows = sqlx::query_as::<_, ConversationRow>(
                    r#"
                    SELECT id, owner_id, title, status, total_tokens,
                           last_message_at, created_at, updated_at
                    FROM conversations
                    WHERE owner_id = $1 AND status != 'deleted'
                    ORDER BY last_message_at DESC NULLS LAST, created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(owner_id)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?;

                let total = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM conversations WHERE owner_id = $1 AND status != 'deleted'",
                )
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

                (rows, total)
            }
        };

        if rows.is_empty() {
            return Ok((Vec::new(), total));
        }

        // One query for every page's messages, grouped in memory
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let message_rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, role, content, token_count,
                   referenced_document_ids, metadata, created_at
            FROM messages
            WHERE conversation_id = ANY($1)
            ORDER BY conversation_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: std::collections::HashMap<Uuid, Vec<Message>> =
            std::collections::HashMap::new();
        for row in message_rows {
            grouped
                .entry(row.conversation_id)
                .or_default()
                .push(row.into());
        }

        let mut conversations = Vec::with_capacity(rows.len());
        for row in rows {
            let messages = grouped.remove(&row.id).unwrap_or_default();
            conversations.push(rehydrate(row, messages)?);
        }

        Ok((conversations, total))
    }

    async fn sum_tokens_by_owner(&self, owner_id: Uuid) -> Result<i64> {
        let sum = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(total_tokens), 0)::BIGINT FROM conversations WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }
}
