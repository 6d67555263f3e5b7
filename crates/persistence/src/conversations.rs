//! Conversation persistence using ScyllaDB

use async_trait::async_trait;
use chrono::Utc;
use scylla::batch::{Batch, BatchType};
use utility_agent_core::{Conversation, ConversationStore, Turn, TurnMetadata, TurnRole};

use crate::accounts::from_millis;
use crate::{PersistenceError, ScyllaClient};

/// ScyllaDB implementation of the conversation store.
///
/// Turns are clustered by a microsecond sequence so reads come back in append order.
#[derive(Clone)]
pub struct ScyllaConversationStore {
    client: ScyllaClient,
}

impl ScyllaConversationStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn insert_turn_cql(&self) -> String {
        format!(
            "INSERT INTO {}.conversation_turns (
                conversation_id, seq, role, content, timestamp_ms, metadata_json
            ) VALUES (?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        )
    }

    async fn exists(&self, id: &str) -> Result<bool, PersistenceError> {
        Ok(self.created_at_ms(id).await?.is_some())
    }

    async fn created_at_ms(&self, id: &str) -> Result<Option<i64>, PersistenceError> {
        let query = format!(
            "SELECT created_at_ms FROM {}.conversations WHERE conversation_id = ?",
            self.client.keyspace()
        );
        let result = self.client.session().query_unpaged(query, (id,)).await?;

        match result.rows.and_then(|rows| rows.into_iter().next()) {
            Some(row) => {
                let (created_at_ms,): (Option<i64>,) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                Ok(Some(created_at_ms.unwrap_or_default()))
            }
            None => Ok(None),
        }
    }

    async fn load_turns(&self, id: &str) -> Result<Vec<Turn>, PersistenceError> {
        let query = format!(
            "SELECT role, content, timestamp_ms, metadata_json
             FROM {}.conversation_turns WHERE conversation_id = ?",
            self.client.keyspace()
        );
        let result = self.client.session().query_unpaged(query, (id,)).await?;

        let mut turns = Vec::new();
        for row in result.rows.unwrap_or_default() {
            let (role, content, timestamp_ms, metadata_json): (
                String,
                Option<String>,
                i64,
                Option<String>,
            ) = row
                .into_typed()
                .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

            let role = TurnRole::parse(&role)
                .ok_or_else(|| PersistenceError::InvalidData(format!("unknown role: {role}")))?;
            let metadata = metadata_json
                .map(|json| serde_json::from_str::<TurnMetadata>(&json))
                .transpose()?;

            turns.push(Turn {
                role,
                content: content.unwrap_or_default(),
                timestamp: from_millis(timestamp_ms).unwrap_or_else(Utc::now),
                metadata,
            });
        }
        Ok(turns)
    }

    fn turn_values(
        id: &str,
        seq: i64,
        turn: &Turn,
    ) -> Result<(String, i64, String, String, i64, Option<String>), PersistenceError> {
        let metadata_json = turn
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        Ok((
            id.to_string(),
            seq,
            turn.role.as_str().to_string(),
            turn.content.clone(),
            turn.timestamp.timestamp_millis(),
            metadata_json,
        ))
    }

    fn next_seq() -> i64 {
        Utc::now().timestamp_micros()
    }
}

#[async_trait]
impl ConversationStore for ScyllaConversationStore {
    async fn create(&self) -> utility_agent_core::Result<String> {
        let conversation = Conversation::new();
        let query = format!(
            "INSERT INTO {}.conversations (conversation_id, created_at_ms) VALUES (?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                query,
                (&conversation.id, conversation.created_at.timestamp_millis()),
            )
            .await
            .map_err(PersistenceError::from)?;

        tracing::info!(conversation_id = %conversation.id, "Conversation created in ScyllaDB");
        Ok(conversation.id)
    }

    async fn get(&self, id: &str) -> utility_agent_core::Result<Option<Conversation>> {
        let Some(created_at_ms) = self.created_at_ms(id).await? else {
            return Ok(None);
        };
        let turns = self.load_turns(id).await?;
        Ok(Some(Conversation {
            id: id.to_string(),
            created_at: from_millis(created_at_ms).unwrap_or_else(Utc::now),
            turns,
        }))
    }

    async fn append(&self, id: &str, turn: Turn) -> utility_agent_core::Result<bool> {
        if !self.exists(id).await? {
            return Ok(false);
        }
        let values = Self::turn_values(id, Self::next_seq(), &turn)?;
        self.client
            .session()
            .query_unpaged(self.insert_turn_cql(), values)
            .await
            .map_err(PersistenceError::from)?;
        Ok(true)
    }

    async fn append_exchange(
        &self,
        id: &str,
        user: Turn,
        assistant: Turn,
    ) -> utility_agent_core::Result<bool> {
        if !self.exists(id).await? {
            return Ok(false);
        }

        let seq = Self::next_seq();
        let user_values = Self::turn_values(id, seq, &user)?;
        let assistant_values = Self::turn_values(id, seq + 1, &assistant)?;

        // Logged batch: both turns become visible together or not at all
        let mut batch = Batch::new(BatchType::Logged);
        batch.append_statement(self.insert_turn_cql().as_str());
        batch.append_statement(self.insert_turn_cql().as_str());

        self.client
            .session()
            .batch(&batch, (user_values, assistant_values))
            .await
            .map_err(PersistenceError::from)?;

        tracing::debug!(conversation_id = %id, "Exchange appended");
        Ok(true)
    }
}
