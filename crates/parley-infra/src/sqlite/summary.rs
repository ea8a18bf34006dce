//! SQLite summary store: digests live on the `chats` row they describe.

use parley_core::context::SummaryStore;
use parley_types::context::Digest;
use parley_types::error::RepositoryError;
use uuid::Uuid;

use super::pool::DatabasePool;

/// `SummaryStore` backed by the `summary` and `summary_covers_up_to` columns of `chats`.
pub struct SqliteSummaryStore {
    pool: DatabasePool,
}

impl SqliteSummaryStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl SummaryStore for SqliteSummaryStore {
    /// Overwrites any previous digest. `NotFound` when the chat does not exist.
    async fn save(&self, conversation_id: &Uuid, digest: &Digest) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE chats SET summary = ?, summary_covers_up_to = ? WHERE id = ?")
                .bind(&digest.text)
                .bind(digest.covers_up_to as i64)
                .bind(conversation_id.to_string())
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn load(&self, conversation_id: &Uuid) -> Result<Option<Digest>, RepositoryError> {
        let row: Option<(Option<String>, Option<i64>)> =
            sqlx::query_as("SELECT summary, summary_covers_up_to FROM chats WHERE id = ?")
                .bind(conversation_id.to_string())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some((Some(text), Some(covers_up_to))) => {
                let covers_up_to = usize::try_from(covers_up_to).map_err(|_| {
                    RepositoryError::Query(format!("negative summary_covers_up_to: {covers_up_to}"))
                })?;
                Ok(Some(Digest { text, covers_up_to }))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, conversation_id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE chats SET summary = NULL, summary_covers_up_to = NULL WHERE id = ?")
            .bind(conversation_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
