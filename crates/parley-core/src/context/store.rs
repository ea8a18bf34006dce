//! SummaryStore trait and an in-memory implementation.

use dashmap::DashMap;
use parley_types::context::Digest;
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Durable home of conversation digests. Last write wins.
///
/// Implementations live in parley-infra (e.g., `SqliteSummaryStore`).
pub trait SummaryStore: Send + Sync {
    fn save(
        &self,
        conversation_id: &Uuid,
        digest: &Digest,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn load(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Digest>, RepositoryError>> + Send;

    fn delete(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Digest store for ephemeral conversations and tests.
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    digests: DashMap<Uuid, Digest>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

impl SummaryStore for InMemorySummaryStore {
    async fn save(&self, conversation_id: &Uuid, digest: &Digest) -> Result<(), RepositoryError> {
        self.digests.insert(*conversation_id, digest.clone());
        Ok(())
    }

    async fn load(&self, conversation_id: &Uuid) -> Result<Option<Digest>, RepositoryError> {
        Ok(self.digests.get(conversation_id).map(|d| d.value().clone()))
    }

    async fn delete(&self, conversation_id: &Uuid) -> Result<(), RepositoryError> {
        self.digests.remove(conversation_id);
        Ok(())
    }
}
