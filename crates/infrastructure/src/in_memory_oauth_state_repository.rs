use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tessera_application::{OAuthStateRecord, OAuthStateRepository};
use tessera_core::{AppError, AppResult};

/// In-memory OAuth state repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryOAuthStateRepository {
    states: RwLock<HashMap<String, OAuthStateRecord>>,
}

impl InMemoryOAuthStateRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OAuthStateRepository for InMemoryOAuthStateRepository {
    async fn save_state(&self, record: OAuthStateRecord) -> AppResult<()> {
        let mut states = self.states.write().await;
        if states.contains_key(&record.state_hash) {
            return Err(AppError::Conflict("oauth state already exists".to_owned()));
        }

        states.insert(record.state_hash.clone(), record);
        Ok(())
    }

    async fn consume_state(&self, state_hash: &str) -> AppResult<Option<OAuthStateRecord>> {
        Ok(self.states.write().await.remove(state_hash))
    }
}
