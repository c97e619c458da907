//! In-memory chain and run-history repositories
//!
//! Default storage backend; also the workhorse for tests. Counter
//! updates happen under the write lock so concurrent executions never
//! lose increments.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::chain::{Chain, ChainRepository, RunRecord, RunRecordRepository};
use crate::domain::DomainError;

/// Chain storage backed by a locked map.
#[derive(Debug, Default)]
pub struct InMemoryChainRepository {
    chains: RwLock<HashMap<String, Chain>>,
}

impl InMemoryChainRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChainRepository for InMemoryChainRepository {
    async fn create(&self, chain: &Chain) -> Result<(), DomainError> {
        let mut chains = self.chains.write().unwrap();
        if chains.contains_key(&chain.id) {
            return Err(DomainError::storage(format!(
                "Chain '{}' already exists",
                chain.id
            )));
        }
        chains.insert(chain.id.clone(), chain.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Chain>, DomainError> {
        Ok(self.chains.read().unwrap().get(id).cloned())
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Chain>, DomainError> {
        let chains = self.chains.read().unwrap();
        let mut owned: Vec<Chain> = chains
            .values()
            .filter(|chain| chain.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn increment_execution_stats(&self, id: &str) -> Result<(), DomainError> {
        let mut chains = self.chains.write().unwrap();
        let chain = chains
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("Workflow chain not found"))?;
        chain.execution_count += 1;
        chain.last_executed_at = Some(chrono::Utc::now());
        Ok(())
    }
}

/// Run history backed by a locked vector.
#[derive(Debug, Default)]
pub struct InMemoryRunRecordRepository {
    runs: RwLock<Vec<RunRecord>>,
}

impl InMemoryRunRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunRecordRepository for InMemoryRunRecordRepository {
    async fn record(&self, run: &RunRecord) -> Result<(), DomainError> {
        self.runs.write().unwrap().push(run.clone());
        Ok(())
    }

    async fn recent(
        &self,
        owner_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RunRecord>, DomainError> {
        let runs = self.runs.read().unwrap();
        let mut matching: Vec<RunRecord> = runs
            .iter()
            .filter(|run| match owner_id {
                Some(owner) => run.owner_id.as_deref() == Some(owner),
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}
