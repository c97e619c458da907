//! Application state for shared services

use std::sync::Arc;

use crate::domain::cache::ResponseCache;
use crate::domain::chain::{ChainExecutor, ChainRepository, RunRecordRepository};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn ChainExecutor>,
    pub chains: Arc<dyn ChainRepository>,
    pub runs: Arc<dyn RunRecordRepository>,
    pub cache: ResponseCache,
    /// Gates the cache stats/clear endpoints
    pub debug_endpoints: bool,
}
