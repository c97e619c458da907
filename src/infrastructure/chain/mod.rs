//! Chain execution and persistence implementations

mod executor_impl;
pub(crate) mod in_memory_repository;
mod postgres_repository;

pub use executor_impl::{ChainExecutorImpl, ExecutorConfig};
pub use in_memory_repository::{InMemoryChainRepository, InMemoryRunRecordRepository};
pub use postgres_repository::{
    connect_pool, ensure_schema, PostgresChainRepository, PostgresConfig,
    PostgresRunRecordRepository,
};
