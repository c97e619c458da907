//! Chain domain - entities, execution contract and repositories

mod entity;
mod executor;
mod repository;

pub use entity::{
    validate_prompt, validate_steps, Chain, ChainStep, MAX_CHAIN_STEPS, MAX_PROMPT_LEN,
    PUBLIC_CHAIN_PREFIX,
};
pub use executor::{chain_summary, ChainExecutor, ChainRunResult, SingleRunResult, StepRecord};
pub use repository::{ChainRepository, RunRecord, RunRecordRepository};
