//! Route handlers

pub mod cache;
pub mod chains;
pub mod workflow;
