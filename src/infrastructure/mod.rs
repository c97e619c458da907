//! Infrastructure layer - concrete implementations of domain traits

pub mod cache;
pub mod chain;
pub mod logging;
pub mod provider;
