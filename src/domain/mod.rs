//! Domain layer - entities, traits and pure logic

pub mod action;
pub mod cache;
pub mod chain;
pub mod error;
pub mod prompt;
pub mod provider;

pub use error::DomainError;
