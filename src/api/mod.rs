//! HTTP API layer

pub mod error;
pub mod health;
pub mod identity;
pub mod router;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use identity::Identity;
pub use router::create_router;
pub use state::AppState;
