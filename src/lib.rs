// Re-export needed modules for testing
pub mod api;
pub mod models;
pub mod session;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError, AuthMode, AuthSession, Decision};
pub use models::*;
pub use session::Session;
