//! Relayer HTTP API
//!
//! `POST /api/resolver` submits withdrawals on behalf of users; the
//! remaining routes expose health, pool statistics and analytics to the
//! front-end.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod server;
pub mod state;
pub mod types;

// Re-export main types
pub use error::{RelayerError, RelayerResult};
pub use server::{create_router, ApiServer, ApiServerBuilder};
pub use state::AppState;
pub use types::*;
