//! HTTP API for the commercial generator.
//!
//! Public routes assemble previews and capture leads; the internal
//! route runs the render-and-publish pipeline on behalf of the
//! dispatcher.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod sweeper;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use sweeper::ReconciliationSweeper;
