//! Render job dispatcher.
//!
//! Pulls render jobs off the Redis stream and invokes the backend's
//! internal render endpoint for each one, with bounded concurrency,
//! crash recovery via pending-claim, and a dead letter stream for jobs
//! that exhaust their retries.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod render_client;

pub use config::WorkerConfig;
pub use dispatcher::Dispatcher;
pub use error::{WorkerError, WorkerResult};
pub use render_client::RenderClient;
