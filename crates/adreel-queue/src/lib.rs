//! Render job queue backed by Redis Streams.
//!
//! Delivery is at-least-once: jobs sit in a consumer group until
//! acknowledged, a claimer recovers entries from dead consumers, and
//! an idempotency key collapses duplicate enqueues for the same
//! preview while its dedup window is open.

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{JobQueue, QueueConfig};
