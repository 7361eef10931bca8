//! Shared data models for the Adreel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Preview records and their positional sheet row layout
//! - The preview status state machine
//! - Generated content shapes (script/headline, publish metadata)
//! - Render jobs carried by the queue

pub mod content;
pub mod job;
pub mod record;

// Re-export common types
pub use content::{BusinessBrief, CommercialContent, PublishMetadata};
pub use job::RenderJob;
pub use record::{
    column_index, PreviewId, PreviewRecord, PreviewStatus, QrType, RecordError, RecordUpdate,
    COLUMNS, ROW_RANGE,
};
