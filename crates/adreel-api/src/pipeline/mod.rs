//! Preview and render pipelines.

pub mod deps;
pub mod preview;
pub mod render;
