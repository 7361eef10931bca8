//! HTTP handlers.

pub mod health;
pub mod lead;
pub mod preview;
pub mod render;
