//! Adapter implementations for task ordering and attachment ports.

pub mod filesystem;
pub mod memory;
pub mod postgres;
