//! Taskboard: ordered task boards with per-task file attachments.
//!
//! This crate keeps the tasks of each board in a dense, gap-free order under
//! single moves, cross-board moves and atomic bulk reorders, and stores
//! binary attachments for each task on the local filesystem.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, filesystem,
//!   in-memory)
//!
//! # Modules
//!
//! - [`task`]: Task ordering, lifecycle and attachments

pub mod task;
