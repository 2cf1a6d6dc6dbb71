//! Board-scoped task ordering and task attachments.
//!
//! Every board keeps its tasks at the dense positions `0..N`. Moves, bulk
//! reorders and deletes rewrite positions through one record store
//! transaction per operation, serialised per board. Each task also owns a
//! directory of binary attachments at `{root}/{project_id}/{task_id}/`.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
mod failure;
pub mod locks;
pub mod ports;
pub mod services;

pub use failure::FailureKind;

#[cfg(test)]
mod tests;
