//! Step definitions for board ordering scenarios.

mod then;
pub mod world;
