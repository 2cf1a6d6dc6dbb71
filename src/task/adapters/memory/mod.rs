//! In-memory adapters for tests and single-process embedding.

mod task;
mod users;

pub use task::InMemoryTaskRepository;
pub use users::InMemoryUserDirectory;
