//! Board records, the scoping unit for task positions.

use super::{BoardId, ProjectId};
use serde::{Deserialize, Serialize};

/// A board belonging to a project.
///
/// Boards carry no state of their own beyond their owning project; task order
/// is derived from the tasks' positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    id: BoardId,
    project_id: ProjectId,
}

impl Board {
    /// Creates a new board for the given project.
    #[must_use]
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            id: BoardId::new(),
            project_id,
        }
    }

    /// Reconstructs a board from persisted storage.
    #[must_use]
    pub const fn from_persisted(id: BoardId, project_id: ProjectId) -> Self {
        Self { id, project_id }
    }

    /// Returns the board identifier.
    #[must_use]
    pub const fn id(&self) -> BoardId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }
}
