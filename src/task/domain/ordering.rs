//! Pure planning for board orderings.
//!
//! A [`BoardOrdering`] is a snapshot of one board's tasks in display order.
//! Moves are planned as list splices over snapshots and produce only the
//! [`Placement`]s whose stored value differs from the planned one, so a
//! no-op move writes nothing and a damaged board is re-densified by the first
//! move that touches it.

use super::{BoardId, Placement, Position, Task, TaskDomainError, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    task_id: TaskId,
    stored_board: BoardId,
    stored_position: Position,
}

/// Snapshot of a board's tasks sorted by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardOrdering {
    board_id: BoardId,
    slots: Vec<Slot>,
}

impl BoardOrdering {
    /// Creates an ordering for a board with no tasks.
    #[must_use]
    pub const fn empty(board_id: BoardId) -> Self {
        Self {
            board_id,
            slots: Vec::new(),
        }
    }

    /// Builds the ordering of `board_id` from its tasks.
    ///
    /// Tasks are sorted by stored position, ties broken by identifier, so
    /// the snapshot is deterministic even when stored positions collide.
    #[must_use]
    pub fn from_tasks<'a>(board_id: BoardId, tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut slots: Vec<Slot> = tasks
            .into_iter()
            .map(|task| Slot {
                task_id: task.id(),
                stored_board: task.board_id(),
                stored_position: task.position(),
            })
            .collect();
        slots.sort_by_key(|slot| (slot.stored_position, slot.task_id));
        Self { board_id, slots }
    }

    /// Returns the board this ordering describes.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the number of tasks on the board.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether the board has no tasks.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the task identifiers in display order.
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.slots.iter().map(|slot| slot.task_id)
    }

    /// Returns the display index of a task, if it is on this board.
    #[must_use]
    pub fn position_of(&self, task_id: TaskId) -> Option<Position> {
        self.index_of(task_id).and_then(Position::from_index)
    }

    /// Returns the position a newly appended task receives.
    #[must_use]
    pub fn append_position(&self) -> Option<Position> {
        Position::from_index(self.slots.len())
    }

    /// Returns this ordering with `task_id` removed.
    ///
    /// Compacting the result plans the writes that close the gap a deleted
    /// task leaves behind.
    #[must_use]
    pub fn without(mut self, task_id: TaskId) -> Self {
        self.slots.retain(|slot| slot.task_id != task_id);
        self
    }

    /// Plans the writes that renumber this board to `0..len`.
    #[must_use]
    pub fn compaction(&self) -> MovePlan {
        MovePlan {
            placements: diff(self.board_id, &self.slots),
        }
    }

    fn index_of(&self, task_id: TaskId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.task_id == task_id)
    }
}

/// Placements produced by planning a move, containing only changed rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePlan {
    placements: Vec<Placement>,
}

impl MovePlan {
    /// Returns whether applying the plan would change nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.placements.is_empty()
    }

    /// Returns the planned placements.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Consumes the plan, returning its placements.
    #[must_use]
    pub fn into_placements(self) -> Vec<Placement> {
        self.placements
    }
}

/// Plans moving `task_id` from `source` to `target` on `destination`.
///
/// When `destination` is `None` or names the source board the move is a
/// splice within one list and `target` may be at most `len - 1`. Otherwise the
/// task leaves the source (later tasks close the gap) and is inserted into the
/// destination, where `target` may be at most the destination's length.
///
/// # Errors
///
/// Returns [`TaskDomainError::TaskNotOnBoard`] when the task is not in
/// `source`, or [`TaskDomainError::InvalidPosition`] when `target` is outside
/// the accepted range.
pub fn plan_move(
    source: &BoardOrdering,
    destination: Option<&BoardOrdering>,
    task_id: TaskId,
    target: Position,
) -> Result<MovePlan, TaskDomainError> {
    let from_index = source
        .index_of(task_id)
        .ok_or(TaskDomainError::TaskNotOnBoard(task_id))?;
    let cross_board = destination.filter(|dest| dest.board_id != source.board_id);

    let mut source_slots = source.slots.clone();
    let moved = source_slots.remove(from_index);

    let Some(dest) = cross_board else {
        check_range(target, source_slots.len())?;
        source_slots.insert(target.as_index(), moved);
        return Ok(MovePlan {
            placements: diff(source.board_id, &source_slots),
        });
    };

    check_range(target, dest.slots.len())?;
    let mut dest_slots = dest.slots.clone();
    dest_slots.insert(target.as_index(), moved);

    let mut placements = diff(source.board_id, &source_slots);
    placements.extend(diff(dest.board_id, &dest_slots));
    Ok(MovePlan { placements })
}

fn check_range(target: Position, max_index: usize) -> Result<(), TaskDomainError> {
    if target.as_index() <= max_index {
        return Ok(());
    }
    Err(TaskDomainError::InvalidPosition {
        requested: target,
        max: Position::from_index(max_index).unwrap_or(Position::new(u32::MAX)),
    })
}

fn diff(board_id: BoardId, slots: &[Slot]) -> Vec<Placement> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| {
            let position = Position::from_index(index)?;
            let unchanged = slot.stored_board == board_id && slot.stored_position == position;
            (!unchanged).then_some(Placement::new(slot.task_id, board_id, position))
        })
        .collect()
}
