//! Movement execution.
//!
//! The allocation engine decides where a stack should go; a `Mover` turns
//! that into a path and walks it, resolving any fight at the end of the walk.
//! `PathMover` is the reference implementation used by the game driver.

pub mod combat;
pub mod path;

use crate::board::{Position, StackId, World};

pub use combat::FightResult;
pub use path::PathMover;

/// What happened during one attempt to walk a stack's path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// At least one step was taken.
    pub moved: bool,
    /// Result of the fight at the end of the walk, if there was one.
    pub fight: Option<FightResult>,
    /// The stack lost a fight and no longer exists.
    pub died: bool,
    pub steps: u32,
    /// The walk stopped early because the way was blocked.
    pub aborted: bool,
}

impl MoveOutcome {
    /// Outcome of a move that never started.
    pub fn stayed() -> Self {
        MoveOutcome::default()
    }
}

/// The movement executor.
pub trait Mover {
    /// Plans a path for `stack` to `dest` and stores it on the stack.
    ///
    /// Returns the movement points the whole path costs, or `None` when no
    /// path exists. A zero estimate means the stack is already there.
    fn estimate(&mut self, world: &mut World, stack: StackId, dest: Position) -> Option<u32>;

    /// Walks the stack's stored path as far as its movement points allow.
    fn execute(&mut self, world: &mut World, stack: StackId) -> MoveOutcome;
}
