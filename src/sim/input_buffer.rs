/// Single-slot direction buffer between input handling and the tick.
///
/// Input may arrive any number of times between two ticks. Only the last
/// accepted request survives, and the tick reads it exactly once.

use crate::domain::snake::Direction;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputBuffer {
    pending: Option<Direction>,
}

impl InputBuffer {
    pub fn new() -> Self {
        InputBuffer { pending: None }
    }

    /// Latch `requested` unless it reverses `current`. Returns whether it was kept.
    pub fn set_pending(&mut self, requested: Direction, current: Direction) -> bool {
        if requested.is_opposite(current) {
            return false;
        }
        self.pending = Some(requested);
        true
    }

    /// Take the latched direction, or keep `current`. Clears the slot.
    pub fn consume(&mut self, current: Direction) -> Direction {
        self.pending.take().unwrap_or(current)
    }

    #[allow(dead_code)]
    pub fn pending(&self) -> Option<Direction> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
