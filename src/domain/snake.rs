/// Snake body and the single-step movement rule.
///
/// Step order:
///   1. New head = head + direction delta
///   2. Off the board          → Collided(Wall)
///   3. On any body cell       → Collided(SelfHit)
///   4. Prepend head; on food keep the tail (growth), else drop it
///
/// Collision is checked before anything is committed, so a collided
/// step leaves the body untouched.

use std::collections::VecDeque;

use super::grid::{Cell, Grid};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit delta as (dcol, drow). Rows grow downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollisionKind {
    Wall,
    SelfHit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    Moved,
    Grew,
    Collided(CollisionKind),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Cell>,
}

impl Snake {
    /// Build from cells, head first.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        Snake { body: cells.into_iter().collect() }
    }

    /// The fixed three-segment opening snake, heading right.
    pub fn starting() -> Self {
        Snake::from_cells([Cell::new(8, 10), Cell::new(7, 10), Cell::new(6, 10)])
    }

    pub fn head(&self) -> Cell {
        // Never empty: constructors always provide at least the head.
        self.body.front().copied().unwrap_or(Cell::new(0, 0))
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.body.iter()
    }

    pub fn to_vec(&self) -> Vec<Cell> {
        self.body.iter().copied().collect()
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Where the head would land moving in `dir`.
    pub fn next_head(&self, dir: Direction) -> Cell {
        let (dc, dr) = dir.delta();
        self.head().offset(dc, dr)
    }

    /// Advance one cell. See module docs for ordering.
    pub fn step(&mut self, dir: Direction, food: Cell, grid: &Grid) -> StepOutcome {
        let head = self.next_head(dir);

        if !grid.contains(head) {
            return StepOutcome::Collided(CollisionKind::Wall);
        }
        // Full body, tail included: the tail has not moved yet.
        if self.occupies(head) {
            return StepOutcome::Collided(CollisionKind::SelfHit);
        }

        self.body.push_front(head);
        if head == food {
            StepOutcome::Grew
        } else {
            self.body.pop_back();
            StepOutcome::Moved
        }
    }
}
