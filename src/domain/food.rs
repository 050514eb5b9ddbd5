/// Food placement by rejection sampling.
///
/// Column is drawn from the whole board, row from below the reserved HUD
/// band. Candidates on the snake are redrawn. Sampling is bounded; once the
/// budget is spent a linear scan of the band finds any free cell left.

use std::collections::HashSet;

use rand::Rng;

use super::grid::{Cell, Grid};
use super::snake::Snake;

/// Redraws allowed per spawn cell before falling back to a scan.
const ATTEMPTS_PER_CELL: usize = 64;

/// Pick a free cell for food. `None` only when the snake fills the band.
pub fn spawn<R: Rng>(grid: &Grid, snake: &Snake, rng: &mut R) -> Option<Cell> {
    let area = grid.spawn_area();
    if area == 0 {
        return None;
    }

    let occupied: HashSet<Cell> = snake.cells().copied().collect();
    let rows = grid.spawn_rows();

    for _ in 0..area.saturating_mul(ATTEMPTS_PER_CELL) {
        let candidate = Cell::new(
            rng.random_range(grid.cols()),
            rng.random_range(rows.clone()),
        );
        if !occupied.contains(&candidate) {
            return Some(candidate);
        }
    }

    rows.flat_map(|row| grid.cols().map(move |col| Cell::new(col, row)))
        .find(|c| !occupied.contains(c))
}
