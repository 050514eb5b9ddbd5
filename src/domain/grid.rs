/// Grid model: board geometry in cells.
///
/// The top `reserved_top_rows` rows belong to the HUD band. The snake may
/// travel through them, but food never spawns there.

use std::ops::Range;

/// A board position. Signed so that a head stepping off the board
/// (column -1, row -1) is still representable for the wall check.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Cell { col, row }
    }

    #[inline]
    pub fn offset(self, dc: i32, dr: i32) -> Cell {
        Cell { col: self.col + dc, row: self.row + dr }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    pub reserved_top_rows: i32,
    /// Terminal columns per cell (presentation only).
    pub cell_size: u16,
}

impl Grid {
    pub fn new(width: i32, height: i32, reserved_top_rows: i32, cell_size: u16) -> Self {
        Grid { width, height, reserved_top_rows, cell_size }
    }

    /// Is the cell on the board?
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.width && cell.row < self.height
    }

    pub fn cols(&self) -> Range<i32> {
        0..self.width
    }

    /// Rows food may spawn in.
    pub fn spawn_rows(&self) -> Range<i32> {
        self.reserved_top_rows.min(self.height)..self.height
    }

    /// Number of cells in the spawn band.
    pub fn spawn_area(&self) -> usize {
        let rows = self.spawn_rows();
        (self.width.max(0) as usize) * ((rows.end - rows.start).max(0) as usize)
    }

    /// Is the cell inside the spawn band?
    pub fn in_spawn_band(&self, cell: Cell) -> bool {
        self.contains(cell) && self.spawn_rows().contains(&cell.row)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(25, 25, 3, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let g = Grid::new(25, 25, 3, 2);
        assert!(g.contains(Cell::new(0, 0)));
        assert!(g.contains(Cell::new(24, 24)));
        assert!(!g.contains(Cell::new(25, 0)));
        assert!(!g.contains(Cell::new(0, 25)));
        assert!(!g.contains(Cell::new(-1, 5)));
        assert!(!g.contains(Cell::new(5, -1)));
    }

    #[test]
    fn spawn_band_skips_reserved_rows() {
        let g = Grid::new(10, 8, 3, 2);
        assert_eq!(g.spawn_rows(), 3..8);
        assert_eq!(g.spawn_area(), 50);
        assert!(!g.in_spawn_band(Cell::new(4, 2)));
        assert!(g.in_spawn_band(Cell::new(4, 3)));
    }

    #[test]
    fn reserved_band_taller_than_board_leaves_nothing() {
        let g = Grid::new(4, 2, 5, 2);
        assert_eq!(g.spawn_area(), 0);
    }
}
