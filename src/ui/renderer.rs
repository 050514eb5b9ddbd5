/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer is fed through `Presenter`: it keeps the latest snapshot
/// plus short-lived effects (border flash, game-over reveal) and redraws
/// every frame from that.

use std::io::{self, BufWriter, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::{Cell as GridCell, Grid};
use crate::domain::snake::CollisionKind;
use crate::sim::event::Presenter;
use crate::sim::world::{Phase, Snapshot};

// ── Palette ──

const COLOR_BG: Color = Color::Rgb { r: 0x20, g: 0x3b, b: 0x15 };
const COLOR_SNAKE: Color = Color::Rgb { r: 0xc8, g: 0xfd, b: 0xa0 };
const COLOR_FOOD: Color = Color::Rgb { r: 0xd2, g: 0xaa, b: 0x34 };
const COLOR_BORDER: Color = Color::Rgb { r: 0x2f, g: 0x4d, b: 0x1f };
const COLOR_FLASH_EAT: Color = Color::Rgb { r: 0xd2, g: 0xaa, b: 0x34 };
const COLOR_FLASH_CRASH: Color = Color::Rgb { r: 0xc0, g: 0x30, b: 0x30 };
const COLOR_OVERLAY: Color = Color::Rgb { r: 0x10, g: 0x1e, b: 0x0a };
const COLOR_TEXT: Color = Color::Rgb { r: 0xc8, g: 0xfd, b: 0xa0 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell outside the board, so the
    /// terminal's own default never shows through.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Effects ──

const FLASH_DURATION: Duration = Duration::from_millis(500);
/// Delay between letters of the game-over title.
const REVEAL_STEP: Duration = Duration::from_millis(60);
const GAME_OVER_TITLE: &str = "Game Over";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum FlashKind {
    Eat,
    Crash,
}

// ── Layout ──

const HUD_LINE: usize = 1;   // inside the reserved band, board-relative
const BOARD_X: usize = 0;
const BOARD_Y: usize = 0;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    grid: Grid,
    snapshot: Option<Snapshot>,
    flash: Option<(FlashKind, Instant)>,
    died_at: Option<Instant>,
    pub gamepad_connected: bool,
}

impl Renderer {
    pub fn new(grid: Grid) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            grid,
            snapshot: None,
            flash: None,
            died_at: None,
            gamepad_connected: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, now: Instant) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(now);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut need_move = true;
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, now: Instant) {
        self.front.clear();
        let Some(snap) = self.snapshot.clone() else { return };

        if let Some((_, started)) = self.flash {
            if now.saturating_duration_since(started) >= FLASH_DURATION {
                self.flash = None;
            }
        }

        self.compose_border();
        self.compose_board();
        self.compose_hud(&snap);
        self.compose_food(snap.food);
        self.compose_snake(&snap.snake);
        if let Phase::Dead { restart_unlock_at } = snap.phase {
            self.compose_game_over(now, restart_unlock_at);
        }
        self.compose_help();
    }

    fn cell_w(&self) -> usize {
        self.grid.cell_size as usize
    }

    /// Board size in terminal cells, border included.
    fn board_extent(&self) -> (usize, usize) {
        let w = self.grid.width.max(0) as usize * self.cell_w() + 2;
        let h = self.grid.height.max(0) as usize + 2;
        (w, h)
    }

    /// Terminal position of a grid cell's left column.
    fn to_term(&self, c: GridCell) -> Option<(usize, usize)> {
        if !self.grid.contains(c) {
            return None;
        }
        Some((
            BOARD_X + 1 + c.col as usize * self.cell_w(),
            BOARD_Y + 1 + c.row as usize,
        ))
    }

    fn compose_border(&mut self) {
        let color = match self.flash {
            Some((FlashKind::Eat, _)) => COLOR_FLASH_EAT,
            Some((FlashKind::Crash, _)) => COLOR_FLASH_CRASH,
            None => COLOR_BORDER,
        };
        let (w, h) = self.board_extent();
        for x in 0..w {
            self.front.set(BOARD_X + x, BOARD_Y, Cell::new(' ', color, color));
            self.front.set(BOARD_X + x, BOARD_Y + h - 1, Cell::new(' ', color, color));
        }
        for y in 0..h {
            self.front.set(BOARD_X, BOARD_Y + y, Cell::new(' ', color, color));
            self.front.set(BOARD_X + w - 1, BOARD_Y + y, Cell::new(' ', color, color));
        }
    }

    fn compose_board(&mut self) {
        let (w, h) = self.board_extent();
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                self.front.set(BOARD_X + x, BOARD_Y + y, Cell::new(' ', COLOR_TEXT, COLOR_BG));
            }
        }
    }

    /// Score and speed, drawn inside the reserved top band.
    fn compose_hud(&mut self, snap: &Snapshot) {
        if self.grid.reserved_top_rows <= HUD_LINE as i32 {
            return;
        }
        let pad = if self.gamepad_connected { "  [pad]" } else { "" };
        let hud = format!("Score: {}  {}ms{}", snap.score, snap.interval.as_millis(), pad);
        self.front.put_str(BOARD_X + 2, BOARD_Y + 1 + HUD_LINE, &hud, COLOR_TEXT, COLOR_BG);
    }

    fn fill_cell(&mut self, c: GridCell, color: Color) {
        let Some((x, y)) = self.to_term(c) else { return };
        // Last column left as background: the 1px gap between tiles.
        let cw = self.cell_w();
        for i in 0..cw {
            let ch = if cw > 1 && i + 1 == cw { '▌' } else { '█' };
            self.front.set(x + i, y, Cell::new(ch, color, COLOR_BG));
        }
    }

    fn compose_food(&mut self, food: GridCell) {
        self.fill_cell(food, COLOR_FOOD);
    }

    fn compose_snake(&mut self, snake: &[GridCell]) {
        for &seg in snake {
            self.fill_cell(seg, COLOR_SNAKE);
        }
    }

    /// Title revealed letter by letter, then the restart hint.
    fn compose_game_over(&mut self, now: Instant, unlock_at: Instant) {
        let (w, h) = self.board_extent();
        let box_w = 26.min(w.saturating_sub(2));
        let box_h = 5;
        if box_w == 0 || h < box_h + 2 {
            return;
        }
        let x0 = BOARD_X + (w - box_w) / 2;
        let y0 = BOARD_Y + (h - box_h) / 2;
        for y in 0..box_h {
            for x in 0..box_w {
                self.front.set(x0 + x, y0 + y, Cell::new(' ', COLOR_TEXT, COLOR_OVERLAY));
            }
        }

        let since = self.died_at.map_or(Duration::MAX, |t| now.saturating_duration_since(t));
        let shown = revealed_letters(since, GAME_OVER_TITLE.chars().count());
        let title: String = GAME_OVER_TITLE.chars().take(shown).collect();
        let tx = x0 + box_w.saturating_sub(GAME_OVER_TITLE.len()) / 2;
        self.front.put_str(tx, y0 + 1, &title, COLOR_FLASH_CRASH, COLOR_OVERLAY);

        let left = unlock_at.saturating_duration_since(now);
        let hint = if left.is_zero() {
            "Press any direction".to_string()
        } else {
            format!("Restart in {:.1}s", left.as_secs_f32())
        };
        let hx = x0 + box_w.saturating_sub(hint.chars().count()) / 2;
        self.front.put_str(hx, y0 + 3, &hint, COLOR_TEXT, COLOR_OVERLAY);
    }

    fn compose_help(&mut self) {
        let (_, h) = self.board_extent();
        let help = " Arrows/WASD: Steer  Enter/R: Restart  Esc/Q: Quit";
        self.front.put_str(BOARD_X, BOARD_Y + h + 1, help, Color::DarkGrey, Cell::BASE_BG);
    }
}

/// Letters of the title visible `since` the crash.
fn revealed_letters(since: Duration, total: usize) -> usize {
    let steps = since.as_millis() / REVEAL_STEP.as_millis() + 1;
    (steps as usize).min(total)
}

impl Presenter for Renderer {
    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.snapshot = Some(snapshot.clone());
    }

    fn on_food_eaten(&mut self) {
        self.flash = Some((FlashKind::Eat, Instant::now()));
    }

    fn on_collision(&mut self, _kind: CollisionKind) {
        let now = Instant::now();
        self.flash = Some((FlashKind::Crash, now));
        self.died_at = Some(now);
    }

    fn on_restart(&mut self) {
        self.flash = None;
        self.died_at = None;
    }
}
