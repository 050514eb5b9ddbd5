/// GameState: the complete state of one running game session.
///
/// ## Life-cycle
///
///   - `Playing`: entered by `new` / `reset`, ticks advance the snake.
///   - `Dead`:    entered on any collision. Ticks are no-ops and
///                 direction input is read as a restart request.
///                 Restart is honored only once `restart_unlock_at` passes.
///
/// Everything scoped to a session (snake, heading, food, score, interval,
/// pending input, phase) is rebuilt together by `reset`. The grid, speed
/// settings and RNG outlive sessions.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::SpeedConfig;
use crate::domain::food;
use crate::domain::grid::{Cell, Grid};
use crate::domain::snake::{CollisionKind, Direction, Snake};
use super::event::GameEvent;
use super::input_buffer::InputBuffer;

/// Marker for "no food on the board": off-board, so the head can never reach it.
pub const NO_FOOD: Cell = Cell::new(-1, -1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Dead { restart_unlock_at: Instant },
}

impl Phase {
    pub fn is_dead(self) -> bool {
        matches!(self, Phase::Dead { .. })
    }
}

/// What a player input turned into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputOutcome {
    /// Direction latched for the next tick.
    Buffered,
    /// Reversal dropped.
    Dropped,
    /// A new game started.
    Restarted,
    /// Restart asked for while playing or still cooling down.
    Ignored,
}

/// Read-only view handed to presentation once per tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub snake: Vec<Cell>,
    pub food: Cell,
    pub score: u32,
    pub phase: Phase,
    pub interval: Duration,
    #[allow(dead_code)]
    pub tick: u64,
}

pub struct GameState {
    // ── Fixed for the whole run ──
    pub grid: Grid,
    pub speed: SpeedConfig,
    pub(super) rng: StdRng,

    // ── Session ──
    pub snake: Snake,
    pub direction: Direction,
    pub food: Cell,
    pub score: u32,
    pub interval: Duration,
    pub phase: Phase,
    pub input: InputBuffer,
    pub tick: u64,
    #[allow(dead_code)]
    pub last_collision: Option<CollisionKind>,
}

// ── Construction ──

impl GameState {
    /// New game. `seed == 0` draws a seed from the OS.
    pub fn new(grid: Grid, speed: SpeedConfig, seed: u64) -> Self {
        let seed = if seed == 0 { rand::rng().random() } else { seed };
        let mut rng = StdRng::seed_from_u64(seed);
        let snake = Snake::starting();
        let food = food::spawn(&grid, &snake, &mut rng).unwrap_or(NO_FOOD);
        let interval = speed.base_interval();

        info!(seed, width = grid.width, height = grid.height, "new game");

        GameState {
            grid,
            speed,
            rng,
            snake,
            direction: Direction::Right,
            food,
            score: 0,
            interval,
            phase: Phase::Playing,
            input: InputBuffer::new(),
            tick: 0,
            last_collision: None,
        }
    }

    /// Throw the session away and start over.
    pub fn reset(&mut self) {
        let snake = Snake::starting();
        let food = food::spawn(&self.grid, &snake, &mut self.rng).unwrap_or(NO_FOOD);

        self.snake = snake;
        self.direction = Direction::Right;
        self.food = food;
        self.score = 0;
        self.interval = self.speed.base_interval();
        self.phase = Phase::Playing;
        self.input.clear();
        self.tick = 0;
        self.last_collision = None;

        info!("game reset");
    }
}

// ── Inputs ──

impl GameState {
    /// Steer. While dead this is a restart request instead.
    pub fn request_direction(&mut self, dir: Direction, now: Instant) -> InputOutcome {
        if self.phase.is_dead() {
            return self.request_restart(now);
        }
        if self.input.set_pending(dir, self.direction) {
            InputOutcome::Buffered
        } else {
            InputOutcome::Dropped
        }
    }

    /// Start a new game if dead and the cooldown has passed.
    pub fn request_restart(&mut self, now: Instant) -> InputOutcome {
        match self.phase {
            Phase::Dead { restart_unlock_at } if now >= restart_unlock_at => {
                self.reset();
                InputOutcome::Restarted
            }
            _ => InputOutcome::Ignored,
        }
    }

    /// `request_restart` plus the event the driver routes to presentation.
    pub fn restart_events(&mut self, now: Instant) -> Vec<GameEvent> {
        match self.request_restart(now) {
            InputOutcome::Restarted => vec![GameEvent::Restarted],
            _ => vec![],
        }
    }
}

// ── Queries ──

impl GameState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            snake: self.snake.to_vec(),
            food: self.food,
            score: self.score,
            phase: self.phase,
            interval: self.interval,
            tick: self.tick,
        }
    }

    /// Time left before a restart is accepted (zero when allowed or playing).
    pub fn cooldown_remaining(&self, now: Instant) -> Duration {
        match self.phase {
            Phase::Dead { restart_unlock_at } => restart_unlock_at.saturating_duration_since(now),
            Phase::Playing => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> GameState {
        GameState::new(Grid::default(), SpeedConfig::default(), 11)
    }

    #[test]
    fn fresh_game_layout() {
        let g = game();
        assert_eq!(g.snake.to_vec(), vec![Cell::new(8, 10), Cell::new(7, 10), Cell::new(6, 10)]);
        assert_eq!(g.direction, Direction::Right);
        assert_eq!(g.score, 0);
        assert_eq!(g.interval, Duration::from_millis(150));
        assert_eq!(g.phase, Phase::Playing);
        assert!(g.grid.in_spawn_band(g.food));
        assert!(!g.snake.occupies(g.food));
    }

    #[test]
    fn steering_while_playing_uses_buffer() {
        let mut g = game();
        let now = Instant::now();
        assert_eq!(g.request_direction(Direction::Left, now), InputOutcome::Dropped);
        assert_eq!(g.request_direction(Direction::Up, now), InputOutcome::Buffered);
        assert_eq!(g.input.pending(), Some(Direction::Up));
    }

    #[test]
    fn restart_while_playing_is_ignored() {
        let mut g = game();
        g.score = 4;
        assert_eq!(g.request_restart(Instant::now()), InputOutcome::Ignored);
        assert_eq!(g.score, 4);
    }

    #[test]
    fn cooldown_gates_restart() {
        let mut g = game();
        let t0 = Instant::now();
        let unlock = t0 + Duration::from_millis(1000);
        g.phase = Phase::Dead { restart_unlock_at: unlock };
        g.score = 7;
        let body = g.snake.clone();

        assert_eq!(g.request_restart(t0 + Duration::from_millis(999)), InputOutcome::Ignored);
        assert!(g.phase.is_dead());
        assert_eq!(g.score, 7);
        assert_eq!(g.snake, body);
        assert_eq!(g.cooldown_remaining(t0), Duration::from_millis(1000));

        assert_eq!(g.request_restart(unlock), InputOutcome::Restarted);
        assert_eq!(g.phase, Phase::Playing);
        assert_eq!(g.score, 0);
        assert_eq!(g.cooldown_remaining(unlock), Duration::ZERO);
    }

    #[test]
    fn direction_while_dead_means_restart() {
        let mut g = game();
        let t0 = Instant::now();
        g.phase = Phase::Dead { restart_unlock_at: t0 };
        g.direction = Direction::Up;
        g.interval = Duration::from_millis(90);

        assert_eq!(g.request_direction(Direction::Left, t0), InputOutcome::Restarted);
        assert_eq!(g.direction, Direction::Right);
        assert_eq!(g.interval, Duration::from_millis(150));
        assert_eq!(g.input.pending(), None, "restart input is not also a steer");
    }

    #[test]
    fn restart_events_only_on_success() {
        let mut g = game();
        let t0 = Instant::now();
        g.phase = Phase::Dead { restart_unlock_at: t0 + Duration::from_secs(1) };
        assert!(g.restart_events(t0).is_empty());
        assert_eq!(g.restart_events(t0 + Duration::from_secs(1)), vec![GameEvent::Restarted]);
    }

    #[test]
    fn snapshot_mirrors_state() {
        let g = game();
        let s = g.snapshot();
        assert_eq!(s.snake, g.snake.to_vec());
        assert_eq!(s.food, g.food);
        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(s.interval, g.interval);
    }
}
