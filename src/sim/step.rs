/// The step function: advances the game by one tick.
///
/// Processing order:
///   1. Consume the buffered direction
///   2. Dead → nothing else happens
///   3. Move the snake
///   4. Collision → Dead, restart cooldown starts
///   5. Growth → score, new food, faster interval
///
/// The caller hands the snapshot to presentation after every tick,
/// whichever branch ran.
///
/// `drive` and `retime` keep the `TickScheduler` in step with the events:
/// a speed change re-arms at the new interval, a collision disarms, a
/// restart re-arms at the base interval.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::domain::food;
use crate::domain::snake::StepOutcome;
use super::event::GameEvent;
use super::scheduler::TickScheduler;
use super::world::{GameState, Phase, NO_FOOD};

/// Run one tick if the scheduler is due, then retime it from the events.
/// `None` when no tick fired.
pub fn drive(state: &mut GameState, scheduler: &mut TickScheduler, now: Instant) -> Option<Vec<GameEvent>> {
    if !scheduler.fire(now) {
        return None;
    }
    let events = tick(state, now);
    retime(scheduler, &events, state.interval, now);
    Some(events)
}

/// Apply the scheduling side of `events`. `interval` is the state's current one.
pub fn retime(scheduler: &mut TickScheduler, events: &[GameEvent], interval: Duration, now: Instant) {
    for event in events {
        match event {
            GameEvent::SpeedChanged { interval } => scheduler.reschedule(*interval, now),
            GameEvent::Collision { .. } => scheduler.cancel(),
            GameEvent::Restarted => scheduler.reschedule(interval, now),
            GameEvent::FoodEaten { .. } => {}
        }
    }
    if !events.is_empty() && scheduler.is_armed() {
        debug!(interval_ms = scheduler.interval().as_millis() as u64, "tick scheduled");
    }
}

pub fn tick(state: &mut GameState, now: Instant) -> Vec<GameEvent> {
    state.direction = state.input.consume(state.direction);

    if state.phase.is_dead() {
        return vec![];
    }

    state.tick += 1;
    let mut events = Vec::new();

    match state.snake.step(state.direction, state.food, &state.grid) {
        StepOutcome::Moved => {}
        StepOutcome::Grew => resolve_food(state, &mut events),
        StepOutcome::Collided(kind) => {
            let at = state.snake.next_head(state.direction);
            state.phase = Phase::Dead {
                restart_unlock_at: now + state.speed.restart_cooldown(),
            };
            state.last_collision = Some(kind);
            info!(?kind, score = state.score, length = state.snake.len(), "snake died");
            events.push(GameEvent::Collision { kind, at });
        }
    }

    events
}

fn resolve_food(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let at = state.food;
    state.score += 1;
    events.push(GameEvent::FoodEaten { at, score: state.score });

    state.food = food::spawn(&state.grid, &state.snake, &mut state.rng).unwrap_or(NO_FOOD);
    debug_assert!(state.food == NO_FOOD || state.grid.in_spawn_band(state.food));
    debug!(food = ?state.food, score = state.score, "food respawned");

    state.interval = next_interval(
        state.interval,
        state.speed.ramp_factor,
        state.speed.min_interval(),
    );
    debug!(interval_ms = state.interval.as_millis() as u64, "speed up");
    events.push(GameEvent::SpeedChanged { interval: state.interval });
}

/// `max(min, round(prev * factor))` in whole milliseconds.
pub fn next_interval(prev: Duration, factor: f64, min: Duration) -> Duration {
    let scaled = (prev.as_millis() as f64 * factor).round() as u64;
    Duration::from_millis(scaled).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::config::SpeedConfig;
    use crate::domain::grid::{Cell, Grid};
    use crate::domain::snake::{CollisionKind, Direction, Snake};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn game() -> GameState {
        GameState::new(Grid::default(), SpeedConfig::default(), 99)
    }

    fn body(state: &GameState) -> Vec<(i32, i32)> {
        state.snake.cells().map(|c| (c.col, c.row)).collect()
    }

    // ── Speed ramp ──

    #[test]
    fn ramp_rounds_then_floors() {
        assert_eq!(next_interval(ms(150), 0.95, ms(70)), ms(143));
        assert_eq!(next_interval(ms(143), 0.95, ms(70)), ms(136));
        assert_eq!(next_interval(ms(73), 0.95, ms(70)), ms(70));
        assert_eq!(next_interval(ms(70), 0.95, ms(70)), ms(70));
    }

    #[test]
    fn ramp_is_monotonic_down_to_floor() {
        let mut iv = ms(150);
        for _ in 0..100 {
            let next = next_interval(iv, 0.95, ms(70));
            assert!(next <= iv);
            assert!(next >= ms(70));
            iv = next;
        }
        assert_eq!(iv, ms(70));
    }

    // ── Eating ──

    #[test]
    fn eating_scenario() {
        let mut g = game();
        g.food = Cell::new(9, 10);
        let events = tick(&mut g, Instant::now());

        assert_eq!(body(&g), vec![(9, 10), (8, 10), (7, 10), (6, 10)]);
        assert_eq!(g.score, 1);
        assert!(!g.snake.occupies(g.food));
        assert!(g.grid.in_spawn_band(g.food));
        assert_eq!(g.interval, ms(143));
        assert_eq!(
            events,
            vec![
                GameEvent::FoodEaten { at: Cell::new(9, 10), score: 1 },
                GameEvent::SpeedChanged { interval: ms(143) },
            ]
        );
    }

    #[test]
    fn plain_move_emits_nothing() {
        let mut g = game();
        g.food = Cell::new(20, 20);
        let events = tick(&mut g, Instant::now());
        assert!(events.is_empty());
        assert_eq!(body(&g), vec![(9, 10), (8, 10), (7, 10)]);
        assert_eq!(g.score, 0);
        assert_eq!(g.interval, ms(150));
    }

    // ── Input ──

    #[test]
    fn pending_direction_applies_on_next_tick_only() {
        let mut g = game();
        g.food = Cell::new(20, 20);
        let now = Instant::now();
        g.request_direction(Direction::Up, now);
        tick(&mut g, now);
        assert_eq!(g.snake.head(), Cell::new(8, 9));
        assert_eq!(g.input.pending(), None);
        tick(&mut g, now);
        assert_eq!(g.snake.head(), Cell::new(8, 8));
    }

    #[test]
    fn reversal_request_never_turns_snake() {
        let mut g = game();
        g.food = Cell::new(20, 20);
        let now = Instant::now();
        g.request_direction(Direction::Left, now);
        let events = tick(&mut g, now);
        assert_eq!(g.direction, Direction::Right);
        assert!(events.is_empty());
    }

    #[test]
    fn quick_turn_cannot_fold_back_within_one_tick() {
        // Moving Right: Up then Left before the tick. Left reverses the
        // effective heading (Right), so it is dropped and Up survives.
        let mut g = game();
        g.food = Cell::new(20, 20);
        let now = Instant::now();
        g.request_direction(Direction::Up, now);
        g.request_direction(Direction::Left, now);
        tick(&mut g, now);
        assert_eq!(g.direction, Direction::Up);
        assert!(!g.phase.is_dead());
    }

    // ── Collisions ──

    #[test]
    fn wall_exit_kills_with_cooldown() {
        let mut g = game();
        g.snake = Snake::from_cells([Cell::new(24, 5), Cell::new(23, 5), Cell::new(22, 5)]);
        g.food = Cell::new(3, 20);
        let t0 = Instant::now();
        let events = tick(&mut g, t0);

        assert_eq!(g.phase, Phase::Dead { restart_unlock_at: t0 + ms(1000) });
        assert_eq!(g.last_collision, Some(CollisionKind::Wall));
        assert_eq!(events, vec![GameEvent::Collision { kind: CollisionKind::Wall, at: Cell::new(25, 5) }]);
        assert_eq!(body(&g), vec![(24, 5), (23, 5), (22, 5)]);
    }

    #[test]
    fn self_hit_kills() {
        let mut g = game();
        g.snake = Snake::from_cells([
            Cell::new(5, 5), Cell::new(6, 5), Cell::new(6, 6), Cell::new(5, 6), Cell::new(4, 6),
        ]);
        g.direction = Direction::Left;
        g.food = Cell::new(20, 20);
        let now = Instant::now();
        g.request_direction(Direction::Down, now);
        let events = tick(&mut g, now);
        assert!(g.phase.is_dead());
        assert_eq!(events, vec![GameEvent::Collision { kind: CollisionKind::SelfHit, at: Cell::new(5, 6) }]);
    }

    #[test]
    fn dead_ticks_are_inert() {
        let mut g = game();
        let t0 = Instant::now();
        g.phase = Phase::Dead { restart_unlock_at: t0 };
        let before = g.snapshot();
        assert!(tick(&mut g, t0).is_empty());
        assert_eq!(g.snapshot(), before);
    }

    #[test]
    fn restart_after_death_resets_everything() {
        let mut g = game();
        g.food = Cell::new(9, 10);
        let t0 = Instant::now();
        tick(&mut g, t0);
        g.snake = Snake::from_cells([Cell::new(24, 5), Cell::new(23, 5)]);
        tick(&mut g, t0);
        assert!(g.phase.is_dead());

        assert!(g.restart_events(t0 + ms(500)).is_empty());
        assert_eq!(g.score, 1);

        assert_eq!(g.restart_events(t0 + ms(1000)), vec![GameEvent::Restarted]);
        assert_eq!(body(&g), vec![(8, 10), (7, 10), (6, 10)]);
        assert_eq!(g.score, 0);
        assert_eq!(g.interval, ms(150));
        assert_eq!(g.phase, Phase::Playing);
    }

    // ── Invariants over a long run ──

    #[test]
    fn long_run_keeps_body_unique_and_food_free() {
        let mut g = game();
        let now = Instant::now();
        // Sweep a lawnmower path through the band so plenty of food gets eaten.
        let mut prev_len = g.snake.len();
        let mut prev_score = g.score;
        for i in 0..400 {
            if g.phase.is_dead() {
                break;
            }
            let head = g.snake.head();
            let want = match g.direction {
                Direction::Right if head.col == 23 => Some(Direction::Down),
                Direction::Left if head.col == 1 => Some(Direction::Down),
                Direction::Down if head.col >= 23 => Some(Direction::Left),
                Direction::Down => Some(Direction::Right),
                _ => None,
            };
            if let Some(dir) = want {
                g.request_direction(dir, now);
            }
            let events = tick(&mut g, now);

            let set: HashSet<_> = g.snake.cells().collect();
            assert_eq!(set.len(), g.snake.len(), "tick {i}");
            if !g.phase.is_dead() {
                assert!(!g.snake.occupies(g.food));
                assert!(g.food.row >= g.grid.reserved_top_rows);
            }
            assert!(g.snake.len() >= prev_len);
            if events.iter().any(|e| matches!(e, GameEvent::FoodEaten { .. })) {
                assert_eq!(g.score, prev_score + 1);
                assert_eq!(g.snake.len(), prev_len + 1);
            }
            prev_len = g.snake.len();
            prev_score = g.score;
        }
    }

    // ── Scheduling ──

    fn armed(state: &GameState, t0: Instant) -> TickScheduler {
        let mut s = TickScheduler::new(state.interval);
        s.reschedule(state.interval, t0);
        s
    }

    #[test]
    fn no_tick_before_deadline() {
        let mut g = game();
        let t0 = Instant::now();
        let mut s = armed(&g, t0);
        assert_eq!(drive(&mut g, &mut s, t0 + ms(149)), None);
        assert_eq!(g.tick, 0);
    }

    #[test]
    fn eating_rearms_at_the_faster_interval() {
        let mut g = game();
        g.food = Cell::new(9, 10);
        let t0 = Instant::now();
        let mut s = armed(&g, t0);

        let t1 = t0 + ms(150);
        let events = drive(&mut g, &mut s, t1).unwrap();
        assert!(events.contains(&GameEvent::SpeedChanged { interval: ms(143) }));
        assert_eq!(s.interval(), ms(143));
        // Next tick 143ms after the meal, not at the old fixed-rate t0+300.
        assert!(!s.due(t1 + ms(142)));
        assert!(s.due(t1 + ms(143)));
        assert!(drive(&mut g, &mut s, t1 + ms(143)).is_some());
    }

    #[test]
    fn plain_move_keeps_the_rate() {
        let mut g = game();
        g.food = Cell::new(20, 20);
        let t0 = Instant::now();
        let mut s = armed(&g, t0);
        assert_eq!(drive(&mut g, &mut s, t0 + ms(150)), Some(vec![]));
        assert!(!s.due(t0 + ms(299)));
        assert!(s.due(t0 + ms(300)));
    }

    #[test]
    fn collision_disarms_scheduler() {
        let mut g = game();
        g.snake = Snake::from_cells([Cell::new(24, 5), Cell::new(23, 5), Cell::new(22, 5)]);
        g.food = Cell::new(3, 20);
        let t0 = Instant::now();
        let mut s = armed(&g, t0);

        let events = drive(&mut g, &mut s, t0 + ms(150)).unwrap();
        assert!(matches!(events[..], [GameEvent::Collision { .. }]));
        assert!(!s.is_armed());
        assert_eq!(drive(&mut g, &mut s, t0 + ms(5000)), None);
    }

    #[test]
    fn restart_rearms_at_base_interval() {
        let mut g = game();
        g.food = Cell::new(9, 10);
        let t0 = Instant::now();
        let mut s = armed(&g, t0);
        drive(&mut g, &mut s, t0 + ms(150));
        g.snake = Snake::from_cells([Cell::new(24, 5), Cell::new(23, 5)]);
        drive(&mut g, &mut s, t0 + ms(293));
        assert!(g.phase.is_dead());
        assert!(!s.is_armed());

        let t2 = t0 + ms(2000);
        let events = g.restart_events(t2);
        retime(&mut s, &events, g.interval, t2);
        assert!(s.is_armed());
        assert_eq!(s.interval(), ms(150));
        assert!(!s.due(t2 + ms(149)));
        assert!(s.due(t2 + ms(150)));
    }

    #[test]
    fn ignored_restart_leaves_scheduler_disarmed() {
        let mut s = TickScheduler::new(ms(150));
        retime(&mut s, &[], ms(150), Instant::now());
        assert!(!s.is_armed());
    }
}
