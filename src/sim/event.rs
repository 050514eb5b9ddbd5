/// Events emitted during a simulation step, plus the presentation boundary.
/// The presentation layer consumes these for drawing and sound.

use std::time::Duration;

use crate::domain::grid::Cell;
use crate::domain::snake::CollisionKind;
use super::world::Snapshot;

#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    FoodEaten { at: Cell, score: u32 },
    /// Tick interval changed; the driver must reschedule.
    SpeedChanged { interval: Duration },
    Collision { kind: CollisionKind, at: Cell },
    Restarted,
}

/// Receives engine output. Every method defaults to doing nothing.
///
/// Implementations must not fail into the engine: anything that can go
/// wrong (audio device, terminal) is handled and swallowed on their side.
pub trait Presenter {
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}
    fn on_food_eaten(&mut self) {}
    fn on_collision(&mut self, _kind: CollisionKind) {}
    fn on_restart(&mut self) {}
}

/// Route one tick's events, then always hand over the snapshot.
pub fn dispatch<P: Presenter + ?Sized>(presenter: &mut P, events: &[GameEvent], snapshot: &Snapshot) {
    for event in events {
        match event {
            GameEvent::FoodEaten { .. } => presenter.on_food_eaten(),
            GameEvent::Collision { kind, .. } => presenter.on_collision(*kind),
            GameEvent::Restarted => presenter.on_restart(),
            GameEvent::SpeedChanged { .. } => {}
        }
    }
    presenter.on_snapshot(snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::Phase;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Presenter for Recorder {
        fn on_snapshot(&mut self, s: &Snapshot) {
            self.calls.push(format!("snapshot:{}", s.score));
        }
        fn on_food_eaten(&mut self) {
            self.calls.push("eat".into());
        }
        fn on_collision(&mut self, kind: CollisionKind) {
            self.calls.push(format!("crash:{kind:?}"));
        }
    }

    fn snapshot(score: u32) -> Snapshot {
        Snapshot {
            snake: vec![Cell::new(1, 1)],
            food: Cell::new(2, 2),
            score,
            phase: Phase::Playing,
            interval: Duration::from_millis(150),
            tick: 0,
        }
    }

    #[test]
    fn snapshot_comes_last_even_without_events() {
        let mut r = Recorder::default();
        dispatch(&mut r, &[], &snapshot(0));
        assert_eq!(r.calls, vec!["snapshot:0"]);
    }

    #[test]
    fn events_route_in_order() {
        let mut r = Recorder::default();
        let events = [
            GameEvent::FoodEaten { at: Cell::new(2, 2), score: 1 },
            GameEvent::SpeedChanged { interval: Duration::from_millis(143) },
            GameEvent::Collision { kind: CollisionKind::Wall, at: Cell::new(0, 0) },
        ];
        dispatch(&mut r, &events, &snapshot(1));
        assert_eq!(r.calls, vec!["eat", "crash:Wall", "snapshot:1"]);
    }
}
