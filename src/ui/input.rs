/// Keyboard input.
///
/// Drains every pending terminal event once per frame and reduces it to
/// edge-triggered actions. Steering is a one-shot press per key event, not a
/// held state: the engine only needs the latest direction per tick.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::snake::Direction;

/// One player intent read from the keyboard.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Steer(Direction),
    Restart,
    Quit,
}

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' '), KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Actions collected by the most recent `drain_events()`, in arrival order.
    actions: Vec<Action>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { actions: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before the tick check.
    pub fn drain_events(&mut self) {
        self.actions.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(action) = map_key(&key) {
                    self.actions.push(action);
                }
            }
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

/// Translate one key event. Releases are ignored.
pub fn map_key(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return Some(Action::Quit);
    }

    let code = key.code;
    if KEYS_UP.contains(&code) {
        Some(Action::Steer(Direction::Up))
    } else if KEYS_DOWN.contains(&code) {
        Some(Action::Steer(Direction::Down))
    } else if KEYS_LEFT.contains(&code) {
        Some(Action::Steer(Direction::Left))
    } else if KEYS_RIGHT.contains(&code) {
        Some(Action::Steer(Direction::Right))
    } else if KEYS_RESTART.contains(&code) {
        Some(Action::Restart)
    } else if KEYS_QUIT.contains(&code) {
        Some(Action::Quit)
    } else {
        None
    }
}
