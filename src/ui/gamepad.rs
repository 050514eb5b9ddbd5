/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Steer
///   Start / A             →  Restart
///   Select                →  Quit
///
/// Produces the same `Action`s as the keyboard, edge-triggered.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::snake::Direction;
use super::input::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East  => Some(Btn::B),
            Button::West  => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start  => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            restart: vec![Btn::Start, Btn::A],
            quit:    vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Stick direction last frame, for edge detection.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_dir: Option<Direction>,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    /// Actions collected by the most recent `update()`.
    actions: Vec<Action>,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    tracing::warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            stick_dir: None,
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            actions: Vec::with_capacity(4),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map.apply(cfg);
    }

    pub fn update(&mut self) {
        self.actions.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                    self.stick_dir = None;
                }
                _ => {}
            }
        }

        // Stick: fire once when it enters a new direction.
        let dir = stick_direction(self.stick_x, self.stick_y);
        if dir != self.stick_dir {
            if let Some(d) = dir {
                self.actions.push(Action::Steer(d));
            }
            self.stick_dir = dir;
        }
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        // D-pad handled separately (not in Btn enum)
        let steer = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(d) = steer {
            self.actions.push(Action::Steer(d));
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            if let Some(action) = self.action_map.action_for(btn) {
                self.actions.push(action);
            }
        }
    }
}

impl ActionMap {
    fn apply(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let rs = parse_list(&cfg.restart);
        if !rs.is_empty() { self.restart = rs; }
        let qt = parse_list(&cfg.quit);
        if !qt.is_empty() { self.quit = qt; }
    }

    /// Quit wins if a button is bound to both.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn action_for(&self, btn: Btn) -> Option<Action> {
        if self.quit.contains(&btn) {
            Some(Action::Quit)
        } else if self.restart.contains(&btn) {
            Some(Action::Restart)
        } else {
            None
        }
    }
}

/// Dominant stick axis past the deadzone. Stick Y is positive up.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
fn stick_direction(x: f32, y: f32) -> Option<Direction> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        return None;
    }
    if x.abs() >= y.abs() {
        Some(if x < 0.0 { Direction::Left } else { Direction::Right })
    } else {
        Some(if y > 0.0 { Direction::Up } else { Direction::Down })
    }
}
