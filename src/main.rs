/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use config::GameConfig;
use sim::event::{dispatch, GameEvent};
use sim::scheduler::TickScheduler;
use sim::step;
use sim::world::{GameState, InputOutcome};
use ui::gamepad::GamepadState;
use ui::input::{Action, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;
use ui::Frontend;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = match GameConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error ({e}), using defaults");
            GameConfig::default()
        }
    };

    if let Err(e) = logging::init(config.log_file.as_deref()) {
        eprintln!("Log file unavailable: {e}");
    }

    let mut state = GameState::new(config.grid.clone(), config.speed.clone(), config.seed);

    let mut renderer = Renderer::new(config.grid.clone());
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new(&config.sound);
    let mut frontend = Frontend::new(renderer, sound);

    let result = game_loop(&mut state, &mut frontend, &config);

    if let Err(e) = frontend.renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    info!(score = state.score, "session ended");
    println!();
    println!("Thanks for playing Grid Snake!");
    println!("Final Score: {}", state.score);
}

fn game_loop(
    state: &mut GameState,
    frontend: &mut Frontend,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut scheduler = TickScheduler::new(state.interval);
    scheduler.reschedule(state.interval, Instant::now());
    dispatch(frontend, &[], &state.snapshot());

    loop {
        kb.drain_events();
        gp.update();
        frontend.renderer.gamepad_connected = gp.connected;

        let now = Instant::now();
        let actions = kb.actions().iter().chain(gp.actions()).copied();
        for action in actions {
            if !apply_action(state, &mut scheduler, frontend, action, now) {
                return Ok(());
            }
        }

        if let Some(events) = step::drive(state, &mut scheduler, now) {
            dispatch(frontend, &events, &state.snapshot());
        }

        if let Err(e) = frontend.renderer.render(now) {
            warn!("render failed: {e}");
        }

        let sleep = scheduler.until_next(Instant::now()).map_or(FRAME_SLEEP, |d| d.min(FRAME_SLEEP));
        std::thread::sleep(sleep);
    }
}

/// Feed one player action into the engine. Returns false to quit.
fn apply_action(
    state: &mut GameState,
    scheduler: &mut TickScheduler,
    frontend: &mut Frontend,
    action: Action,
    now: Instant,
) -> bool {
    let events = match action {
        Action::Quit => return false,
        Action::Steer(dir) => match state.request_direction(dir, now) {
            InputOutcome::Restarted => vec![GameEvent::Restarted],
            _ => vec![],
        },
        Action::Restart => state.restart_events(now),
    };

    if !events.is_empty() {
        step::retime(scheduler, &events, state.interval, now);
        dispatch(frontend, &events, &state.snapshot());
    } else if state.phase.is_dead() {
        debug!(remaining = ?state.cooldown_remaining(now), "restart ignored");
    }
    true
}
