pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;

use crate::domain::snake::CollisionKind;
use crate::sim::event::Presenter;
use crate::sim::world::Snapshot;

use renderer::Renderer;
use sound::SoundEngine;

/// Terminal frontend: the renderer plus optional sound, behind one `Presenter`.
pub struct Frontend {
    pub renderer: Renderer,
    sound: Option<SoundEngine>,
}

impl Frontend {
    pub fn new(renderer: Renderer, sound: Option<SoundEngine>) -> Self {
        Frontend { renderer, sound }
    }
}

impl Presenter for Frontend {
    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.renderer.on_snapshot(snapshot);
    }

    fn on_food_eaten(&mut self) {
        self.renderer.on_food_eaten();
        if let Some(sfx) = self.sound.as_mut() {
            sfx.play_eat();
        }
    }

    fn on_collision(&mut self, kind: CollisionKind) {
        self.renderer.on_collision(kind);
        if let Some(sfx) = self.sound.as_mut() {
            sfx.play_crash();
        }
    }

    fn on_restart(&mut self) {
        self.renderer.on_restart();
    }
}
