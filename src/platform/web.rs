//! Browser bindings
//!
//! JavaScript owns the canvas, the keyboard and the audio; it calls `update` once
//! per animation frame and draws from the JSON snapshots.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::prelude::*;

use super::InputIntent;
use crate::settings::RaceSettings;
use crate::sim::{Championship, Level, RaceState, TickInput, roster, tick};
use crate::tracks::championship_tracks;

/// Set up logging and panic reporting; safe to call more than once
fn init_console() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
}

#[wasm_bindgen]
pub struct WebRace {
    championship: Championship,
    level: Level,
}

#[wasm_bindgen]
impl WebRace {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<WebRace, JsError> {
        init_console();

        let settings = RaceSettings {
            seed,
            ..RaceSettings::load()
        };
        let mut rng = Pcg32::seed_from_u64(seed);
        let contestants = roster(settings.ai_count, &mut rng);
        let championship = Championship::new(&championship_tracks(), contestants, settings);
        let level = championship.start_round()?;

        log::info!("Thirteenth Guy starting, seed {seed}");
        Ok(WebRace {
            championship,
            level,
        })
    }

    /// A race seeded from the browser's RNG
    pub fn with_random_seed() -> Result<WebRace, JsError> {
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
        WebRace::new(seed)
    }

    /// Advance by `dt` ms with the player steering along (`dx`, `dy`)
    pub fn update(&mut self, dt: f32, dx: f32, dy: f32) {
        let input = TickInput::new(glam::Vec2::new(dx, dy));
        tick(&mut self.level, &input, dt);
    }

    /// Advance by `dt` ms from raw key state
    pub fn update_keys(&mut self, dt: f32, left: bool, right: bool, up: bool, down: bool) {
        let input = InputIntent::from_keys(left, right, up, down).tick_input();
        tick(&mut self.level, &input, dt);
    }

    pub fn state(&self) -> String {
        match self.level.state() {
            RaceState::Running => "running",
            RaceState::GameOver => "game-over",
            RaceState::Finished => "finished",
        }
        .to_string()
    }

    pub fn round(&self) -> usize {
        self.championship.round()
    }

    pub fn snapshot_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.level.snapshot())?)
    }

    /// Track elements to draw between `top` and `bottom` (world Y)
    pub fn visible_json(&self, top: f32, bottom: f32) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.level.visible_elements(top, bottom))?)
    }

    /// Events since the last call (collisions with volume, falls, finishes...)
    pub fn events_json(&mut self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.level.drain_events())?)
    }

    /// Close the current round and start the next; false when the championship is over
    pub fn next_round(&mut self) -> Result<bool, JsError> {
        self.championship.finish_round(&self.level);
        if self.championship.is_over() {
            return Ok(false);
        }
        self.level = self.championship.start_round()?;
        Ok(true)
    }
}
