//! Thirteenth Guy entry point
//!
//! On the web the library's `WebRace` bindings are the entry point. Natively this
//! runs a headless championship with the player's character on autopilot and
//! logs the standings after every round.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Thirteenth Guy (native) starting...");

    if let Err(e) = headless::run() {
        log::error!("Championship aborted: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is WebRace, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use thirteenth_guy::LevelError;
    use thirteenth_guy::consts::FRAME_DT;
    use thirteenth_guy::settings::RaceSettings;
    use thirteenth_guy::sim::{Ai, Championship, Level, SimEvent, TickInput, roster, tick};
    use thirteenth_guy::tracks::championship_tracks;

    /// Ten minutes of race time per round at most
    const MAX_TICKS: usize = 36_000;

    pub fn run() -> Result<(), LevelError> {
        let settings = RaceSettings::load();
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let contestants = roster(settings.ai_count, &mut rng);
        let mut championship = Championship::new(&championship_tracks(), contestants, settings);

        while !championship.is_over() {
            let mut level = championship.start_round()?;
            race(&mut level, &mut rng);

            let outcome = championship.finish_round(&level);
            log::info!(
                "Round {}: {:?}, standings {:?}",
                outcome.round + 1,
                outcome.state,
                outcome.standings
            );
        }

        log::info!(
            "Championship over after {} rounds, {} contestants left",
            championship.round(),
            championship.contestants().len()
        );
        Ok(())
    }

    /// Run one race to its end, steering the player with an AI of its own
    fn race(level: &mut Level, rng: &mut Pcg32) {
        let mut autopilot = Ai::new();
        let mut collisions = 0usize;

        for _ in 0..MAX_TICKS {
            let movement = match level.human() {
                Some(human) if human.is_active() && !human.is_falling() => {
                    autopilot.movement(human.area(), human.velocity, &level.track, rng)
                }
                _ => {
                    autopilot.reset();
                    glam::Vec2::ZERO
                }
            };
            tick(level, &TickInput::new(movement), FRAME_DT);

            for event in level.drain_events() {
                match event {
                    SimEvent::Collision { .. } => collisions += 1,
                    SimEvent::StateChanged(state) => log::info!("Player: {state:?}"),
                    _ => {}
                }
            }
            if level.state().is_terminal() {
                break;
            }
        }

        log::debug!("{collisions} collisions at {:.0} ms", level.time());
    }
}
