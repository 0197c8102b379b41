//! Per-frame race update
//!
//! Every stage runs for the whole field before the next begins:
//! track, intents, collisions, movement, evaluation.

use glam::Vec2;

use super::character::{Character, Controller};
use super::level::{Level, RaceState, SimEvent};
use super::physics::{collide_characters, collide_with_obstacle, movement_velocity};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Player's movement intent: unit length or zero
    pub movement: Vec2,
}

impl TickInput {
    pub fn new(movement: Vec2) -> Self {
        Self { movement }
    }
}

/// Advance the race by `dt` ms (clamped to the configured maximum)
pub fn tick(level: &mut Level, input: &TickInput, dt: f32) {
    if level.state.is_terminal() {
        return;
    }
    let dt = if dt.is_finite() {
        dt.clamp(0.0, level.settings.max_frame_dt)
    } else {
        0.0
    };
    level.time += dt;
    let t = level.time;

    level.track.update(t, dt, &mut level.characters);

    resolve_intents(level, sanitize(input.movement), t, dt);
    resolve_collisions(level);

    for c in level.characters.iter_mut() {
        if !c.is_active() {
            c.freeze();
        } else if !c.is_falling() {
            c.x += c.velocity.x * dt;
            c.y += c.velocity.y * dt;
        }
    }

    evaluate(level);
}

/// Unit length or zero; garbage from outside counts as no input
fn sanitize(movement: Vec2) -> Vec2 {
    if !movement.is_finite() {
        Vec2::ZERO
    } else if movement.length_squared() > 1.0 {
        movement.normalize()
    } else {
        movement
    }
}

fn resolve_intents(level: &mut Level, human_intent: Vec2, t: f32, dt: f32) {
    let pool = level.characters.len();
    let policy = level.settings.elimination;
    let cutoff = policy.cutoff_rank(pool);
    let can_eliminate = policy.is_active(pool);
    let fall_timeout = level.settings.fall_timeout_ms;

    for i in 0..level.characters.len() {
        let c = &level.characters[i];
        if !c.is_active() {
            continue;
        }

        if let Some(fall_start) = c.fall_start_time {
            if t - fall_start > fall_timeout {
                if can_eliminate && c.rank >= cutoff {
                    eliminate(level, i);
                } else {
                    respawn(level, i);
                }
            }
            continue;
        }

        let Level {
            track,
            characters,
            rng,
            events,
            ..
        } = level;
        let c = &mut characters[i];
        let area = c.area();
        let range = track.between(area.top(), area.bottom());

        if track.is_on_platform(range, &area) {
            let velocity = c.velocity;
            let intent = match &mut c.controller {
                Controller::Human => human_intent,
                Controller::Autonomous(ai) => ai.movement(area, velocity, track, rng),
            };
            c.set_direction(intent);
            c.velocity = movement_velocity(c.velocity, intent, dt);
        } else {
            c.fall_start_time = Some(t);
            c.freeze();
            events.push(SimEvent::Fell { id: c.id });
        }
    }
}

fn eliminate(level: &mut Level, i: usize) {
    let c = &mut level.characters[i];
    c.eliminated = true;
    c.freeze();
    log::debug!("Character {} eliminated at rank {}", c.id, c.rank);
    level.events.push(SimEvent::Eliminated {
        id: c.id,
        rank: c.rank,
    });
}

/// Put a fallen character back at its latest checkpoint; stays falling if there
/// is no room this tick
fn respawn(level: &mut Level, i: usize) {
    let occupied: Vec<_> = level
        .characters
        .iter()
        .enumerate()
        .filter(|(j, o)| *j != i && o.is_active() && !o.is_falling())
        .map(|(_, o)| o.area())
        .collect();

    let c = &level.characters[i];
    let checkpoint = c.latest_checkpoint_index;
    let element = level.track.checkpoint(checkpoint);

    if let Some(position) = element.find_empty_spot(c.dimensions(), &occupied, &mut level.rng) {
        let c = &mut level.characters[i];
        c.drop_to(position);
        log::debug!("Character {} respawned at checkpoint {}", c.id, checkpoint);
        level.events.push(SimEvent::Respawned {
            id: c.id,
            checkpoint,
        });
    }
}

fn is_moving(c: &Character) -> bool {
    c.is_active() && !c.is_falling()
}

fn resolve_collisions(level: &mut Level) {
    let listener = level.human().map(Character::center).unwrap_or(Vec2::ZERO);
    let Level {
        track,
        characters,
        events,
        ..
    } = level;

    for j in 1..characters.len() {
        let (head, tail) = characters.split_at_mut(j);
        let b = &mut tail[0];
        if !is_moving(b) {
            continue;
        }
        for a in head.iter_mut().filter(|a| is_moving(a)) {
            let (area_a, area_b) = (a.area(), b.area());
            if let Some(hit) =
                collide_characters(&area_a, &mut a.velocity, &area_b, &mut b.velocity)
            {
                events.push(SimEvent::Collision {
                    volume: hit.volume(listener),
                });
            }
        }
    }

    for c in characters.iter_mut().filter(|c| is_moving(c)) {
        let area = c.area();
        let range = track.between(area.top(), area.bottom());
        for ei in range.iter() {
            for obstacle in &track.get(ei).obstacles {
                if let Some(hit) = collide_with_obstacle(&area, &mut c.velocity, &obstacle.area) {
                    events.push(SimEvent::Collision {
                        volume: hit.volume(listener),
                    });
                }
            }
        }
    }
}

fn evaluate(level: &mut Level) {
    let finish_y = level.track.finish_y;
    let mut newly_finished = Vec::new();

    for c in level.characters.iter_mut() {
        if !is_moving(c) {
            continue;
        }
        let area = c.area();

        let checkpoint = level.track.find_latest_checkpoint(area.bottom());
        c.latest_checkpoint_index = c.latest_checkpoint_index.max(checkpoint);

        if area.bottom() < finish_y {
            c.finished = true;
            c.finish_order = Some(level.finished_count);
            level.finished_count += 1;
            c.freeze();
            newly_finished.push(c.id);
        }
    }

    level.recompute_ranks();

    for id in newly_finished {
        if let Some(c) = level.character(id) {
            log::debug!("Character {} finished at rank {}", id, c.rank);
            let rank = c.rank;
            level.events.push(SimEvent::Finished { id, rank });
        }
    }

    // Enough finishers: the rest are out
    let pool = level.characters.len();
    let policy = level.settings.elimination;
    if policy.is_active(pool) && level.finished_count + 1 >= policy.cutoff_rank(pool) {
        let out: Vec<usize> = (0..pool)
            .filter(|&i| level.characters[i].is_active())
            .collect();
        if !out.is_empty() {
            for i in out {
                eliminate(level, i);
            }
            level.recompute_ranks();
        }
    }

    let next = match level.human() {
        Some(h) if h.finished => RaceState::Finished,
        Some(h) if h.eliminated => RaceState::GameOver,
        _ => RaceState::Running,
    };
    if next != level.state {
        log::info!("Race state {:?} -> {:?} at {:.0} ms", level.state, next, level.time);
        level.state = next;
        level.events.push(SimEvent::StateChanged(next));
    }
}
