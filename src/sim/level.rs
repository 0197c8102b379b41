//! One race: the track, the field of characters and the race outcome
//!
//! `Level` owns all mutable race state. The per-tick pipeline lives in
//! `sim::tick`; this module covers construction, ranking and the read-only views
//! handed to the presentation layer.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::character::{AnimationState, Character, Facing, HUMAN_ID};
use super::element::TrackElement;
use super::geom::{Area, includes, overlap};
use super::template::TrackTemplate;
use super::track::Track;
use crate::consts::*;
use crate::error::LevelError;
use crate::settings::RaceSettings;

/// Outcome of the race from the player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceState {
    Running,
    /// The player was eliminated
    GameOver,
    /// The player reached the finish
    Finished,
}

impl RaceState {
    pub fn is_terminal(self) -> bool {
        self != RaceState::Running
    }
}

/// A racer's identity, carried from round to round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contestant {
    pub id: u32,
    pub scale: f32,
}

/// Things that happened during a tick, for sound and UI cues
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SimEvent {
    /// Loudness is relative to the player
    Collision { volume: f32 },
    Fell { id: u32 },
    Respawned { id: u32, checkpoint: usize },
    Eliminated { id: u32, rank: usize },
    Finished { id: u32, rank: usize },
    StateChanged(RaceState),
}

#[derive(Debug, Clone)]
pub struct Level {
    pub track: Track,
    pub characters: Vec<Character>,
    pub(crate) state: RaceState,
    /// Simulation time (ms)
    pub(crate) time: f32,
    pub(crate) settings: RaceSettings,
    pub(crate) rng: Pcg32,
    pub(crate) finished_count: usize,
    pub(crate) events: Vec<SimEvent>,
}

impl Level {
    pub fn new(
        templates: &[TrackTemplate],
        roster: &[Contestant],
        settings: &RaceSettings,
    ) -> Result<Self, LevelError> {
        settings.validate()?;
        validate_roster(roster)?;

        let track = Track::new(templates, settings.start_y)?;
        let mut rng = Pcg32::seed_from_u64(settings.seed);

        let start = track.get(0);
        let mut characters: Vec<Character> = Vec::with_capacity(roster.len());
        let mut occupied: Vec<Area> = Vec::with_capacity(roster.len());

        for (i, contestant) in roster.iter().enumerate() {
            let mut character = Character::new(contestant.id, Vec2::ZERO, contestant.scale);
            let position = match start.find_empty_spot(character.dimensions(), &occupied, &mut rng) {
                Some(position) => position,
                None => {
                    log::warn!(
                        "No free start spot for character {}, using start slot {}",
                        contestant.id,
                        i
                    );
                    start_slot(start, &character, &occupied)
                }
            };
            character.x = position.x;
            character.y = position.y;
            occupied.push(character.area());
            characters.push(character);
        }

        log::info!(
            "Level created: {} elements, {} characters, seed {}",
            track.len(),
            characters.len(),
            settings.seed
        );

        let mut level = Self {
            track,
            characters,
            state: RaceState::Running,
            time: 0.0,
            settings: settings.clone(),
            rng,
            finished_count: 0,
            events: Vec::new(),
        };
        level.recompute_ranks();
        Ok(level)
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn settings(&self) -> &RaceSettings {
        &self.settings
    }

    /// First rank that is in danger in this race
    pub fn cutoff_rank(&self) -> usize {
        self.settings.elimination.cutoff_rank(self.characters.len())
    }

    pub fn human(&self) -> Option<&Character> {
        self.characters.iter().find(|c| c.is_human())
    }

    pub fn character(&self, id: u32) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Elements overlapping the visible Y span
    pub fn visible_elements(&self, top_y: f32, bottom_y: f32) -> &[TrackElement] {
        self.track.visible(top_y, bottom_y)
    }

    /// Reassign ranks: finishers by arrival, then the racers by distance to the
    /// finish, then the eliminated in the order they were ranked when knocked out.
    pub fn recompute_ranks(&mut self) {
        let mut finished: Vec<usize> = Vec::new();
        let mut racing: Vec<usize> = Vec::new();
        let mut eliminated: Vec<usize> = Vec::new();

        for (i, c) in self.characters.iter().enumerate() {
            if c.finished {
                finished.push(i);
            } else if c.eliminated {
                eliminated.push(i);
            } else {
                racing.push(i);
            }
        }

        let chars = &self.characters;
        finished.sort_by_key(|&i| (chars[i].finish_order, chars[i].id));
        racing.sort_by(|&a, &b| {
            chars[a]
                .y
                .total_cmp(&chars[b].y)
                .then(chars[a].id.cmp(&chars[b].id))
        });
        eliminated.sort_by_key(|&i| (chars[i].rank, chars[i].id));

        for (rank, i) in finished
            .into_iter()
            .chain(racing)
            .chain(eliminated)
            .enumerate()
        {
            self.characters[i].rank = rank + 1;
        }
    }

    /// Character ids from first to last place
    pub fn standings(&self) -> Vec<u32> {
        let mut order: Vec<&Character> = self.characters.iter().collect();
        order.sort_by_key(|c| c.rank);
        order.into_iter().map(|c| c.id).collect()
    }

    /// Everyone still in the championship after this race
    pub fn survivors(&self) -> Vec<Contestant> {
        self.characters
            .iter()
            .filter(|c| !c.eliminated)
            .map(|c| Contestant {
                id: c.id,
                scale: c.width / CHARACTER_SIZE,
            })
            .collect()
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            time: self.time,
            state: self.state,
            finish_y: self.track.finish_y,
            cutoff_rank: self.cutoff_rank(),
            characters: self.characters.iter().map(CharacterSnapshot::from).collect(),
        }
    }
}

fn validate_roster(roster: &[Contestant]) -> Result<(), LevelError> {
    if roster.is_empty() {
        return Err(LevelError::EmptyRoster);
    }
    if !roster.iter().any(|c| c.id == HUMAN_ID) {
        return Err(LevelError::NoHuman);
    }
    for (i, c) in roster.iter().enumerate() {
        if roster[..i].iter().any(|other| other.id == c.id) {
            return Err(LevelError::DuplicateId(c.id));
        }
    }
    Ok(())
}

/// Deterministic fallback placement: the first slot of a fixed grid over the
/// start element that sits on a surface and is clear of everyone placed so far.
/// Crowds the first walkable slot when the element is full.
fn start_slot(start: &TrackElement, character: &Character, occupied: &[Area]) -> Vec2 {
    let pitch = CHARACTER_SIZE * CHARACTER_MAX_SCALE * 1.5;
    let per_row = ((start.width / pitch).floor() as usize).max(1);
    let rows = ((start.height / pitch).floor() as usize).max(1);

    let mut first_walkable = None;
    for slot in 0..per_row * rows {
        let x = start.min_x + (slot % per_row) as f32 * pitch + pitch * 0.25;
        let y = start.y + (slot / per_row) as f32 * pitch + pitch * 0.25;
        let area = Area::new(x, y, character.width, character.height);

        if !start.surfaces.iter().any(|s| includes(&s.area, &area)) {
            continue;
        }
        if !occupied.iter().any(|o| overlap(o, &area)) {
            return Vec2::new(x, y);
        }
        first_walkable.get_or_insert(Vec2::new(x, y));
    }

    first_walkable.unwrap_or(Vec2::new(start.min_x, start.y))
}

/// What the renderer needs to draw one character
#[derive(Debug, Clone, Serialize)]
pub struct CharacterSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub facing: Facing,
    pub mirrored: bool,
    pub animation: AnimationState,
    pub rank: usize,
    pub finished: bool,
    pub eliminated: bool,
    pub human: bool,
}

impl From<&Character> for CharacterSnapshot {
    fn from(c: &Character) -> Self {
        Self {
            id: c.id,
            x: c.x,
            y: c.y,
            width: c.width,
            height: c.height,
            facing: c.facing(),
            mirrored: c.mirrored(),
            animation: c.animation(),
            rank: c.rank,
            finished: c.finished,
            eliminated: c.eliminated,
            human: c.is_human(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelSnapshot {
    pub time: f32,
    pub state: RaceState,
    pub finish_y: f32,
    pub cutoff_rank: usize,
    pub characters: Vec<CharacterSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use TrackTemplate as T;

    const COURSE: &[TrackTemplate] = &[T::Checkpoint, T::Basic, T::FullWidth, T::Finish];

    fn roster(n: u32) -> Vec<Contestant> {
        (0..n).map(|id| Contestant { id, scale: 1.0 }).collect()
    }

    #[test]
    fn test_rejects_bad_rosters() {
        let settings = RaceSettings::default();
        assert!(matches!(
            Level::new(COURSE, &[], &settings),
            Err(LevelError::EmptyRoster)
        ));
        assert!(matches!(
            Level::new(COURSE, &[Contestant { id: 4, scale: 1.0 }], &settings),
            Err(LevelError::NoHuman)
        ));
        let twice = [
            Contestant { id: 0, scale: 1.0 },
            Contestant { id: 2, scale: 1.0 },
            Contestant { id: 2, scale: 1.1 },
        ];
        assert!(matches!(
            Level::new(COURSE, &twice, &settings),
            Err(LevelError::DuplicateId(2))
        ));
        assert!(matches!(
            Level::new(&[T::Chasm, T::Finish], &roster(2), &settings),
            Err(LevelError::Track(TrackError::UnwalkableStart))
        ));
    }

    #[test]
    fn test_start_placement() {
        let level = Level::new(COURSE, &roster(20), &RaceSettings::default()).unwrap();
        let start = level.track.get(0);
        let areas: Vec<Area> = level.characters.iter().map(|c| c.area()).collect();

        for (i, a) in areas.iter().enumerate() {
            assert!(start.surfaces.iter().any(|s| includes(&s.area, a)));
            for b in &areas[i + 1..] {
                assert!(!overlap(a, b));
            }
        }
        assert_eq!(level.state(), RaceState::Running);
        assert!(level.human().is_some());
    }

    #[test]
    fn test_start_slot_fallback_is_on_surface() {
        let track = Track::new(&[T::DualPassage, T::Finish], 400.0).unwrap();
        let start = track.get(0);
        let c = Character::new(1, Vec2::ZERO, 1.15);
        let mut occupied = Vec::new();
        for _ in 0..6 {
            let p = start_slot(start, &c, &occupied);
            let area = Area::new(p.x, p.y, c.width, c.height);
            assert!(start.surfaces.iter().any(|s| includes(&s.area, &area)));
            assert!(!occupied.iter().any(|o| overlap(o, &area)));
            occupied.push(area);
        }
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let mut level = Level::new(COURSE, &roster(6), &RaceSettings::default()).unwrap();
        level.characters[3].finished = true;
        level.characters[3].finish_order = Some(0);
        level.characters[5].eliminated = true;
        // Same Y: id breaks the tie
        level.characters[1].y = 390.0;
        level.characters[2].y = 390.0;

        level.recompute_ranks();
        let first = level.standings();
        level.recompute_ranks();
        assert_eq!(level.standings(), first);

        assert_eq!(first[0], 3);
        assert_eq!(*first.last().unwrap(), 5);
        let pos = |id| first.iter().position(|&x| x == id).unwrap();
        assert!(pos(1) < pos(2));

        let mut ranks: Vec<usize> = level.characters.iter().map(|c| c.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=6).collect::<Vec<_>>());
    }

    #[test]
    fn test_snapshot_serializes() {
        let level = Level::new(COURSE, &roster(3), &RaceSettings::default()).unwrap();
        let snap = level.snapshot();
        assert_eq!(snap.characters.len(), 3);
        assert_eq!(snap.characters.iter().filter(|c| c.human).count(), 1);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"Running\""));
        assert_eq!(level.visible_elements(level.track.finish_y - ELEMENT_HEIGHT, 400.0).len(), 4);
    }

    #[test]
    fn test_survivors_keep_scale() {
        let roster = vec![
            Contestant { id: 0, scale: 0.95 },
            Contestant { id: 1, scale: 1.1 },
        ];
        let mut level = Level::new(COURSE, &roster, &RaceSettings::default()).unwrap();
        level.characters[1].eliminated = true;
        let survivors = level.survivors();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, 0);
        assert!((survivors[0].scale - 0.95).abs() < 1e-5);
    }
}
