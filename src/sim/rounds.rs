//! Championship: a series of races on progressively harder courses
//!
//! Each round is an independent `Level` built from the contestants that survived
//! the previous one. The player being eliminated ends the championship.

use rand::Rng;

use super::character::HUMAN_ID;
use super::level::{Contestant, Level, RaceState};
use super::template::TrackTemplate;
use crate::consts::{CHARACTER_MAX_SCALE, CHARACTER_MIN_SCALE};
use crate::error::LevelError;
use crate::random_min_max;
use crate::settings::{EliminationPolicy, RaceSettings};

/// The player plus `ai_count` computer racers with random sizes
pub fn roster<R: Rng + ?Sized>(ai_count: usize, rng: &mut R) -> Vec<Contestant> {
    (0..=ai_count as u32)
        .map(|id| Contestant {
            id,
            scale: if id == HUMAN_ID {
                1.0
            } else {
                random_min_max(rng, CHARACTER_MIN_SCALE, CHARACTER_MAX_SCALE)
            },
        })
        .collect()
}

/// Elimination policy for round `round` with `pool` contestants.
///
/// The configured policy applies while it can still knock anyone out; once the
/// field is smaller than its cutoff, the last third of the field is in danger.
pub fn policy_for_round(base: EliminationPolicy, round: usize, pool: usize) -> EliminationPolicy {
    if round == 0 || base.is_active(pool) {
        base
    } else {
        EliminationPolicy::LastPlaces((pool / 3).max(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub round: usize,
    pub state: RaceState,
    /// Ids from first to last place
    pub standings: Vec<u32>,
    pub eliminated: Vec<u32>,
    pub survivors: usize,
}

#[derive(Debug, Clone)]
pub struct Championship {
    courses: Vec<&'static [TrackTemplate]>,
    contestants: Vec<Contestant>,
    settings: RaceSettings,
    round: usize,
    human_out: bool,
}

impl Championship {
    pub fn new(
        courses: &[&'static [TrackTemplate]],
        contestants: Vec<Contestant>,
        settings: RaceSettings,
    ) -> Self {
        Self {
            courses: courses.to_vec(),
            contestants,
            settings,
            round: 0,
            human_out: false,
        }
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn contestants(&self) -> &[Contestant] {
        &self.contestants
    }

    pub fn is_over(&self) -> bool {
        self.human_out || self.round >= self.courses.len()
    }

    /// Level for the current round with everyone still in
    pub fn start_round(&self) -> Result<Level, LevelError> {
        if self.is_over() {
            return Err(LevelError::NoRoundsLeft);
        }
        let pool = self.contestants.len();
        let settings = RaceSettings {
            seed: self.settings.seed.wrapping_add(self.round as u64),
            elimination: policy_for_round(self.settings.elimination, self.round, pool),
            ..self.settings.clone()
        };
        log::info!(
            "Round {} starting: {} contestants, {:?}",
            self.round + 1,
            pool,
            settings.elimination
        );
        Level::new(self.courses[self.round], &self.contestants, &settings)
    }

    /// Record a finished (or abandoned) race and move on to the next course.
    ///
    /// A race stops as soon as the player is done, so anyone still running at or
    /// beyond the cutoff rank is out as well.
    pub fn finish_round(&mut self, level: &Level) -> RoundOutcome {
        let pool = level.characters.len();
        let cutoff = level.cutoff_rank();
        let cutoff_applies = cutoff <= pool;

        let eliminated: Vec<u32> = level
            .characters
            .iter()
            .filter(|c| c.eliminated || (cutoff_applies && !c.finished && c.rank >= cutoff))
            .map(|c| c.id)
            .collect();

        self.contestants = level
            .survivors()
            .into_iter()
            .filter(|c| !eliminated.contains(&c.id))
            .collect();
        self.human_out = !self.contestants.iter().any(|c| c.id == HUMAN_ID);

        let outcome = RoundOutcome {
            round: self.round,
            state: level.state(),
            standings: level.standings(),
            eliminated,
            survivors: self.contestants.len(),
        };
        self.round += 1;

        log::info!(
            "Round {} over: {} eliminated, {} left",
            outcome.round + 1,
            outcome.eliminated.len(),
            outcome.survivors
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::template::TrackTemplate as T;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const SHORT: &[TrackTemplate] = &[T::Checkpoint, T::FullWidth, T::Finish];

    #[test]
    fn test_roster() {
        let mut rng = Pcg32::seed_from_u64(1);
        let roster = roster(19, &mut rng);
        assert_eq!(roster.len(), 20);
        assert_eq!(roster[0].id, HUMAN_ID);
        assert!(roster.iter().all(|c| {
            c.scale >= CHARACTER_MIN_SCALE && c.scale <= CHARACTER_MAX_SCALE
        }));
    }

    #[test]
    fn test_policy_shrinks_with_pool() {
        let base = EliminationPolicy::Rank(13);
        assert_eq!(policy_for_round(base, 0, 20), base);
        assert_eq!(policy_for_round(base, 1, 13), base);
        assert_eq!(policy_for_round(base, 1, 12), EliminationPolicy::LastPlaces(4));
        assert_eq!(policy_for_round(base, 2, 2), EliminationPolicy::LastPlaces(1));
    }

    #[test]
    fn test_survivors_carry_over() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut championship = Championship::new(
            &[SHORT, SHORT],
            roster(5, &mut rng),
            RaceSettings::default(),
        );
        let mut level = championship.start_round().unwrap();
        level.characters[2].eliminated = true;
        level.characters[4].eliminated = true;
        let gone = [level.characters[2].id, level.characters[4].id];

        let outcome = championship.finish_round(&level);
        assert_eq!(outcome.survivors, 4);
        assert_eq!(outcome.eliminated, gone.to_vec());
        assert!(!championship.is_over());
        assert_eq!(championship.round(), 1);
        assert!(championship.contestants().iter().all(|c| !gone.contains(&c.id)));

        let next = championship.start_round().unwrap();
        assert_eq!(next.characters.len(), 4);
        let outcome = championship.finish_round(&next);
        assert_eq!(outcome.round, 1);
        assert!(championship.is_over());
        assert!(matches!(championship.start_round(), Err(LevelError::NoRoundsLeft)));
    }

    #[test]
    fn test_unfinished_beyond_cutoff_are_out() {
        let mut rng = Pcg32::seed_from_u64(4);
        let settings = RaceSettings {
            elimination: EliminationPolicy::LastPlaces(2),
            ..Default::default()
        };
        let mut championship = Championship::new(&[SHORT, SHORT], roster(5, &mut rng), settings);
        let mut level = championship.start_round().unwrap();
        let human = level.characters.iter().position(|c| c.is_human()).unwrap();
        level.characters[human].finished = true;
        level.characters[human].finish_order = Some(0);
        level.recompute_ranks();

        let outcome = championship.finish_round(&level);
        // Six racers, last two places out
        assert_eq!(outcome.eliminated.len(), 2);
        assert_eq!(outcome.survivors, 4);
        assert!(!outcome.eliminated.contains(&HUMAN_ID));
        let last_two = &outcome.standings[4..];
        assert!(last_two.iter().all(|id| outcome.eliminated.contains(id)));
    }

    #[test]
    fn test_player_out_ends_championship() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut championship = Championship::new(
            &[SHORT, SHORT, SHORT],
            roster(3, &mut rng),
            RaceSettings::default(),
        );
        let mut level = championship.start_round().unwrap();
        let human = level.characters.iter().position(|c| c.is_human()).unwrap();
        level.characters[human].eliminated = true;

        championship.finish_round(&level);
        assert!(championship.is_over());
    }
}
