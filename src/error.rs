//! Error types for course and race construction
//!
//! The simulation never fails once a level is running: stalls, missing spawn spots
//! and waiting for rafts are ordinary states retried on the next tick. Errors only
//! come from bad course data, rosters or settings.

use thiserror::Error;

/// Errors raised when validating a track template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("track template must contain at least one element")]
    Empty,
    #[error("the first track element must have a walkable surface")]
    UnwalkableStart,
    #[error("track template must end with a single finish element")]
    MissingFinish,
    #[error("chasm at element {index} has no raft leading into it")]
    UnbridgedChasm { index: usize },
}

/// Errors raised when loading or validating race settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(&'static str),
}

/// Errors raised when constructing a level.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid track: {0}")]
    Track(#[from] TrackError),
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("roster must contain at least one character")]
    EmptyRoster,
    #[error("roster has no human-controlled character (id 0)")]
    NoHuman,
    #[error("character id {0} appears more than once in the roster")]
    DuplicateId(u32),
    #[error("championship has no rounds left")]
    NoRoundsLeft,
}
