//! Courses raced in the championship, one per round

use crate::sim::TrackTemplate::{self, *};

pub const SIMPLE_TRACK: &[TrackTemplate] = &[
    Checkpoint,
    //
    FullWidth,
    FullWidth,
    FullWidth,
    Checkpoint,
    //
    Basic,
    SlopeEmptyPassage,
    SlopeEmptyPassage,
    DualPassage,
    Basic,
    RightPassage,
    RightPassage,
    Basic,
    Basic,
    Raft,
    Chasm,
    FullWidth,
    Checkpoint,
    //
    BasicSteepSlope,
    BasicSlope,
    FullWidthWithObstacles,
    FullWidthWithMoreObstacles,
    FullWidthWithObstacles,
    DualPassage,
    DualPassage,
    DualPassage,
    FullWidth,
    Finish,
];

pub const SECOND_TRACK: &[TrackTemplate] = &[
    Checkpoint,
    //
    FullWidth,
    BasicSteepSlope,
    BasicSlope,
    BasicSlope,
    Basic,
    Basic,
    Basic,
    Narrow,
    VeryNarrow,
    VeryNarrow,
    Basic,
    FullWidthWithObstacles,
    SlopeObstacleSlope,
    PassageEmptySlope,
    PassageEmptySlope,
    DualPassage,
    DualPassage,
    FullWidth,
    FullWidthWithObstaclesOnRight,
    FullWidthWithObstaclesOnRight2,
    FullWidthWithObstaclesOnRight,
    FullWidth,
    Raft,
    Chasm,
    Checkpoint,
    //
    FullWidth,
    VeryNarrow,
    FullWidth,
    BasicSteepSlope,
    BasicSlope,
    BasicSlope,
    Basic,
    Basic,
    Basic,
    Basic,
    Basic,
    TwoRafts,
    Chasm,
    Finish,
];

pub const THIRD_TRACK: &[TrackTemplate] = &[
    Checkpoint,
    //
    FullWidth,
    Basic,
    Narrow,
    VeryNarrow,
    Basic,
    SlopeEmptySlope,
    SlopeEmptySlope,
    SlopeEmptySlope,
    DualPassage,
    DualPassage,
    Basic,
    FullWidthWithObstacles,
    VeryNarrow,
    Basic,
    Checkpoint,
    //
    FullWidth,
    SlopeEmptySlope,
    PassageEmptySlope,
    PassageEmptySlope,
    DualPassage,
    SlopeEmptyPassage,
    DualPassageExt,
    TriplePassage,
    TriplePassage,
    TriplePassage,
    FullWidth,
    Checkpoint,
    //
    FullWidthWithObstacles,
    FullWidthWithMoreObstacles,
    FullWidth,
    TwoRafts,
    Chasm,
    Basic,
    FullWidth,
    Checkpoint,
    //
    BasicSteepSlope,
    BasicSlope,
    BasicSlope,
    Basic,
    Basic,
    Basic,
    DualPassage,
    DualPassageExt,
    TriplePassage,
    TriplePassage,
    DualPassageExt,
    SlopeObstacleSlope,
    SlopeObstacleSlope,
    Basic,
    Basic,
    Narrow,
    VeryNarrow,
    FullWidth,
    Finish,
];

/// The championship's courses in the order they are raced
pub fn championship_tracks() -> [&'static [TrackTemplate]; 3] {
    [SIMPLE_TRACK, SECOND_TRACK, THIRD_TRACK]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::template::validate_templates;

    #[test]
    fn test_all_courses_are_valid() {
        for course in championship_tracks() {
            assert_eq!(validate_templates(course), Ok(()));
        }
    }
}
