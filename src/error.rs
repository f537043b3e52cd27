//! # Error Types
//!
//! Fatal conditions of a conversion pass. Any of these aborts the pass: the
//! partial output would be musically invalid, so nothing is returned.
//!
//! Recoverable conditions (orphaned free-rhythm notes, zero-length notes) are
//! not errors; they are collected in [`crate::diagnostics::Diagnostics`] and
//! returned alongside a successful result.
//!
//! ## Usage
//! ```rust,ignore
//! match scoretick::convert(&score, &settings) {
//!     Ok(output) => sink.write(&output)?,
//!     Err(ConversionError::ResolutionMismatch { position, track, .. }) => {
//!         eprintln!("cannot place event at beat {} (track {:?})", position, track);
//!     }
//!     Err(e) => eprintln!("error: {}", e),
//! }
//! ```

use thiserror::Error;

use crate::model::{RationalBeat, TrackId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// A beat quantity does not convert to a whole number of ticks.
    ///
    /// `position` locates the offending event, `beats` is the quantity that
    /// failed (the position itself or a duration).
    #[error("{beats} beats at position {position} (track {track:?}) is not a whole number of ticks at {ticks_per_quarter} ticks per quarter")]
    ResolutionMismatch {
        position: RationalBeat,
        beats: RationalBeat,
        track: Option<TrackId>,
        ticks_per_quarter: u32,
    },

    /// No explicit or heuristic tempo exists anywhere in the score.
    #[error("no tempo information anywhere in the score")]
    TempoUndefined,

    /// A single event needs more ticks than the container allows: a measure
    /// even in a resolution group of its own, or a held note (ties, rhythm
    /// scale) inside the group starting at `measure_start`.
    #[error("measure at beat {measure_start} (track {track:?}) needs {required} ticks for a single event, above the ceiling of {ceiling}")]
    TickOverflow {
        measure_start: RationalBeat,
        track: Option<TrackId>,
        required: u64,
        ceiling: u32,
    },

    /// Events before the start of the piece cannot be placed on the tick grid.
    #[error("event at negative position {position} on track {track}")]
    NegativePosition { position: RationalBeat, track: TrackId },

    #[error("invalid score: {0}")]
    InvalidScore(String),

    #[error("invalid settings: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::beat::{beats, whole};

    #[test]
    fn test_error_messages_carry_location() {
        let err = ConversionError::ResolutionMismatch {
            position: whole(4),
            beats: beats(1, 3),
            track: Some(1),
            ticks_per_quarter: 128,
        };
        assert_eq!(
            err.to_string(),
            "1/3 beats at position 4 (track Some(1)) is not a whole number of ticks at 128 ticks per quarter"
        );

        let err = ConversionError::NegativePosition { position: beats(-1, 2), track: 0 };
        assert_eq!(err.to_string(), "event at negative position -1/2 on track 0");
    }
}
