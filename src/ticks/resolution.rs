//! Exact beat → tick conversion
//!
//! The primary conversion path never rounds: a quantity either lands on a
//! whole tick at the active resolution or the conversion fails. Rounding
//! once per note would drift across a long score and desynchronize beats
//! from measures.

use thiserror::Error;

use crate::model::RationalBeat;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{beats} beats is not a whole number of ticks at {ticks_per_quarter} ticks per quarter")]
pub struct ResolutionMismatch {
    pub beats: RationalBeat,
    pub ticks_per_quarter: u32,
}

/// Convert a quarter-note quantity to ticks at `ticks_per_quarter`.
///
/// # Examples
/// ```
/// use scoretick::model::beats;
/// use scoretick::ticks::to_ticks;
///
/// assert_eq!(to_ticks(beats(2, 1), 480), Ok(960));
/// assert_eq!(to_ticks(beats(1, 3), 480), Ok(160));
/// assert!(to_ticks(beats(1, 3), 128).is_err());
/// ```
pub fn to_ticks(beats: RationalBeat, ticks_per_quarter: u32) -> Result<i64, ResolutionMismatch> {
    let scaled = beats * i64::from(ticks_per_quarter);
    if scaled.is_integer() {
        Ok(scaled.to_integer())
    } else {
        Err(ResolutionMismatch { beats, ticks_per_quarter })
    }
}
