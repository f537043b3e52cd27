//! Score event model
//!
//! Everything the conversion core reads: events with exact rational
//! positions and durations, sparse tempo and dynamic marks, and the
//! [`ScoreProvider`] trait that hands them over.
//!
//! ```text
//! ScoreProvider ──► events / tempo marks / dynamic marks ──► ScoreLines
//!                                                            (dense index)
//! ```

pub mod beat;
pub mod event;
pub mod lines;
pub mod marks;
pub mod score;

pub use beat::{as_f64, beats, whole, RationalBeat};
pub use event::{
    Articulations, Directive, EventKind, MensurationSign, Mode, ScoreEvent, Tie, TrackId,
};
pub use lines::ScoreLines;
pub use marks::{CrescDirection, DynamicLevel, DynamicMark, TempoMark, TempoSource};
pub use score::{Score, ScoreProvider};
