//! Tick resolution
//!
//! Exact conversion of beat quantities to integer ticks, either at one global
//! resolution or through per-measure resolution groups.

pub mod grouping;
pub mod resolution;
pub mod schedule;

pub use grouping::{group_resolutions, measure_resolutions, MeasureResolution};
pub use resolution::{to_ticks, ResolutionMismatch};
pub use schedule::{ResolutionGroup, TickSchedule};
