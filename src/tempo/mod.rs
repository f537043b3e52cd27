//! Tempo resolution
//!
//! ```text
//! explicit marks ─┐
//!                 ├─► TempoCurve (one BPM per line) ─► RealTimeline (seconds)
//! mensuration ────┘
//! ```

pub mod mensuration;
pub mod resolver;
pub mod timeline;

pub use mensuration::{heuristic_marks, mensural_multiplier, MensurationTempo, MENSURATION_TEMPO_TABLE};
pub use resolver::TempoCurve;
pub use timeline::RealTimeline;
