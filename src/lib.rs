//! Score-to-tick conversion core
//!
//! Turns a parsed score (events at exact rational beat positions, plus sparse
//! tempo and dynamic marks) into integer-tick events for a MIDI-like
//! sequencer container. The library logs through the `log` facade and never
//! installs a logger itself.

pub mod defaults;
pub mod diagnostics;
pub mod dynamics;
pub mod emitter;
pub mod error;
pub mod events;
pub mod free_rhythm;
pub mod model;
pub mod settings;
pub mod sink;
pub mod tempo;
pub mod ticks;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use emitter::{convert, trim_leading_silence, ConversionOutput};
pub use error::{ConversionError, Result};
pub use events::TickEvent;
pub use model::{Score, ScoreProvider};
pub use settings::{ConversionSettings, ResolutionMode, TimeBase};
pub use sink::{EventSink, SmfSink, VecSink};
