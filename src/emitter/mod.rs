//! Event emission
//!
//! ```text
//! ScoreProvider ─► ConversionContext ─► forward pass ─► sorted TickEvents
//!                  (tempo, schedule,                      │
//!                   velocities, free rhythm)              └─► optional trim
//! ```

pub mod context;
pub mod pass;
pub mod trim;

pub use context::{ConversionContext, Region};
pub use pass::{convert, ConversionOutput};
pub use trim::trim_leading_silence;
