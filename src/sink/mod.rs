//! Event sinks
//!
//! A sink receives the finished, sorted buffer of one pass. Container
//! serialization (byte encoding, file writes) stays with the caller; the
//! [`SmfSink`] stops at a typed `midly::Smf` value.

pub mod smf;

use thiserror::Error;

use crate::events::TickEvent;

pub use smf::SmfSink;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("ticks per quarter {0} does not fit the container header")]
    Resolution(u32),

    #[error("tick {0} does not fit a container delta time")]
    Tick(u64),
}

pub trait EventSink {
    /// Accept one pass's events, sorted by tick, at `ticks_per_quarter`.
    fn write(&mut self, ticks_per_quarter: u32, events: &[TickEvent]) -> Result<(), SinkError>;
}

/// In-memory sink, mostly for tests and tools that post-process events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecSink {
    pub ticks_per_quarter: u32,
    pub events: Vec<TickEvent>,
}

impl EventSink for VecSink {
    fn write(&mut self, ticks_per_quarter: u32, events: &[TickEvent]) -> Result<(), SinkError> {
        self.ticks_per_quarter = ticks_per_quarter;
        self.events.extend_from_slice(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects() {
        let mut sink = VecSink::default();
        let events = [TickEvent::EndOfTrack { tick: 5, track: 0 }];
        sink.write(96, &events).unwrap();
        assert_eq!(sink.ticks_per_quarter, 96);
        assert_eq!(sink.events, events.to_vec());
    }
}
