//! Tick-tagged output records
//!
//! The emitter produces a flat buffer of [`TickEvent`]s. Meta records
//! (tempo, time and key signature) belong to no track; the sink decides
//! where they go (the SMF adapter puts them on a conductor track).

use serde::{Deserialize, Serialize};

use crate::model::{Mode, TrackId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickEvent {
    NoteOn { tick: u64, track: TrackId, channel: u8, pitch: u8, velocity: u8 },
    NoteOff { tick: u64, track: TrackId, channel: u8, pitch: u8 },
    TempoChange { tick: u64, microseconds_per_quarter: u32 },
    TimeSignature { tick: u64, numerator: u8, denominator: u8 },
    KeySignature { tick: u64, accidentals: i8, mode: Mode },
    ProgramChange { tick: u64, track: TrackId, channel: u8, program: u8 },
    Controller { tick: u64, track: TrackId, channel: u8, controller: u8, value: u8 },
    EndOfTrack { tick: u64, track: TrackId },
}

impl TickEvent {
    pub fn tick(&self) -> u64 {
        match *self {
            TickEvent::NoteOn { tick, .. }
            | TickEvent::NoteOff { tick, .. }
            | TickEvent::TempoChange { tick, .. }
            | TickEvent::TimeSignature { tick, .. }
            | TickEvent::KeySignature { tick, .. }
            | TickEvent::ProgramChange { tick, .. }
            | TickEvent::Controller { tick, .. }
            | TickEvent::EndOfTrack { tick, .. } => tick,
        }
    }

    pub fn tick_mut(&mut self) -> &mut u64 {
        match self {
            TickEvent::NoteOn { tick, .. }
            | TickEvent::NoteOff { tick, .. }
            | TickEvent::TempoChange { tick, .. }
            | TickEvent::TimeSignature { tick, .. }
            | TickEvent::KeySignature { tick, .. }
            | TickEvent::ProgramChange { tick, .. }
            | TickEvent::Controller { tick, .. }
            | TickEvent::EndOfTrack { tick, .. } => tick,
        }
    }

    /// Owning track, `None` for meta records
    pub fn track(&self) -> Option<TrackId> {
        match *self {
            TickEvent::NoteOn { track, .. }
            | TickEvent::NoteOff { track, .. }
            | TickEvent::ProgramChange { track, .. }
            | TickEvent::Controller { track, .. }
            | TickEvent::EndOfTrack { track, .. } => Some(track),
            TickEvent::TempoChange { .. } | TickEvent::TimeSignature { .. } | TickEvent::KeySignature { .. } => None,
        }
    }

    /// Order of simultaneous records: setup first, then releases before
    /// attacks so a repeated pitch is not cut off, end-of-track last.
    pub fn priority(&self) -> u8 {
        match self {
            TickEvent::TempoChange { .. }
            | TickEvent::TimeSignature { .. }
            | TickEvent::KeySignature { .. }
            | TickEvent::ProgramChange { .. }
            | TickEvent::Controller { .. } => 0,
            TickEvent::NoteOff { .. } => 1,
            TickEvent::NoteOn { .. } => 2,
            TickEvent::EndOfTrack { .. } => 3,
        }
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, TickEvent::NoteOn { .. })
    }
}

/// Tempo record value for `beats_per_minute`, rounded to the microsecond.
pub fn microseconds_per_quarter(beats_per_minute: f64) -> u32 {
    let micros = (60_000_000.0 / beats_per_minute).round();
    micros.clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Stable sort by `(tick, priority)`.
pub fn sort_events(events: &mut [TickEvent]) {
    events.sort_by_key(|e| (e.tick(), e.priority()));
}
