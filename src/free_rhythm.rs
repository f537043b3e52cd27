//! Free-rhythm note tracking
//!
//! Inside an unmetered region a note's end is not known when it starts. The
//! tracker keeps such notes open per track until an explicit release, the
//! end of the region, or the end of the piece. Notes closed by the region or
//! piece ending were never released and are reported as orphaned.

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::events::TickEvent;
use crate::model::{RationalBeat, TrackId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NoteSlot {
    pub channel: u8,
    pub pitch: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenNote {
    pub slot: NoteSlot,
    pub since_tick: u64,
    pub position: RationalBeat,
}

#[derive(Debug, Clone, Default)]
struct TrackState {
    active: bool,
    open: Vec<OpenNote>,
}

/// Per-track free-rhythm state, indexed by track id
#[derive(Debug, Clone, Default)]
pub struct FreeRhythmTracker {
    tracks: Vec<TrackState>,
}

fn note_off(track: TrackId, note: &OpenNote, tick: u64) -> TickEvent {
    TickEvent::NoteOff {
        tick: tick.max(note.since_tick),
        track,
        channel: note.slot.channel,
        pitch: note.slot.pitch,
    }
}

impl FreeRhythmTracker {
    pub fn new(track_count: usize) -> Self {
        Self { tracks: vec![TrackState::default(); track_count] }
    }

    fn state(&mut self, track: TrackId) -> &mut TrackState {
        if self.tracks.len() <= track {
            self.tracks.resize_with(track + 1, TrackState::default);
        }
        &mut self.tracks[track]
    }

    pub fn is_active(&self, track: TrackId) -> bool {
        self.tracks.get(track).map(|s| s.active).unwrap_or(false)
    }

    pub fn open_notes(&self, track: TrackId) -> &[OpenNote] {
        self.tracks.get(track).map(|s| s.open.as_slice()).unwrap_or(&[])
    }

    /// Start a free-rhythm region. Notes still open from an earlier region
    /// stay open until the next close.
    pub fn enter(&mut self, track: TrackId, position: RationalBeat, diagnostics: &mut Diagnostics) {
        let state = self.state(track);
        if !state.open.is_empty() {
            let message = format!("free rhythm entered again with {} note(s) still open", state.open.len());
            diagnostics.add(Diagnostic::new(DiagnosticKind::FreeRhythmReentered, position, message).with_track(track));
        }
        state.active = true;
    }

    /// Register a note whose end is not known yet. A note already sounding
    /// in the same slot is closed at the new note's tick.
    pub fn register(&mut self, track: TrackId, note: OpenNote) -> Option<TickEvent> {
        let state = self.state(track);
        let closed = state
            .open
            .iter()
            .position(|open| open.slot == note.slot)
            .map(|index| state.open.remove(index))
            .map(|previous| note_off(track, &previous, note.since_tick));
        state.open.push(note);
        closed
    }

    /// Explicit close marker: close the open notes of `pitch`, or every open
    /// note of the track when `pitch` is `None`.
    pub fn release(&mut self, track: TrackId, pitch: Option<u8>, tick: u64) -> Vec<TickEvent> {
        let state = self.state(track);
        let mut closed = Vec::new();
        for index in (0..state.open.len()).rev() {
            if pitch.map_or(true, |p| state.open[index].slot.pitch == p) {
                let note = state.open.remove(index);
                closed.push(note_off(track, &note, tick));
            }
        }
        closed
    }

    /// End a free-rhythm region, closing (and reporting) every open note.
    pub fn leave(
        &mut self,
        track: TrackId,
        tick: u64,
        position: RationalBeat,
        diagnostics: &mut Diagnostics,
    ) -> Vec<TickEvent> {
        let state = self.state(track);
        state.active = false;
        let mut closed = Vec::with_capacity(state.open.len());
        while let Some(note) = state.open.pop() {
            let message = format!(
                "note {} from beat {} was never released; closed at beat {}",
                note.slot.pitch, note.position, position
            );
            diagnostics.add(Diagnostic::new(DiagnosticKind::OrphanedFreeNote, note.position, message).with_track(track));
            closed.push(note_off(track, &note, tick));
        }
        closed
    }

    /// End of piece: leave every track.
    pub fn close_all(&mut self, tick: u64, position: RationalBeat, diagnostics: &mut Diagnostics) -> Vec<TickEvent> {
        let mut closed = Vec::new();
        for track in 0..self.tracks.len() {
            closed.extend(self.leave(track, tick, position, diagnostics));
        }
        closed
    }
}
