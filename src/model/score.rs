//! Score provider boundary
//!
//! The conversion core reads the score through [`ScoreProvider`]. Parsing the
//! notation file is somebody else's job; [`Score`] is the in-memory provider
//! the surrounding tool fills (directly, or from JSON).

use serde::{Deserialize, Serialize};

use super::beat::{reduced, RationalBeat};
use super::event::{EventKind, ScoreEvent, Tie, TrackId};
use super::marks::{DynamicMark, TempoMark};
use crate::defaults::assign_channel;
use crate::error::{ConversionError, Result};

/// Read-only view of a parsed score, consumed in one forward pass.
pub trait ScoreProvider {
    /// Events in position order
    fn events(&self) -> &[ScoreEvent];

    /// Explicit tempo marks in position order
    fn tempo_marks(&self) -> &[TempoMark];

    /// Dynamic marks in position order
    fn dynamic_marks(&self) -> &[DynamicMark];

    /// Length of the piece in beats
    fn total_length(&self) -> RationalBeat;

    /// Beat strength at a position: positive on strong beats, 0 on plain
    /// beats, negative off the beat.
    fn metric_level(&self, position: RationalBeat) -> i32;

    /// Sounding duration of the note at `index`: the sum of all its tied
    /// segments when it starts a tie, its own duration otherwise.
    fn tied_duration(&self, index: usize) -> RationalBeat;

    /// Measure start positions in order (may be empty)
    fn measure_starts(&self) -> &[RationalBeat];

    fn track_count(&self) -> usize;

    /// Output channel for a track
    fn channel(&self, track: TrackId) -> u8 {
        assign_channel(track)
    }
}

/// In-memory score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Score {
    events: Vec<ScoreEvent>,
    tempo_marks: Vec<TempoMark>,
    dynamic_marks: Vec<DynamicMark>,
    measure_starts: Vec<RationalBeat>,
    total_length: Option<RationalBeat>,
    metric_levels: Vec<(RationalBeat, i32)>,
    channels: Vec<u8>,
}

impl Score {
    pub fn new(events: Vec<ScoreEvent>) -> Self {
        let mut score = Self { events, ..Self::default() };
        score.normalize();
        score
    }

    /// Load a score from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let mut score: Score =
            serde_json::from_str(json).map_err(|e| ConversionError::InvalidScore(e.to_string()))?;
        score.normalize();
        Ok(score)
    }

    pub fn with_tempo_marks(mut self, marks: Vec<TempoMark>) -> Self {
        self.tempo_marks = marks;
        self.normalize();
        self
    }

    pub fn with_dynamic_marks(mut self, marks: Vec<DynamicMark>) -> Self {
        self.dynamic_marks = marks;
        self.normalize();
        self
    }

    pub fn with_measure_starts(mut self, starts: Vec<RationalBeat>) -> Self {
        self.measure_starts = starts;
        self.normalize();
        self
    }

    pub fn with_total_length(mut self, length: RationalBeat) -> Self {
        self.total_length = Some(reduced(length));
        self
    }

    pub fn with_metric_levels(mut self, levels: Vec<(RationalBeat, i32)>) -> Self {
        self.metric_levels = levels;
        self.normalize();
        self
    }

    pub fn with_channels(mut self, channels: Vec<u8>) -> Self {
        self.channels = channels;
        self
    }

    /// Reduce every fraction and restore position order.
    ///
    /// Sorting is stable so simultaneous events keep their source order.
    fn normalize(&mut self) {
        for event in &mut self.events {
            event.position = reduced(event.position);
            event.duration = reduced(event.duration);
        }
        self.events.sort_by(|a, b| a.position.cmp(&b.position));

        for mark in &mut self.tempo_marks {
            mark.position = reduced(mark.position);
        }
        self.tempo_marks.sort_by(|a, b| a.position.cmp(&b.position));

        for mark in &mut self.dynamic_marks {
            mark.position = reduced(mark.position);
        }
        self.dynamic_marks.sort_by(|a, b| a.position.cmp(&b.position));

        self.measure_starts = self.measure_starts.iter().copied().map(reduced).collect();
        self.measure_starts.sort();
        self.measure_starts.dedup();

        for (position, _) in &mut self.metric_levels {
            *position = reduced(*position);
        }
        self.metric_levels.sort_by(|a, b| a.0.cmp(&b.0));

        self.total_length = self.total_length.map(reduced);
    }

    /// Beat strength derived from the measure grid: downbeat 1, other whole
    /// beats 0, anything between beats -1.
    fn derived_metric_level(&self, position: RationalBeat) -> i32 {
        let index = self.measure_starts.partition_point(|start| *start <= position);
        let measure_start = if index == 0 {
            RationalBeat::default()
        } else {
            self.measure_starts[index - 1]
        };
        let offset = position - measure_start;
        if offset == RationalBeat::default() {
            1
        } else if offset.is_integer() {
            0
        } else {
            -1
        }
    }
}

impl ScoreProvider for Score {
    fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    fn tempo_marks(&self) -> &[TempoMark] {
        &self.tempo_marks
    }

    fn dynamic_marks(&self) -> &[DynamicMark] {
        &self.dynamic_marks
    }

    fn total_length(&self) -> RationalBeat {
        if let Some(length) = self.total_length {
            return length;
        }
        let event_end = self.events.iter().map(|e| e.position + e.duration);
        let tempo_end = self.tempo_marks.iter().map(|m| m.position);
        let dynamic_end = self.dynamic_marks.iter().map(|m| m.position);
        event_end
            .chain(tempo_end)
            .chain(dynamic_end)
            .max()
            .unwrap_or_default()
    }

    fn metric_level(&self, position: RationalBeat) -> i32 {
        match self.metric_levels.binary_search_by(|(p, _)| p.cmp(&position)) {
            Ok(index) => self.metric_levels[index].1,
            Err(_) => self.derived_metric_level(position),
        }
    }

    fn tied_duration(&self, index: usize) -> RationalBeat {
        let Some(head) = self.events.get(index) else {
            return RationalBeat::default();
        };
        let mut total = head.duration;
        if head.tie != Tie::Start {
            return total;
        }

        // Segments must follow each other without gaps on the same track/pitch.
        for event in &self.events[index + 1..] {
            if event.track != head.track
                || event.pitch != head.pitch
                || !matches!(event.kind, EventKind::Note)
            {
                continue;
            }
            if event.position != head.position + total {
                if event.position > head.position + total {
                    break;
                }
                continue;
            }
            match event.tie {
                Tie::Continue => total += event.duration,
                Tie::Stop => {
                    total += event.duration;
                    break;
                }
                Tie::None | Tie::Start => break,
            }
        }
        total
    }

    fn measure_starts(&self) -> &[RationalBeat] {
        &self.measure_starts
    }

    fn track_count(&self) -> usize {
        let event_tracks = self.events.iter().map(|e| e.track + 1);
        let mark_tracks = self.dynamic_marks.iter().map(|m| m.track + 1);
        event_tracks.chain(mark_tracks).max().unwrap_or(0)
    }

    fn channel(&self, track: TrackId) -> u8 {
        match self.channels.get(track) {
            Some(channel) => *channel & 0x0f,
            None => assign_channel(track),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::beat::{beats, whole};
    use crate::model::event::Directive;

    #[test]
    fn test_events_sorted_stably() {
        let score = Score::new(vec![
            ScoreEvent::note(whole(1), 0, 62, whole(1)),
            ScoreEvent::note(whole(0), 0, 60, whole(1)),
            ScoreEvent::note(whole(0), 0, 64, whole(1)),
        ]);
        let pitches: Vec<_> = score.events().iter().map(|e| e.pitch.unwrap()).collect();
        assert_eq!(pitches, vec![60, 64, 62]);
    }

    #[test]
    fn test_total_length_derived_from_events() {
        let score = Score::new(vec![
            ScoreEvent::note(whole(0), 0, 60, whole(2)),
            ScoreEvent::note(whole(1), 1, 60, beats(5, 2)),
        ]);
        assert_eq!(score.total_length(), beats(7, 2));
        assert_eq!(score.with_total_length(whole(8)).total_length(), whole(8));
    }

    #[test]
    fn test_tied_duration_sums_contiguous_segments() {
        let score = Score::new(vec![
            ScoreEvent::note(whole(0), 0, 60, whole(1)).with_tie(Tie::Start),
            ScoreEvent::note(whole(0), 0, 64, whole(1)),
            ScoreEvent::note(whole(1), 0, 60, beats(1, 2)).with_tie(Tie::Continue),
            ScoreEvent::note(beats(3, 2), 0, 60, whole(2)).with_tie(Tie::Stop),
            ScoreEvent::note(beats(7, 2), 0, 60, whole(1)),
        ]);
        assert_eq!(score.tied_duration(0), beats(7, 2));
        assert_eq!(score.tied_duration(1), whole(1));
        assert_eq!(score.tied_duration(99), whole(0));
    }

    #[test]
    fn test_tied_duration_stops_at_gap() {
        let score = Score::new(vec![
            ScoreEvent::note(whole(0), 0, 60, whole(1)).with_tie(Tie::Start),
            ScoreEvent::note(whole(2), 0, 60, whole(1)).with_tie(Tie::Stop),
        ]);
        assert_eq!(score.tied_duration(0), whole(1));
    }

    #[test]
    fn test_derived_metric_levels() {
        let score = Score::new(vec![ScoreEvent::note(whole(0), 0, 60, whole(8))])
            .with_measure_starts(vec![whole(4), whole(0)]);
        assert_eq!(score.metric_level(whole(0)), 1);
        assert_eq!(score.metric_level(whole(4)), 1);
        assert_eq!(score.metric_level(whole(5)), 0);
        assert_eq!(score.metric_level(beats(11, 2)), -1);

        let score = score.with_metric_levels(vec![(beats(11, 2), 2)]);
        assert_eq!(score.metric_level(beats(11, 2)), 2);
    }

    #[test]
    fn test_track_count_and_channels() {
        let score = Score::new(vec![
            ScoreEvent::note(whole(0), 0, 60, whole(1)),
            ScoreEvent::directive(whole(0), 10, Directive::FreeRhythm),
        ]);
        assert_eq!(score.track_count(), 11);
        assert_eq!(score.channel(9), 10);
        assert_eq!(score.with_channels(vec![3]).channel(0), 3);
    }

    #[test]
    fn test_from_json_normalizes() {
        let json = r#"{
            "events": [
                { "position": [2, 1], "track": 0, "kind": "note", "pitch": 62, "duration": [2, 2] },
                { "position": [0, 1], "track": 0, "kind": "note", "pitch": 60, "duration": [4, 2] }
            ],
            "tempo_marks": [ { "position": [0, 1], "beats_per_minute": 120.0, "source": "explicit" } ]
        }"#;
        let score = Score::from_json(json).unwrap();
        assert_eq!(score.events()[0].pitch, Some(60));
        assert_eq!(*score.events()[0].duration.denom(), 1);
        assert_eq!(score.total_length(), whole(3));
        assert_eq!(score.tempo_marks().len(), 1);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(Score::from_json("{ nope"), Err(ConversionError::InvalidScore(_))));
    }
}
