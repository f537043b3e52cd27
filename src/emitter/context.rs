//! State owned by one conversion pass

use crate::defaults::MILLISECOND_TICKS_PER_QUARTER;
use crate::diagnostics::Diagnostics;
use crate::dynamics::{VelocityCurve, VelocityShaper};
use crate::error::{ConversionError, Result};
use crate::events::TickEvent;
use crate::free_rhythm::FreeRhythmTracker;
use crate::model::{beats, RationalBeat, ScoreLines, ScoreProvider, TempoMark, TrackId};
use crate::settings::{ConversionSettings, ResolutionMode, TimeBase};
use crate::tempo::{heuristic_marks, RealTimeline, TempoCurve};
use crate::ticks::{group_resolutions, ResolutionMismatch, TickSchedule};

/// Where a track is in the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// No event seen yet
    Idle,
    InMeasuredRegion,
    InFreeRhythmRegion,
}

#[derive(Debug, Clone)]
pub struct TrackState {
    pub seen: bool,
    /// Multiplier applied to note durations
    pub rhythm_scale: RationalBeat,
}

impl Default for TrackState {
    fn default() -> Self {
        Self { seen: false, rhythm_scale: beats(1, 1) }
    }
}

pub(crate) fn mismatch(position: RationalBeat, track: Option<TrackId>, err: ResolutionMismatch) -> ConversionError {
    ConversionError::ResolutionMismatch {
        position,
        beats: err.beats,
        track,
        ticks_per_quarter: err.ticks_per_quarter,
    }
}

/// Everything one pass reads and mutates. Built fresh per conversion;
/// per-track state lives in vectors indexed by [`TrackId`].
pub struct ConversionContext {
    pub lines: ScoreLines,
    pub tempo: TempoCurve,
    pub timeline: RealTimeline,
    pub schedule: TickSchedule,
    pub time_base: TimeBase,
    /// Per-event tick limit, set for grouped resolution
    pub tick_ceiling: Option<u32>,
    pub velocities: VelocityCurve,
    pub shaper: VelocityShaper,
    pub free_rhythm: FreeRhythmTracker,
    pub tracks: Vec<TrackState>,
    pub diagnostics: Diagnostics,
    pub events: Vec<TickEvent>,
}

impl ConversionContext {
    pub fn new<P: ScoreProvider + ?Sized>(score: &P, settings: &ConversionSettings) -> Result<Self> {
        settings.validate()?;

        let lines = ScoreLines::collect(score);
        let mut marks: Vec<TempoMark> = heuristic_marks(score, settings.mensural_base_tempo);
        marks.extend_from_slice(score.tempo_marks());
        let tempo = TempoCurve::resolve(&lines, &marks)?;
        let timeline = RealTimeline::build(&lines, &tempo);

        let (schedule, tick_ceiling) = match settings.resolution {
            ResolutionMode::Fixed { ticks_per_quarter } => (TickSchedule::uniform(ticks_per_quarter), None),
            ResolutionMode::Grouped { ceiling } => (group_resolutions(score, ceiling)?, Some(ceiling)),
        };

        let track_count = score.track_count();
        let velocities =
            VelocityCurve::synthesize(&lines, score.dynamic_marks(), track_count, settings.default_velocity);

        Ok(Self {
            lines,
            tempo,
            timeline,
            schedule,
            time_base: settings.time_base,
            tick_ceiling,
            velocities,
            shaper: VelocityShaper::new(settings, track_count),
            free_rhythm: FreeRhythmTracker::new(track_count),
            tracks: vec![TrackState::default(); track_count],
            diagnostics: Diagnostics::new(),
            events: Vec::new(),
        })
    }

    pub fn track_mut(&mut self, track: TrackId) -> &mut TrackState {
        if self.tracks.len() <= track {
            self.tracks.resize_with(track + 1, TrackState::default);
        }
        &mut self.tracks[track]
    }

    pub fn region(&self, track: TrackId) -> Region {
        if self.free_rhythm.is_active(track) {
            Region::InFreeRhythmRegion
        } else if self.tracks.get(track).map(|t| t.seen).unwrap_or(false) {
            Region::InMeasuredRegion
        } else {
            Region::Idle
        }
    }

    /// Resolution written to the output header
    pub fn header_ticks_per_quarter(&self) -> u32 {
        match self.time_base {
            TimeBase::Metrical => self.schedule.header_ticks_per_quarter(),
            TimeBase::Milliseconds => MILLISECOND_TICKS_PER_QUARTER,
        }
    }

    fn milliseconds_at(&self, position: RationalBeat) -> u64 {
        (self.timeline.seconds_at(position) * 1000.0).round().max(0.0) as u64
    }

    /// Tick of an event position on `track`
    pub fn tick_at(&self, position: RationalBeat, track: TrackId) -> Result<u64> {
        if position < RationalBeat::default() {
            return Err(ConversionError::NegativePosition { position, track });
        }
        match self.time_base {
            TimeBase::Metrical => {
                let tick = self.schedule.tick_at(position).map_err(|e| mismatch(position, Some(track), e))?;
                u64::try_from(tick).map_err(|_| ConversionError::NegativePosition { position, track })
            }
            TimeBase::Milliseconds => Ok(self.milliseconds_at(position)),
        }
    }

    /// Tick of a position no event is attached to (tempo changes, the end
    /// of the piece); negative positions clamp to 0.
    pub fn tick_at_unowned(&self, position: RationalBeat) -> Result<u64> {
        let position = position.max(RationalBeat::default());
        match self.time_base {
            TimeBase::Metrical => {
                let tick = self.schedule.tick_at(position).map_err(|e| mismatch(position, None, e))?;
                Ok(u64::try_from(tick).unwrap_or(0))
            }
            TimeBase::Milliseconds => Ok(self.milliseconds_at(position)),
        }
    }

    /// Ticks covered by `duration` from `start`; may be zero or negative.
    pub fn duration_ticks(&self, start: RationalBeat, duration: RationalBeat, track: TrackId) -> Result<i64> {
        match self.time_base {
            TimeBase::Metrical => self
                .schedule
                .duration_ticks(start, duration)
                .map_err(|e| mismatch(start, Some(track), e)),
            TimeBase::Milliseconds => {
                let on = self.milliseconds_at(start) as i64;
                let off = (self.timeline.seconds_at(start + duration) * 1000.0).round() as i64;
                Ok(off - on)
            }
        }
    }

    /// Fails with [`ConversionError::TickOverflow`] when `length` ticks do not
    /// fit under the grouped-resolution ceiling.
    pub fn check_ceiling(&self, position: RationalBeat, length: i64, track: TrackId) -> Result<()> {
        let Some(ceiling) = self.tick_ceiling else {
            return Ok(());
        };
        let required = u64::try_from(length).unwrap_or(0);
        if required > u64::from(ceiling) {
            return Err(ConversionError::TickOverflow {
                measure_start: self.schedule.group_at(position).start,
                track: Some(track),
                required,
                ceiling,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, event: TickEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{whole, Score, ScoreEvent};

    fn score() -> Score {
        Score::new(vec![
            ScoreEvent::note(whole(0), 0, 60, whole(1)),
            ScoreEvent::note(beats(3, 2), 1, 62, beats(1, 2)),
        ])
        .with_tempo_marks(vec![TempoMark::explicit(whole(0), 60.0)])
    }

    #[test]
    fn test_metrical_ticks() {
        let ctx = ConversionContext::new(&score(), &ConversionSettings::plain(480)).unwrap();
        assert_eq!(ctx.header_ticks_per_quarter(), 480);
        assert_eq!(ctx.tick_at(beats(3, 2), 1), Ok(720));
        assert_eq!(ctx.duration_ticks(whole(0), beats(1, 4), 0), Ok(120));
        assert_eq!(
            ctx.tick_at(beats(-1, 2), 1),
            Err(ConversionError::NegativePosition { position: beats(-1, 2), track: 1 })
        );
        assert!(matches!(
            ctx.tick_at(beats(1, 7), 0),
            Err(ConversionError::ResolutionMismatch { track: Some(0), .. })
        ));
    }

    #[test]
    fn test_millisecond_ticks() {
        let settings = ConversionSettings { time_base: TimeBase::Milliseconds, ..ConversionSettings::plain(480) };
        let ctx = ConversionContext::new(&score(), &settings).unwrap();
        assert_eq!(ctx.header_ticks_per_quarter(), 500);
        // 60 BPM: one second per beat
        assert_eq!(ctx.tick_at(beats(3, 2), 1), Ok(1500));
        assert_eq!(ctx.duration_ticks(beats(3, 2), beats(1, 2), 1), Ok(500));
        // exact-only arithmetic does not apply to wall-clock ticks
        assert_eq!(ctx.tick_at(beats(1, 7), 0), Ok(143));
    }

    #[test]
    fn test_regions() {
        let mut ctx = ConversionContext::new(&score(), &ConversionSettings::plain(480)).unwrap();
        assert_eq!(ctx.region(0), Region::Idle);
        ctx.track_mut(0).seen = true;
        assert_eq!(ctx.region(0), Region::InMeasuredRegion);
        ctx.free_rhythm.enter(0, whole(0), &mut ctx.diagnostics);
        assert_eq!(ctx.region(0), Region::InFreeRhythmRegion);
    }

    #[test]
    fn test_ceiling_only_applies_to_grouped_resolution() {
        let ctx = ConversionContext::new(&score(), &ConversionSettings::plain(480)).unwrap();
        assert_eq!(ctx.check_ceiling(whole(0), 100_000, 0), Ok(()));

        let settings = ConversionSettings {
            resolution: ResolutionMode::Grouped { ceiling: 10 },
            ..ConversionSettings::plain(480)
        };
        let ctx = ConversionContext::new(&score(), &settings).unwrap();
        assert_eq!(ctx.check_ceiling(whole(0), 10, 0), Ok(()));
        assert_eq!(
            ctx.check_ceiling(beats(3, 2), 11, 1),
            Err(ConversionError::TickOverflow {
                measure_start: whole(0),
                track: Some(1),
                required: 11,
                ceiling: 10
            })
        );
    }

    #[test]
    fn test_missing_tempo_is_fatal() {
        let score = Score::new(vec![ScoreEvent::note(whole(0), 0, 60, whole(1))]);
        let result = ConversionContext::new(&score, &ConversionSettings::default());
        assert!(matches!(result, Err(ConversionError::TempoUndefined)));
    }
}
