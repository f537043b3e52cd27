//! Local resolution grouping
//!
//! Legacy containers cap the tick value of a single event (999). Rather than
//! one global resolution fine enough for the whole piece, each measure gets
//! its minimal exact resolution (LCM of the rhythmic denominators it
//! contains) and adjacent measures share a group while the group's longest
//! event still fits below the ceiling.
//!
//! ```text
//! measures:  | 4/4 quarters | 4/4 quarters | triplets | 4/4 |
//! minimal:        1              1             3         1
//! groups:    [ tpq 1 ..................... ] [ tpq 3 ....... ]   (ceiling permitting)
//! ```

use super::schedule::TickSchedule;
use crate::error::{ConversionError, Result};
use crate::model::beat::lcm;
use crate::model::{EventKind, RationalBeat, ScoreProvider};

/// Resolution needs of one measure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureResolution {
    pub start: RationalBeat,
    /// Smallest ticks-per-quarter that places everything exactly
    pub minimal_ticks_per_quarter: u64,
    /// Longest single event duration
    pub longest: RationalBeat,
}

impl MeasureResolution {
    /// Ticks the longest event spans at `ticks_per_quarter`, rounded up and
    /// saturating at `u64::MAX`.
    fn required_ticks(&self, ticks_per_quarter: u64) -> u64 {
        let numer = i128::from(*self.longest.numer()) * i128::from(ticks_per_quarter);
        let denom = i128::from(*self.longest.denom());
        let ticks = numer / denom + i128::from(numer % denom > 0);
        u64::try_from(ticks.max(0)).unwrap_or(u64::MAX)
    }
}

fn denominator(value: RationalBeat) -> u64 {
    value.denom().unsigned_abs()
}

/// LCM that pins at `u64::MAX`; anything that large is past every ceiling.
fn widen(ticks_per_quarter: u64, denominator: u64) -> u64 {
    lcm(ticks_per_quarter, denominator).unwrap_or(u64::MAX)
}

/// Scan the score measure by measure and compute each measure's needs.
pub fn measure_resolutions<P: ScoreProvider + ?Sized>(score: &P) -> Vec<MeasureResolution> {
    let zero = RationalBeat::default();
    let total = score.total_length();

    let mut starts: Vec<RationalBeat> =
        score.measure_starts().iter().copied().filter(|s| *s >= zero && *s < total).collect();
    if starts.first() != Some(&zero) {
        starts.insert(0, zero);
    }

    let events = score.events();
    let tempo_marks = score.tempo_marks();
    let mut measures = Vec::with_capacity(starts.len());

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(total);
        let length = if end > start { end - start } else { zero };

        let mut minimal = denominator(length);
        let mut longest = zero;

        let in_measure = |position: RationalBeat| position >= start && (position < end || i + 1 == starts.len());

        for event in events.iter().filter(|e| in_measure(e.position)) {
            minimal = widen(minimal, denominator(event.position - start));
            if matches!(event.kind, EventKind::Note | EventKind::Rest) {
                minimal = widen(minimal, denominator(event.duration));
                longest = longest.max(event.duration);
            }
        }
        for mark in tempo_marks.iter().filter(|m| in_measure(m.position)) {
            minimal = widen(minimal, denominator(mark.position - start));
        }

        measures.push(MeasureResolution {
            start,
            minimal_ticks_per_quarter: minimal.max(1),
            longest,
        });
    }
    measures
}

/// Coalesce measures into resolution groups under `ceiling`.
///
/// Fails with [`ConversionError::TickOverflow`] when one measure alone needs
/// more than `ceiling` ticks for a single event.
pub fn group_resolutions<P: ScoreProvider + ?Sized>(score: &P, ceiling: u32) -> Result<TickSchedule> {
    let measures = measure_resolutions(score);
    let ceiling_ticks = u64::from(ceiling);

    // (start, tpq, longest) per group
    let mut groups: Vec<(RationalBeat, u64, RationalBeat)> = Vec::new();
    for measure in &measures {
        let alone = measure.required_ticks(measure.minimal_ticks_per_quarter);
        if alone > ceiling_ticks {
            return Err(ConversionError::TickOverflow {
                measure_start: measure.start,
                track: None,
                required: alone,
                ceiling,
            });
        }

        if let Some((_, tpq, longest)) = groups.last_mut() {
            let merged_tpq = widen(*tpq, measure.minimal_ticks_per_quarter);
            let merged_longest = (*longest).max(measure.longest);
            let merged = MeasureResolution {
                start: measure.start,
                minimal_ticks_per_quarter: merged_tpq,
                longest: merged_longest,
            };
            if merged.required_ticks(merged_tpq) <= ceiling_ticks {
                *tpq = merged_tpq;
                *longest = merged_longest;
                continue;
            }
        }
        groups.push((measure.start, measure.minimal_ticks_per_quarter, measure.longest));
    }

    let mut starts = Vec::with_capacity(groups.len());
    for (start, tpq, _) in &groups {
        let tpq = u32::try_from(*tpq).map_err(|_| ConversionError::TickOverflow {
            measure_start: *start,
            track: None,
            required: *tpq,
            ceiling,
        })?;
        starts.push((*start, tpq));
    }

    for (start, tpq) in &starts {
        log::debug!("resolution group at beat {}: {} ticks per quarter", start, tpq);
    }

    TickSchedule::from_groups(&starts, 1).map_err(|e| ConversionError::ResolutionMismatch {
        position: e.beats,
        beats: e.beats,
        track: None,
        ticks_per_quarter: e.ticks_per_quarter,
    })
}
