//! Per-track velocity curve over score lines
//!
//! Level marks set the current value; a crescendo or decrescendo mark starts
//! a linear ramp to the next line of the same track that carries a level or
//! another hairpin (or to the last line). The ramp direction always wins:
//! a flat or contradicting target is replaced by a displacement of
//! [`RAMP_DISPLACEMENT`] in the ramp's direction.

use serde::Serialize;

use crate::model::{as_f64, CrescDirection, DynamicMark, RationalBeat, ScoreLines, TrackId};

/// Velocity units a degenerate ramp moves
pub const RAMP_DISPLACEMENT: f64 = 10.0;

/// Target of a ramp from `v0` towards `v1`, corrected to follow `direction`.
pub fn ramp_target(direction: CrescDirection, v0: f64, v1: f64) -> f64 {
    let sign = f64::from(direction.sign());
    if sign == 0.0 || (v1 - v0) * sign > 0.0 {
        v1
    } else {
        v0 + sign * RAMP_DISPLACEMENT
    }
}

fn clamp_velocity(value: f64) -> f64 {
    value.clamp(0.0, 127.0)
}

/// Marks of one track folded onto lines
#[derive(Debug, Clone, Default)]
struct TrackMarks {
    levels: Vec<Option<f64>>,
    hairpins: Vec<CrescDirection>,
    accents: Vec<bool>,
}

impl TrackMarks {
    fn new(lines: usize) -> Self {
        Self {
            levels: vec![None; lines],
            hairpins: vec![CrescDirection::None; lines],
            accents: vec![false; lines],
        }
    }

    fn is_anchor(&self, line: usize) -> bool {
        self.levels[line].is_some() || self.hairpins[line] != CrescDirection::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityCurve {
    positions: Vec<RationalBeat>,
    /// `values[track][line]`, in [0, 127]
    values: Vec<Vec<f64>>,
    accents: Vec<Vec<bool>>,
    default_velocity: f64,
}

impl VelocityCurve {
    pub fn synthesize(lines: &ScoreLines, marks: &[DynamicMark], track_count: usize, default_velocity: u8) -> Self {
        let line_count = lines.len();
        let mut per_track: Vec<TrackMarks> = (0..track_count).map(|_| TrackMarks::new(line_count)).collect();

        for mark in marks {
            let Some(track) = per_track.get_mut(mark.track) else {
                continue;
            };
            let line = match lines.line_at_or_before(mark.position) {
                Some(line) => line,
                None if line_count > 0 => 0,
                None => continue,
            };
            if let Some(level) = mark.level {
                track.levels[line] = Some(f64::from(level.velocity()));
            }
            if mark.cresc != CrescDirection::None {
                track.hairpins[line] = mark.cresc;
            }
            track.accents[line] |= mark.accent;
        }

        let default = f64::from(default_velocity);
        let values = per_track
            .iter()
            .map(|track| Self::synthesize_track(lines, track, default))
            .collect();
        let accents = per_track.into_iter().map(|track| track.accents).collect();

        Self {
            positions: lines.positions().to_vec(),
            values,
            accents,
            default_velocity: default,
        }
    }

    fn synthesize_track(lines: &ScoreLines, marks: &TrackMarks, default: f64) -> Vec<f64> {
        let count = lines.len();
        let time = |line: usize| lines.position(line).map(as_f64).unwrap_or_default();

        let mut values = vec![default; count];
        let mut current = default;
        // Value a ramp arrived with; it replaces the level mark on that line
        let mut arrival: Option<f64> = None;
        let mut line = 0;

        while line < count {
            current = match arrival.take() {
                Some(value) => value,
                None => marks.levels[line].unwrap_or(current),
            };
            values[line] = current;

            let direction = marks.hairpins[line];
            if direction == CrescDirection::None || line + 1 == count {
                line += 1;
                continue;
            }

            let end = (line + 1..count).find(|&j| marks.is_anchor(j)).unwrap_or(count - 1);
            let v0 = current;
            let v1 = ramp_target(direction, v0, marks.levels[end].unwrap_or(v0));
            let (t0, t1) = (time(line), time(end));
            let slope = if t1 > t0 { (v1 - v0) / (t1 - t0) } else { 0.0 };

            for interior in line + 1..end {
                values[interior] = clamp_velocity(v0 + slope * (time(interior) - t0));
            }
            log::debug!("{:?} ramp over lines {}..{}: {} -> {}", direction, line, end, v0, v1);

            arrival = Some(clamp_velocity(v1));
            line = end;
        }
        values
    }

    /// Curve value for `track` at the line at or before `position`, before
    /// per-note shaping.
    pub fn value_at(&self, track: TrackId, position: RationalBeat) -> f64 {
        let Some(values) = self.values.get(track) else {
            return self.default_velocity;
        };
        match self.positions.partition_point(|p| *p <= position).checked_sub(1) {
            Some(line) => values[line],
            None => self.default_velocity,
        }
    }

    /// Whether the track has an accent mark exactly at `position`
    pub fn accent_at(&self, track: TrackId, position: RationalBeat) -> bool {
        let Ok(line) = self.positions.binary_search(&position) else {
            return false;
        };
        self.accents.get(track).map(|a| a[line]).unwrap_or(false)
    }

    /// Dense values of one track
    pub fn track_values(&self, track: TrackId) -> Option<&[f64]> {
        self.values.get(track).map(Vec::as_slice)
    }
}
