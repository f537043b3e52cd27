//! Real-time offsets
//!
//! Integrates the resolved tempo curve over the score lines so consumers can
//! ask for wall-clock seconds instead of ticks.

use serde::Serialize;

use super::resolver::TempoCurve;
use crate::model::{as_f64, RationalBeat, ScoreLines};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealTimeline {
    positions: Vec<RationalBeat>,
    tempi: Vec<f64>,
    /// Seconds at each line, from beat 0
    seconds: Vec<f64>,
    total_seconds: f64,
}

fn span_seconds(beats: RationalBeat, beats_per_minute: f64) -> f64 {
    as_f64(beats) * 60.0 / beats_per_minute
}

impl RealTimeline {
    /// `curve` must cover `lines` (one value per line).
    pub fn build(lines: &ScoreLines, curve: &TempoCurve) -> Self {
        let positions = lines.positions().to_vec();
        let tempi: Vec<f64> = (0..positions.len()).map(|i| curve.at(i).unwrap_or(120.0)).collect();

        let mut seconds = Vec::with_capacity(positions.len());
        if let (Some(first), Some(tempo)) = (positions.first(), tempi.first()) {
            let lead_in = if *first > RationalBeat::default() { span_seconds(*first, *tempo) } else { 0.0 };
            seconds.push(lead_in);
        }
        for line in 1..positions.len() {
            let previous = seconds[line - 1];
            seconds.push(previous + span_seconds(lines.duration(line - 1), tempi[line - 1]));
        }

        let mut timeline = Self { positions, tempi, seconds, total_seconds: 0.0 };
        timeline.total_seconds = timeline.seconds_at(lines.total_length());
        timeline
    }

    /// Seconds from beat 0 to `beat`, interpolated inside a line.
    pub fn seconds_at(&self, beat: RationalBeat) -> f64 {
        let zero = RationalBeat::default();
        let beat = beat.max(zero);
        let index = self.positions.partition_point(|p| *p <= beat);
        match index.checked_sub(1) {
            Some(line) => self.seconds[line] + span_seconds(beat - self.positions[line], self.tempi[line]),
            None => match self.tempi.first() {
                Some(tempo) => span_seconds(beat, *tempo),
                None => span_seconds(beat, 120.0),
            },
        }
    }

    /// Seconds at each line
    pub fn seconds(&self) -> &[f64] {
        &self.seconds
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{beats, whole};

    #[test]
    fn test_constant_tempo() {
        let lines = ScoreLines::from_positions(vec![whole(0), whole(1), whole(2)], whole(4));
        let curve = TempoCurve::from_raw(vec![120.0, 0.0, 0.0]).unwrap();
        let timeline = RealTimeline::build(&lines, &curve);
        assert_eq!(timeline.seconds(), &[0.0, 0.5, 1.0]);
        assert_eq!(timeline.seconds_at(beats(5, 2)), 1.25);
        assert_eq!(timeline.total_seconds(), 2.0);
    }

    #[test]
    fn test_tempo_change_integrates_per_line() {
        let lines = ScoreLines::from_positions(vec![whole(0), whole(2)], whole(4));
        let curve = TempoCurve::from_raw(vec![60.0, 120.0]).unwrap();
        let timeline = RealTimeline::build(&lines, &curve);
        assert_eq!(timeline.seconds(), &[0.0, 2.0]);
        assert_eq!(timeline.seconds_at(whole(3)), 2.5);
        assert_eq!(timeline.total_seconds(), 3.0);
    }

    #[test]
    fn test_lead_in_before_first_line() {
        let lines = ScoreLines::from_positions(vec![whole(1)], whole(2));
        let curve = TempoCurve::from_raw(vec![60.0]).unwrap();
        let timeline = RealTimeline::build(&lines, &curve);
        assert_eq!(timeline.seconds(), &[1.0]);
        assert_eq!(timeline.seconds_at(beats(1, 2)), 0.5);
    }

    #[test]
    fn test_monotonic() {
        let positions: Vec<_> = (0..16).map(|i| beats(i, 3)).collect();
        let lines = ScoreLines::from_positions(positions, whole(6));
        let raw = (0..16).map(|i| if i % 5 == 0 { 40.0 + 13.0 * i as f64 } else { 0.0 }).collect();
        let curve = TempoCurve::from_raw(raw).unwrap();
        let timeline = RealTimeline::build(&lines, &curve);
        assert!(timeline.seconds().windows(2).all(|w| w[0] <= w[1]));
        assert!(timeline.total_seconds() >= timeline.seconds()[15]);
    }
}
