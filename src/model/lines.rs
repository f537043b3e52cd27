//! Score lines: the distinct positions of a score
//!
//! Tempo and dynamics curves are dense arrays indexed by line, i.e. by the
//! sorted set of positions that carry an event, a tempo mark or a dynamic mark.

use super::beat::RationalBeat;
use super::score::ScoreProvider;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreLines {
    positions: Vec<RationalBeat>,
    total_length: RationalBeat,
}

impl ScoreLines {
    pub fn collect<P: ScoreProvider + ?Sized>(score: &P) -> Self {
        let mut positions: Vec<RationalBeat> = score
            .events()
            .iter()
            .map(|e| e.position)
            .chain(score.tempo_marks().iter().map(|m| m.position))
            .chain(score.dynamic_marks().iter().map(|m| m.position))
            .collect();
        positions.sort();
        positions.dedup();
        Self { positions, total_length: score.total_length() }
    }

    pub fn from_positions(mut positions: Vec<RationalBeat>, total_length: RationalBeat) -> Self {
        positions.sort();
        positions.dedup();
        Self { positions, total_length }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[RationalBeat] {
        &self.positions
    }

    pub fn position(&self, line: usize) -> Option<RationalBeat> {
        self.positions.get(line).copied()
    }

    /// Line index of an exact position
    pub fn index_of(&self, position: RationalBeat) -> Option<usize> {
        self.positions.binary_search(&position).ok()
    }

    /// Last line at or before `position`
    pub fn line_at_or_before(&self, position: RationalBeat) -> Option<usize> {
        self.positions.partition_point(|p| *p <= position).checked_sub(1)
    }

    /// Beats from this line to the next one (or to the end of the piece for
    /// the last line), never negative.
    pub fn duration(&self, line: usize) -> RationalBeat {
        let Some(start) = self.position(line) else {
            return RationalBeat::default();
        };
        let end = self.position(line + 1).unwrap_or(self.total_length);
        if end > start { end - start } else { RationalBeat::default() }
    }

    pub fn total_length(&self) -> RationalBeat {
        self.total_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::beat::{beats, whole};

    #[test]
    fn test_lookup() {
        let lines = ScoreLines::from_positions(vec![whole(2), whole(0), beats(1, 2), whole(2)], whole(4));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.index_of(beats(1, 2)), Some(1));
        assert_eq!(lines.index_of(whole(1)), None);
        assert_eq!(lines.line_at_or_before(whole(1)), Some(1));
        assert_eq!(lines.line_at_or_before(beats(-1, 2)), None);
        assert_eq!(lines.duration(0), beats(1, 2));
        assert_eq!(lines.duration(2), whole(2));
        assert_eq!(lines.duration(3), whole(0));
    }
}
