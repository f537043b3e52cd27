//! Tick schedule: which resolution is active where
//!
//! A uniform schedule has one group at beat 0. A grouped schedule (built by
//! [`super::grouping`]) switches resolution at measure boundaries; ticks keep
//! accumulating across groups so the stream stays monotonic.

use serde::Serialize;

use super::resolution::{to_ticks, ResolutionMismatch};
use crate::model::RationalBeat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionGroup {
    pub start: RationalBeat,
    pub start_tick: i64,
    pub ticks_per_quarter: u32,
}

/// Piecewise-constant resolution over the piece. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSchedule {
    groups: Vec<ResolutionGroup>,
}

impl TickSchedule {
    pub fn uniform(ticks_per_quarter: u32) -> Self {
        Self {
            groups: vec![ResolutionGroup {
                start: RationalBeat::default(),
                start_tick: 0,
                ticks_per_quarter,
            }],
        }
    }

    /// Build a schedule from `(start, ticks_per_quarter)` pairs in order.
    ///
    /// Each group's start tick is the previous group's start tick plus the
    /// previous group's span at its own resolution, so every span must be a
    /// whole number of ticks.
    pub fn from_groups(
        starts: &[(RationalBeat, u32)],
        fallback_ticks_per_quarter: u32,
    ) -> Result<Self, ResolutionMismatch> {
        let Some(&(first_start, first_tpq)) = starts.first() else {
            return Ok(Self::uniform(fallback_ticks_per_quarter));
        };
        let mut groups = vec![ResolutionGroup {
            start: first_start,
            start_tick: to_ticks(first_start, first_tpq)?,
            ticks_per_quarter: first_tpq,
        }];
        for &(start, ticks_per_quarter) in &starts[1..] {
            let prev = groups[groups.len() - 1];
            let start_tick = prev.start_tick + to_ticks(start - prev.start, prev.ticks_per_quarter)?;
            groups.push(ResolutionGroup { start, start_tick, ticks_per_quarter });
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[ResolutionGroup] {
        &self.groups
    }

    pub fn is_uniform(&self) -> bool {
        self.groups.len() == 1
    }

    /// Resolution written to the container header
    pub fn header_ticks_per_quarter(&self) -> u32 {
        self.groups[0].ticks_per_quarter
    }

    fn group_index(&self, beat: RationalBeat) -> usize {
        self.groups.partition_point(|g| g.start <= beat).saturating_sub(1)
    }

    /// Group active at `beat`
    pub fn group_at(&self, beat: RationalBeat) -> &ResolutionGroup {
        &self.groups[self.group_index(beat)]
    }

    pub fn ticks_per_quarter_at(&self, beat: RationalBeat) -> u32 {
        self.group_at(beat).ticks_per_quarter
    }

    pub fn tick_at(&self, beat: RationalBeat) -> Result<i64, ResolutionMismatch> {
        let group = &self.groups[self.group_index(beat)];
        Ok(group.start_tick + to_ticks(beat - group.start, group.ticks_per_quarter)?)
    }

    /// Ticks covered by `duration` starting at `start`.
    ///
    /// Inside one group this is a plain conversion at the group's resolution;
    /// across a boundary it is the distance between the two tick positions.
    pub fn duration_ticks(&self, start: RationalBeat, duration: RationalBeat) -> Result<i64, ResolutionMismatch> {
        let index = self.group_index(start);
        let end = start + duration;
        if self.group_index(end) == index {
            to_ticks(duration, self.groups[index].ticks_per_quarter)
        } else {
            Ok(self.tick_at(end)? - self.tick_at(start)?)
        }
    }
}
