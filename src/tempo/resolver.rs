//! Tempo curve resolution
//!
//! Sparse tempo marks become a dense curve with one positive value per score
//! line: values are placed at their line, carried forward, and the lines
//! before the first mark take the first defined value.

use serde::Serialize;

use crate::error::{ConversionError, Result};
use crate::model::{ScoreLines, TempoMark, TempoSource};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TempoCurve {
    values: Vec<f64>,
}

impl TempoCurve {
    /// Resolve `marks` over `lines`.
    ///
    /// An explicit mark wins over a heuristic one on the same line; among
    /// marks of the same source the later one wins. Marks between lines land
    /// on the line before them, marks before the first line on line 0.
    pub fn resolve(lines: &ScoreLines, marks: &[TempoMark]) -> Result<Self> {
        let mut raw = vec![0.0; lines.len()];
        let mut explicit_at = vec![false; lines.len()];

        for mark in marks {
            if !(mark.beats_per_minute.is_finite() && mark.beats_per_minute > 0.0) {
                log::warn!("ignoring tempo mark of {} BPM at beat {}", mark.beats_per_minute, mark.position);
                continue;
            }
            let line = match lines.line_at_or_before(mark.position) {
                Some(line) => line,
                None if !lines.is_empty() => 0,
                None => continue,
            };
            match mark.source {
                TempoSource::Explicit => {
                    raw[line] = mark.beats_per_minute;
                    explicit_at[line] = true;
                }
                TempoSource::MensuralHeuristic if !explicit_at[line] => raw[line] = mark.beats_per_minute,
                TempoSource::MensuralHeuristic => {}
            }
        }

        Self::from_raw(raw)
    }

    /// Fill a raw array where `0.0` means undefined.
    pub fn from_raw(mut values: Vec<f64>) -> Result<Self> {
        for i in 1..values.len() {
            if values[i] <= 0.0 {
                values[i] = values[i - 1];
            }
        }
        for i in (0..values.len().saturating_sub(1)).rev() {
            if values[i] <= 0.0 {
                values[i] = values[i + 1];
            }
        }
        if values.is_empty() || values.iter().any(|v| *v <= 0.0) {
            return Err(ConversionError::TempoUndefined);
        }
        Ok(Self { values })
    }

    /// Tempo at a line (BPM)
    pub fn at(&self, line: usize) -> Option<f64> {
        self.values.get(line).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
