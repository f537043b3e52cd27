//! Sparse tempo and dynamic annotations

use serde::{Deserialize, Serialize};

use super::beat::RationalBeat;
use super::event::TrackId;

/// Where a tempo value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoSource {
    /// Numeric metronome mark in the score
    Explicit,
    /// Derived from a mensuration sign
    MensuralHeuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoMark {
    pub position: RationalBeat,
    pub beats_per_minute: f64,
    pub source: TempoSource,
}

impl TempoMark {
    pub fn explicit(position: RationalBeat, beats_per_minute: f64) -> Self {
        Self { position, beats_per_minute, source: TempoSource::Explicit }
    }

    pub fn heuristic(position: RationalBeat, beats_per_minute: f64) -> Self {
        Self { position, beats_per_minute, source: TempoSource::MensuralHeuristic }
    }
}

/// Notated dynamic level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicLevel {
    Pppp,
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
    Ffff,
}

/// Attack velocity for each level, pppp through ffff
const LEVEL_VELOCITIES: [u8; 10] = [15, 25, 35, 50, 64, 80, 96, 112, 120, 127];

impl DynamicLevel {
    pub const ALL: [DynamicLevel; 10] = [
        DynamicLevel::Pppp,
        DynamicLevel::Ppp,
        DynamicLevel::Pp,
        DynamicLevel::P,
        DynamicLevel::Mp,
        DynamicLevel::Mf,
        DynamicLevel::F,
        DynamicLevel::Ff,
        DynamicLevel::Fff,
        DynamicLevel::Ffff,
    ];

    pub fn velocity(self) -> u8 {
        LEVEL_VELOCITIES[self as usize]
    }
}

/// Hairpin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrescDirection {
    #[default]
    None,
    Cresc,
    Decresc,
}

impl CrescDirection {
    /// +1 for crescendo, -1 for decrescendo, 0 otherwise
    pub fn sign(self) -> i32 {
        match self {
            CrescDirection::None => 0,
            CrescDirection::Cresc => 1,
            CrescDirection::Decresc => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicMark {
    pub position: RationalBeat,
    pub track: TrackId,
    #[serde(default)]
    pub level: Option<DynamicLevel>,
    #[serde(default)]
    pub cresc: CrescDirection,
    #[serde(default)]
    pub accent: bool,
}

impl DynamicMark {
    pub fn level(position: RationalBeat, track: TrackId, level: DynamicLevel) -> Self {
        Self { position, track, level: Some(level), cresc: CrescDirection::None, accent: false }
    }

    pub fn hairpin(position: RationalBeat, track: TrackId, cresc: CrescDirection) -> Self {
        Self { position, track, level: None, cresc, accent: false }
    }

    pub fn accent(position: RationalBeat, track: TrackId) -> Self {
        Self { position, track, level: None, cresc: CrescDirection::None, accent: true }
    }
}
