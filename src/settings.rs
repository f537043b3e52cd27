//! Conversion settings
//!
//! Every knob of a conversion pass lives in [`ConversionSettings`]. The struct
//! is serde-friendly so the surrounding tool can keep it in a JSON config file;
//! missing fields fall back to [`crate::defaults`].

use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::error::{ConversionError, Result};

/// How beat positions map onto ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// One global ticks-per-quarter value
    Fixed { ticks_per_quarter: u32 },
    /// Per-measure resolution groups below a per-event tick ceiling
    Grouped {
        #[serde(default = "legacy_tick_ceiling")]
        ceiling: u32,
    },
}

fn legacy_tick_ceiling() -> u32 {
    LEGACY_TICK_CEILING
}

impl Default for ResolutionMode {
    fn default() -> Self {
        ResolutionMode::Fixed { ticks_per_quarter: DEFAULT_TPQ }
    }
}

impl ResolutionMode {
    /// Grouped resolution under the legacy container's ceiling
    pub fn grouped() -> Self {
        ResolutionMode::Grouped { ceiling: LEGACY_TICK_CEILING }
    }
}

/// Which clock the emitted ticks follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Musical ticks; tempo travels as tempo-change records
    #[default]
    Metrical,
    /// One tick per millisecond of the resolved tempo timeline
    Milliseconds,
}

/// Configuration options for conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    pub resolution: ResolutionMode,

    pub time_base: TimeBase,

    /// Reference tempo (BPM) that mensuration multipliers scale
    pub mensural_base_tempo: f64,

    /// Velocity for tracks before their first dynamic mark
    pub default_velocity: u8,

    /// Velocity added on strong beats, subtracted off the beat
    pub metric_bias: i32,

    /// Maximum humanization jitter (uniform in `[-humanize, humanize]`)
    pub humanize: i32,

    /// Velocity added to accented notes
    pub accent_bump: i32,

    /// Seed for the humanization streams
    pub seed: u64,

    /// Distance of the end-of-track markers after the last event (min 1)
    pub end_padding_ticks: u32,

    /// When set, shift the finished buffer so the first note starts here
    pub start_offset: Option<u64>,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            resolution: ResolutionMode::default(),
            time_base: TimeBase::default(),
            mensural_base_tempo: DEFAULT_MENSURAL_BASE_TEMPO,
            default_velocity: DEFAULT_VELOCITY,
            metric_bias: DEFAULT_METRIC_BIAS,
            humanize: 0,
            accent_bump: DEFAULT_ACCENT_BUMP,
            seed: DEFAULT_SEED,
            end_padding_ticks: DEFAULT_END_PADDING_TICKS,
            start_offset: None,
        }
    }
}

impl ConversionSettings {
    /// Settings with a fixed resolution and no velocity shaping: handy when
    /// exact velocities matter.
    pub fn plain(ticks_per_quarter: u32) -> Self {
        Self {
            resolution: ResolutionMode::Fixed { ticks_per_quarter },
            metric_bias: 0,
            humanize: 0,
            accent_bump: 0,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: ConversionSettings =
            serde_json::from_str(json).map_err(|e| ConversionError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        match self.resolution {
            ResolutionMode::Fixed { ticks_per_quarter: 0 } => {
                return Err(ConversionError::Settings("ticks_per_quarter must be positive".into()));
            }
            ResolutionMode::Grouped { ceiling: 0 } => {
                return Err(ConversionError::Settings("tick ceiling must be positive".into()));
            }
            _ => {}
        }
        if !(self.mensural_base_tempo.is_finite() && self.mensural_base_tempo > 0.0) {
            return Err(ConversionError::Settings("mensural_base_tempo must be positive".into()));
        }
        if self.humanize < 0 {
            return Err(ConversionError::Settings("humanize must not be negative".into()));
        }
        Ok(())
    }
}
