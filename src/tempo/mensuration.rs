//! Mensural tempo heuristic
//!
//! Scores without a numeric metronome mark often still carry a mensuration
//! sign. Each sign maps to a multiplier of a base reference tempo. The
//! multipliers are empirical calibration values and live in
//! [`MENSURATION_TEMPO_TABLE`]; do not replace them with arithmetic.

use crate::model::{Directive, EventKind, MensurationSign, ScoreProvider, TempoMark};

/// One calibration entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MensurationTempo {
    pub sign: MensurationSign,
    /// Entry applies only when the sign carries the secondary flag
    pub secondary: bool,
    pub multiplier: f64,
}

const fn entry(sign: MensurationSign, secondary: bool, multiplier: f64) -> MensurationTempo {
    MensurationTempo { sign, secondary, multiplier }
}

/// Multipliers of the base tempo, looked up by sign and secondary flag.
/// A sign without a secondary entry uses its plain entry for both.
pub const MENSURATION_TEMPO_TABLE: &[MensurationTempo] = &[
    entry(MensurationSign::Circle, false, 1.0),
    entry(MensurationSign::CutCircle, false, 1.5),
    entry(MensurationSign::C, false, 1.0),
    entry(MensurationSign::CutC, false, 1.25),
    entry(MensurationSign::CutC, true, 1.8965517),
    entry(MensurationSign::C2, false, 1.5),
    entry(MensurationSign::C3, false, 1.5),
    entry(MensurationSign::CutC3, false, 2.0),
    entry(MensurationSign::Circle2, false, 1.5),
    entry(MensurationSign::Circle3, false, 1.5),
    entry(MensurationSign::Three, false, 1.5),
];

pub fn mensural_multiplier(sign: MensurationSign, secondary: bool) -> Option<f64> {
    let lookup = |secondary: bool| {
        MENSURATION_TEMPO_TABLE
            .iter()
            .find(|e| e.sign == sign && e.secondary == secondary)
            .map(|e| e.multiplier)
    };
    if secondary {
        lookup(true).or_else(|| lookup(false))
    } else {
        lookup(false)
    }
}

/// Heuristic tempo marks for every mensuration directive of the score.
pub fn heuristic_marks<P: ScoreProvider + ?Sized>(score: &P, base_tempo: f64) -> Vec<TempoMark> {
    score
        .events()
        .iter()
        .filter_map(|event| match event.kind {
            EventKind::Directive(Directive::Mensuration { sign, secondary }) => {
                let multiplier = mensural_multiplier(sign, secondary)?;
                log::debug!(
                    "mensuration {:?} (secondary: {}) at beat {} -> {} BPM",
                    sign,
                    secondary,
                    event.position,
                    base_tempo * multiplier
                );
                Some(TempoMark::heuristic(event.position, base_tempo * multiplier))
            }
            _ => None,
        })
        .collect()
}
