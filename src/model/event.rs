//! Score events and directives
//!
//! A [`ScoreEvent`] is one token of the parsed score: a note, a rest, or a
//! directive. Directives are already parsed into a tagged union by the score
//! provider, so the conversion core never pattern-matches on tag text.

use serde::{Deserialize, Serialize};

use super::beat::RationalBeat;

/// Index of an output track (one per score spine/part).
pub type TrackId = usize;

/// Role of a note inside a tied group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tie {
    /// Regular note, not part of a tie
    #[default]
    None,
    /// Starts a tie; sounds for the aggregated duration
    Start,
    /// Middle segment of a tie (no sound of its own)
    Continue,
    /// Last segment of a tie (no sound of its own)
    Stop,
}

/// Articulation flags that affect the attack velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Articulations {
    pub accent: bool,
    pub sforzando: bool,
}

impl Articulations {
    pub fn accent() -> Self {
        Self { accent: true, sforzando: false }
    }

    pub fn sforzando() -> Self {
        Self { accent: false, sforzando: true }
    }

    pub fn is_accented(&self) -> bool {
        self.accent || self.sforzando
    }
}

/// Historical mensuration signs understood by the tempo heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MensurationSign {
    /// `O` (tempus perfectum)
    Circle,
    /// `O|`
    CutCircle,
    /// `C` (tempus imperfectum)
    C,
    /// `C|` (alla breve)
    CutC,
    /// `C2`
    C2,
    /// `C3`
    C3,
    /// `C|3`
    CutC3,
    /// `O2`
    Circle2,
    /// `O3`
    Circle3,
    /// Bare proportion `3`
    Three,
}

/// Key mode for key signature records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

/// Parsed score directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Enter an unmetered passage on this track
    FreeRhythm,
    /// Leave the unmetered passage (back to strict rhythm)
    Strict,
    /// Explicitly close free-rhythm notes; `None` closes all of them
    Release(Option<i32>),
    /// Mensuration sign; `secondary` selects the alternate calibration
    Mensuration {
        sign: MensurationSign,
        #[serde(default)]
        secondary: bool,
    },
    /// Scale note durations on this track from here on
    RhythmScale(RationalBeat),
    TimeSignature { numerator: u8, denominator: u8 },
    KeySignature {
        accidentals: i8,
        #[serde(default)]
        mode: Mode,
    },
    /// General MIDI program for the track
    Program(u8),
    /// Pan position (0 = hard left, 64 = center, 127 = hard right)
    Pan(u8),
}

/// Event kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Note,
    Rest,
    Directive(Directive),
}

/// One token of the parsed score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub position: RationalBeat,
    pub track: TrackId,
    pub kind: EventKind,
    /// Semitone number (60 = middle C); `None` for rests and directives
    #[serde(default)]
    pub pitch: Option<i32>,
    #[serde(default)]
    pub duration: RationalBeat,
    #[serde(default)]
    pub tie: Tie,
    #[serde(default)]
    pub articulations: Articulations,
}

impl ScoreEvent {
    pub fn note(position: RationalBeat, track: TrackId, pitch: i32, duration: RationalBeat) -> Self {
        Self {
            position,
            track,
            kind: EventKind::Note,
            pitch: Some(pitch),
            duration,
            tie: Tie::None,
            articulations: Articulations::default(),
        }
    }

    pub fn rest(position: RationalBeat, track: TrackId, duration: RationalBeat) -> Self {
        Self {
            position,
            track,
            kind: EventKind::Rest,
            pitch: None,
            duration,
            tie: Tie::None,
            articulations: Articulations::default(),
        }
    }

    pub fn directive(position: RationalBeat, track: TrackId, directive: Directive) -> Self {
        Self {
            position,
            track,
            kind: EventKind::Directive(directive),
            pitch: None,
            duration: RationalBeat::default(),
            tie: Tie::None,
            articulations: Articulations::default(),
        }
    }

    pub fn with_tie(mut self, tie: Tie) -> Self {
        self.tie = tie;
        self
    }

    pub fn with_articulations(mut self, articulations: Articulations) -> Self {
        self.articulations = articulations;
        self
    }

    pub fn is_note(&self) -> bool {
        matches!(self.kind, EventKind::Note)
    }

    /// True for any segment of a tied group
    pub fn tied(&self) -> bool {
        self.tie != Tie::None
    }

    pub fn directive_ref(&self) -> Option<&Directive> {
        match &self.kind {
            EventKind::Directive(directive) => Some(directive),
            _ => None,
        }
    }
}
