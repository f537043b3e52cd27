//! The conversion pass
//!
//! One forward walk over the score's events. Each event's tick is computed
//! first; directives then update track state, notes become NoteOn/NoteOff
//! pairs (or open notes inside a free-rhythm region). At the end every open
//! note is closed, end-of-track markers are appended and the buffer is
//! sorted.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::context::{ConversionContext, Region};
use super::trim::trim_leading_silence;
use crate::defaults::{MILLISECOND_MICROSECONDS_PER_QUARTER, PAN_CONTROLLER};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{ConversionError, Result};
use crate::events::{microseconds_per_quarter, sort_events, TickEvent};
use crate::free_rhythm::{NoteSlot, OpenNote};
use crate::model::{Directive, EventKind, RationalBeat, ScoreEvent, ScoreProvider, Tie};
use crate::settings::{ConversionSettings, TimeBase};
use crate::tempo::{RealTimeline, TempoCurve};
use crate::ticks::TickSchedule;

/// Result of a successful pass
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Sorted by `(tick, priority)`
    pub events: Vec<TickEvent>,
    pub diagnostics: Diagnostics,
    /// Header resolution for the container
    pub ticks_per_quarter: u32,
    pub track_count: usize,
    pub tempo: TempoCurve,
    pub timeline: RealTimeline,
    pub schedule: TickSchedule,
}

/// Convert a score into tick events.
pub fn convert<P: ScoreProvider + ?Sized>(score: &P, settings: &ConversionSettings) -> Result<ConversionOutput> {
    log::info!(
        "converting {} events on {} track(s), {:?}",
        score.events().len(),
        score.track_count(),
        settings.resolution
    );

    let mut ctx = ConversionContext::new(score, settings)?;
    emit_tempo_map(&mut ctx)?;

    let mut meta_seen: HashSet<TickEvent> = HashSet::new();
    for (index, event) in score.events().iter().enumerate() {
        let tick = ctx.tick_at(event.position, event.track)?;
        ctx.track_mut(event.track).seen = true;

        match &event.kind {
            EventKind::Directive(directive) => {
                apply_directive(&mut ctx, score, event, directive, tick, &mut meta_seen)
            }
            EventKind::Rest => {}
            EventKind::Note => emit_note(&mut ctx, score, index, event, tick)?,
        }
    }

    finish(&mut ctx, score, settings)?;

    if let Some(offset) = settings.start_offset {
        let shift = trim_leading_silence(&mut ctx.events, offset);
        log::debug!("trimmed {} ticks of leading silence (start offset {})", shift, offset);
    }

    log::info!(
        "conversion finished: {} events, {} diagnostic(s)",
        ctx.events.len(),
        ctx.diagnostics.len()
    );

    let ticks_per_quarter = ctx.header_ticks_per_quarter();
    let track_count = ctx.tracks.len();
    Ok(ConversionOutput {
        events: ctx.events,
        diagnostics: ctx.diagnostics,
        ticks_per_quarter,
        track_count,
        tempo: ctx.tempo,
        timeline: ctx.timeline,
        schedule: ctx.schedule,
    })
}

fn tempo_at(ctx: &ConversionContext, position: RationalBeat) -> f64 {
    let line = ctx.lines.line_at_or_before(position).unwrap_or(0);
    ctx.tempo.at(line).unwrap_or_default()
}

/// Tempo records at line 0, wherever the resolved tempo changes, and at every
/// resolution group boundary.
///
/// With grouped resolution a tick is a different fraction of a beat in each
/// group, so the record is scaled by `header / group` resolution to keep
/// wall-clock time right.
fn emit_tempo_map(ctx: &mut ConversionContext) -> Result<()> {
    if ctx.time_base == TimeBase::Milliseconds {
        ctx.push(TickEvent::TempoChange { tick: 0, microseconds_per_quarter: MILLISECOND_MICROSECONDS_PER_QUARTER });
        return Ok(());
    }

    let header = f64::from(ctx.schedule.header_ticks_per_quarter());

    let mut change_points: Vec<RationalBeat> = Vec::new();
    for line in 0..ctx.lines.len() {
        let changed = line == 0 || ctx.tempo.at(line) != ctx.tempo.at(line - 1);
        if let (true, Some(position)) = (changed, ctx.lines.position(line)) {
            change_points.push(if line == 0 { RationalBeat::default() } else { position });
        }
    }
    change_points.extend(ctx.schedule.groups().iter().map(|g| g.start));
    change_points.sort();
    change_points.dedup();

    let mut records: BTreeMap<u64, u32> = BTreeMap::new();
    for position in change_points {
        let bpm = tempo_at(ctx, position);
        let group_tpq = f64::from(ctx.schedule.ticks_per_quarter_at(position));
        let micros = microseconds_per_quarter(bpm * group_tpq / header);
        log::debug!("tempo {} BPM at beat {} ({} us per quarter)", bpm, position, micros);
        records.insert(ctx.tick_at_unowned(position)?, micros);
    }

    let mut previous = None;
    for (tick, micros) in records {
        if previous != Some(micros) {
            ctx.push(TickEvent::TempoChange { tick, microseconds_per_quarter: micros });
            previous = Some(micros);
        }
    }
    Ok(())
}

fn apply_directive<P: ScoreProvider + ?Sized>(
    ctx: &mut ConversionContext,
    score: &P,
    event: &ScoreEvent,
    directive: &Directive,
    tick: u64,
    meta_seen: &mut HashSet<TickEvent>,
) {
    let track = event.track;
    match directive {
        Directive::FreeRhythm => {
            log::debug!("track {} enters free rhythm at beat {}", track, event.position);
            ctx.free_rhythm.enter(track, event.position, &mut ctx.diagnostics);
        }
        Directive::Strict if ctx.region(track) != Region::InFreeRhythmRegion => {
            log::debug!("track {} is already strict at beat {}", track, event.position);
        }
        Directive::Strict => {
            log::debug!("track {} leaves free rhythm at beat {}", track, event.position);
            let closed = ctx.free_rhythm.leave(track, tick, event.position, &mut ctx.diagnostics);
            ctx.events.extend(closed);
        }
        Directive::Release(pitch) => {
            let pitch = match pitch.map(u8::try_from) {
                None => None,
                Some(Ok(pitch)) if pitch <= 127 => Some(pitch),
                Some(_) => {
                    log::warn!("ignoring release of invalid pitch {:?} at beat {}", pitch, event.position);
                    return;
                }
            };
            let closed = ctx.free_rhythm.release(track, pitch, tick);
            ctx.events.extend(closed);
        }
        Directive::Mensuration { sign, secondary } => {
            // already folded into the tempo curve
            log::debug!("mensuration {:?} (secondary: {}) at beat {}", sign, secondary, event.position);
        }
        Directive::RhythmScale(scale) => {
            if *scale > RationalBeat::default() {
                ctx.track_mut(track).rhythm_scale = *scale;
            } else {
                log::warn!("ignoring non-positive rhythm scale {} at beat {}", scale, event.position);
            }
        }
        Directive::TimeSignature { numerator, denominator } => {
            let record = TickEvent::TimeSignature { tick, numerator: *numerator, denominator: *denominator };
            if meta_seen.insert(record) {
                ctx.push(record);
            }
        }
        Directive::KeySignature { accidentals, mode } => {
            let record = TickEvent::KeySignature { tick, accidentals: *accidentals, mode: *mode };
            if meta_seen.insert(record) {
                ctx.push(record);
            }
        }
        Directive::Program(program) => ctx.push(TickEvent::ProgramChange {
            tick,
            track,
            channel: score.channel(track),
            program: program & 0x7f,
        }),
        Directive::Pan(value) => ctx.push(TickEvent::Controller {
            tick,
            track,
            channel: score.channel(track),
            controller: PAN_CONTROLLER,
            value: value & 0x7f,
        }),
    }
}

fn emit_note<P: ScoreProvider + ?Sized>(
    ctx: &mut ConversionContext,
    score: &P,
    index: usize,
    event: &ScoreEvent,
    tick: u64,
) -> Result<()> {
    let Some(pitch) = event.pitch else {
        return Ok(());
    };
    if matches!(event.tie, Tie::Continue | Tie::Stop) {
        return Ok(());
    }
    let pitch = u8::try_from(pitch).ok().filter(|p| *p <= 127).ok_or_else(|| {
        ConversionError::InvalidScore(format!(
            "pitch {} at beat {} on track {} is outside 0..=127",
            pitch, event.position, event.track
        ))
    })?;

    let track = event.track;
    let channel = score.channel(track);

    let written = if event.tie == Tie::Start { score.tied_duration(index) } else { event.duration };
    let scale = ctx.track_mut(track).rhythm_scale;
    let duration = written * scale;

    let base = ctx.velocities.value_at(track, event.position);
    let accented = event.articulations.is_accented() || ctx.velocities.accent_at(track, event.position);
    let velocity = ctx.shaper.shape(track, base, score.metric_level(event.position), accented);

    ctx.push(TickEvent::NoteOn { tick, track, channel, pitch, velocity });

    if ctx.region(track) == Region::InFreeRhythmRegion {
        let note = OpenNote { slot: NoteSlot { channel, pitch }, since_tick: tick, position: event.position };
        if let Some(closed) = ctx.free_rhythm.register(track, note) {
            ctx.push(closed);
        }
        return Ok(());
    }

    let mut length = ctx.duration_ticks(event.position, duration, track)?;
    if length <= 0 {
        let message = format!("note {} computes to {} ticks; stretched to 1", pitch, length);
        ctx.diagnostics.add(
            Diagnostic::new(DiagnosticKind::ZeroDurationNote, event.position, message).with_track(track),
        );
        length = 1;
    }
    ctx.check_ceiling(event.position, length, track)?;
    ctx.push(TickEvent::NoteOff { tick: tick + length as u64, track, channel, pitch });
    Ok(())
}

/// Close open notes and append end-of-track markers.
fn finish<P: ScoreProvider + ?Sized>(
    ctx: &mut ConversionContext,
    score: &P,
    settings: &ConversionSettings,
) -> Result<()> {
    let total = score.total_length();
    let last_event = ctx.events.iter().map(TickEvent::tick).max().unwrap_or(0);
    let final_tick = ctx.tick_at_unowned(total)?.max(last_event);

    let closed = ctx.free_rhythm.close_all(final_tick, total, &mut ctx.diagnostics);
    ctx.events.extend(closed);

    let end = final_tick + u64::from(settings.end_padding_ticks.max(1));
    for track in 0..ctx.tracks.len() {
        ctx.push(TickEvent::EndOfTrack { tick: end, track });
    }

    sort_events(&mut ctx.events);
    Ok(())
}
