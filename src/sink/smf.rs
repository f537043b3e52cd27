use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use super::{EventSink, SinkError};
use crate::events::TickEvent;
use crate::model::Mode;

/// Builds a Standard MIDI File (format 1): a conductor track with the tempo,
/// time and key signature map, then one track per score track.
#[derive(Debug, Default)]
pub struct SmfSink {
    smf: Option<Smf<'static>>,
}

impl SmfSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn smf(&self) -> Option<&Smf<'static>> {
        self.smf.as_ref()
    }

    pub fn into_smf(self) -> Option<Smf<'static>> {
        self.smf
    }
}

const MAX_DELTA: u64 = 0x0fff_ffff;
const MAX_TICKS_PER_QUARTER: u32 = 0x7fff;

fn delta(tick: u64) -> Result<u28, SinkError> {
    if tick > MAX_DELTA {
        return Err(SinkError::Tick(tick));
    }
    Ok(u28::from(tick as u32))
}

/// Absolute `(tick, kind)` pairs to a track with delta times.
fn to_track(mut timed: Vec<(u64, TrackEventKind<'static>)>, end_tick: u64) -> Result<Track<'static>, SinkError> {
    timed.push((end_tick, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    let mut track = Vec::with_capacity(timed.len());
    let mut prev_tick = 0u64;
    for (tick, kind) in timed {
        track.push(TrackEvent { delta: delta(tick.saturating_sub(prev_tick))?, kind });
        prev_tick = prev_tick.max(tick);
    }
    Ok(track)
}

fn midi(channel: u8, message: MidiMessage) -> TrackEventKind<'static> {
    TrackEventKind::Midi { channel: u4::from(channel & 0x0f), message }
}

fn denominator_power(denominator: u8) -> u8 {
    // 4 -> 2, 8 -> 3
    denominator.max(1).ilog2() as u8
}

impl EventSink for SmfSink {
    fn write(&mut self, ticks_per_quarter: u32, events: &[TickEvent]) -> Result<(), SinkError> {
        if ticks_per_quarter == 0 || ticks_per_quarter > MAX_TICKS_PER_QUARTER {
            return Err(SinkError::Resolution(ticks_per_quarter));
        }
        let tpq = u15::from(ticks_per_quarter as u16);

        let track_count = events.iter().filter_map(TickEvent::track).map(|t| t + 1).max().unwrap_or(0);
        let mut conductor = Vec::new();
        let mut parts: Vec<Vec<(u64, TrackEventKind<'static>)>> = vec![Vec::new(); track_count];
        let mut part_ends = vec![0u64; track_count];
        let mut last_tick = 0u64;

        for event in events {
            let tick = event.tick();
            last_tick = last_tick.max(tick);
            match *event {
                TickEvent::NoteOn { track, channel, pitch, velocity, .. } => parts[track].push((
                    tick,
                    midi(channel, MidiMessage::NoteOn { key: u7::from(pitch & 0x7f), vel: u7::from(velocity & 0x7f) }),
                )),
                TickEvent::NoteOff { track, channel, pitch, .. } => parts[track].push((
                    tick,
                    midi(channel, MidiMessage::NoteOff { key: u7::from(pitch & 0x7f), vel: u7::from(0) }),
                )),
                TickEvent::ProgramChange { track, channel, program, .. } => parts[track]
                    .push((tick, midi(channel, MidiMessage::ProgramChange { program: u7::from(program & 0x7f) }))),
                TickEvent::Controller { track, channel, controller, value, .. } => parts[track].push((
                    tick,
                    midi(
                        channel,
                        MidiMessage::Controller { controller: u7::from(controller & 0x7f), value: u7::from(value & 0x7f) },
                    ),
                )),
                TickEvent::TempoChange { microseconds_per_quarter, .. } => conductor.push((
                    tick,
                    TrackEventKind::Meta(MetaMessage::Tempo(microseconds_per_quarter.min(0x00ff_ffff).into())),
                )),
                TickEvent::TimeSignature { numerator, denominator, .. } => conductor.push((
                    tick,
                    TrackEventKind::Meta(MetaMessage::TimeSignature(
                        numerator,
                        denominator_power(denominator),
                        24, // MIDI clocks per metronome click
                        8,  // 32nd notes per quarter note
                    )),
                )),
                TickEvent::KeySignature { accidentals, mode, .. } => conductor.push((
                    tick,
                    TrackEventKind::Meta(MetaMessage::KeySignature(accidentals, mode == Mode::Minor)),
                )),
                TickEvent::EndOfTrack { track, .. } => part_ends[track] = part_ends[track].max(tick),
            }
        }

        let mut tracks = Vec::with_capacity(track_count + 1);
        tracks.push(to_track(conductor, last_tick)?);
        for (timed, end) in parts.into_iter().zip(part_ends) {
            let end = timed.last().map(|(tick, _)| *tick).unwrap_or(0).max(end);
            tracks.push(to_track(timed, end)?);
        }

        let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(tpq)));
        smf.tracks = tracks;
        log::debug!("built SMF with {} track(s) at {} ticks per quarter", smf.tracks.len(), ticks_per_quarter);
        self.smf = Some(smf);
        Ok(())
    }
}
