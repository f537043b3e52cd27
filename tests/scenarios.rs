// End-to-end conversion scenarios
//
// Each test builds a small score in memory (or from JSON), runs a full
// conversion pass and checks the emitted tick events.

use scoretick::model::{
    beats, whole, CrescDirection, Directive, DynamicLevel, DynamicMark, MensurationSign, Score, ScoreEvent,
    ScoreProvider, TempoMark,
};
use scoretick::sink::{EventSink, SmfSink};
use scoretick::{convert, trim_leading_silence, ConversionError, ConversionSettings, DiagnosticKind, ResolutionMode, TickEvent};

/// Score with a single explicit tempo mark at beat 0
fn with_tempo(events: Vec<ScoreEvent>, bpm: f64) -> Score {
    Score::new(events).with_tempo_marks(vec![TempoMark::explicit(whole(0), bpm)])
}

fn note_ons(events: &[TickEvent]) -> Vec<(u64, u8, u8)> {
    events
        .iter()
        .filter_map(|e| match *e {
            TickEvent::NoteOn { tick, pitch, velocity, .. } => Some((tick, pitch, velocity)),
            _ => None,
        })
        .collect()
}

fn note_offs(events: &[TickEvent]) -> Vec<(u64, u8)> {
    events
        .iter()
        .filter_map(|e| match *e {
            TickEvent::NoteOff { tick, pitch, .. } => Some((tick, pitch)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_half_note_at_120_bpm() {
    let score = with_tempo(vec![ScoreEvent::note(whole(0), 0, 60, whole(2))], 120.0);
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    assert_eq!(note_ons(&output.events), vec![(0, 60, 64)]);
    assert_eq!(note_offs(&output.events), vec![(960, 60)]);
}

#[test]
fn test_mensural_tempo_without_explicit_marks() {
    let score = Score::new(vec![
        ScoreEvent::directive(whole(0), 0, Directive::Mensuration { sign: MensurationSign::CutC, secondary: false }),
        ScoreEvent::note(whole(0), 0, 60, whole(1)),
        ScoreEvent::note(whole(1), 0, 62, whole(1)),
        ScoreEvent::note(whole(2), 0, 64, whole(2)),
    ]);
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    assert_eq!(output.tempo.len(), 3);
    assert!(output.tempo.values().iter().all(|bpm| *bpm == 290.0));
    assert_eq!(
        output.events[0],
        TickEvent::TempoChange { tick: 0, microseconds_per_quarter: 206_897 }
    );
}

#[test]
fn test_crescendo_between_levels() {
    let events = (0..=8).map(|i| ScoreEvent::note(whole(i), 0, 60, whole(1))).collect();
    let score = with_tempo(events, 100.0).with_dynamic_marks(vec![
        DynamicMark::level(whole(0), 0, DynamicLevel::F),
        DynamicMark::hairpin(whole(0), 0, CrescDirection::Cresc),
        DynamicMark::level(whole(8), 0, DynamicLevel::Ff),
    ]);
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    let velocities: Vec<u8> = note_ons(&output.events).iter().map(|(_, _, v)| *v).collect();
    assert_eq!(velocities.first(), Some(&96));
    assert_eq!(velocities.last(), Some(&112));
    let interior = &velocities[1..8];
    assert!(interior.windows(2).all(|w| w[0] < w[1]));
    assert!(interior.iter().all(|v| *v > 96 && *v < 112));
}

#[test]
fn test_unclosed_free_rhythm_note() {
    let score = with_tempo(
        vec![
            ScoreEvent::directive(whole(0), 0, Directive::FreeRhythm),
            ScoreEvent::note(whole(0), 0, 60, whole(1)),
        ],
        120.0,
    );
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    assert_eq!(output.diagnostics.count(DiagnosticKind::OrphanedFreeNote), 1);
    assert_eq!(note_offs(&output.events), vec![(480, 60)]);
    let end = output.events.iter().find(|e| matches!(e, TickEvent::EndOfTrack { .. })).unwrap();
    assert!(end.tick() > 480);
}

#[test]
fn test_triplets_need_a_multiple_of_three() {
    let mut events: Vec<ScoreEvent> = (0..4).map(|i| ScoreEvent::note(whole(i), 0, 60, whole(1))).collect();
    events.extend((0..12).map(|i| ScoreEvent::note(whole(4) + beats(i, 3), 0, 67, beats(1, 3))));
    let score = with_tempo(events, 120.0).with_measure_starts(vec![whole(0), whole(4)]);

    // 120 is itself a multiple of 3: a triplet eighth is 40 ticks
    let output = convert(&score, &ConversionSettings::plain(120)).unwrap();
    assert!(note_offs(&output.events).contains(&(520, 67)));

    let err = convert(&score, &ConversionSettings::plain(128)).unwrap_err();
    assert!(matches!(err, ConversionError::ResolutionMismatch { ticks_per_quarter: 128, .. }));

    let grouped = ConversionSettings {
        resolution: ResolutionMode::grouped(),
        ..ConversionSettings::plain(128)
    };
    let output = convert(&score, &grouped).unwrap();
    assert_eq!(output.schedule.ticks_per_quarter_at(whole(4)) % 3, 0);
}

#[test]
fn test_every_free_note_closes_before_region_ends() {
    let score = with_tempo(
        vec![
            ScoreEvent::directive(whole(0), 0, Directive::FreeRhythm),
            ScoreEvent::note(whole(0), 0, 60, whole(1)),
            ScoreEvent::note(whole(1), 0, 62, whole(1)),
            ScoreEvent::note(whole(2), 0, 60, whole(1)),
            ScoreEvent::directive(whole(3), 0, Directive::Strict),
            ScoreEvent::note(whole(4), 0, 64, whole(1)),
        ],
        120.0,
    );
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    let strict_tick = 3 * 480;
    let free_offs: Vec<_> = note_offs(&output.events).into_iter().filter(|(t, _)| *t <= strict_tick).collect();
    assert_eq!(free_offs.len(), 3);
    // the repeated pitch closed its predecessor
    assert!(free_offs.contains(&(960, 60)));
    // 62 and the second 60 were never released
    assert_eq!(output.diagnostics.count(DiagnosticKind::OrphanedFreeNote), 2);
    // the measured note after the region pairs normally
    assert!(note_offs(&output.events).contains(&(2400, 64)));
}

#[test]
fn test_explicit_release_is_not_orphaned() {
    let score = with_tempo(
        vec![
            ScoreEvent::directive(whole(0), 0, Directive::FreeRhythm),
            ScoreEvent::note(whole(0), 0, 60, whole(1)),
            ScoreEvent::directive(beats(3, 2), 0, Directive::Release(Some(60))),
            ScoreEvent::directive(whole(2), 0, Directive::Strict),
        ],
        120.0,
    );
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    assert_eq!(note_offs(&output.events), vec![(720, 60)]);
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_reentering_free_rhythm_is_reported() {
    let score = with_tempo(
        vec![
            ScoreEvent::directive(whole(0), 0, Directive::FreeRhythm),
            ScoreEvent::note(whole(0), 0, 60, whole(1)),
            ScoreEvent::directive(whole(1), 0, Directive::FreeRhythm),
        ],
        120.0,
    );
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    assert_eq!(output.diagnostics.count(DiagnosticKind::FreeRhythmReentered), 1);
    assert_eq!(output.diagnostics.count(DiagnosticKind::OrphanedFreeNote), 1);
}

#[test]
fn test_no_tempo_anywhere() {
    let score = Score::new(vec![ScoreEvent::note(whole(0), 0, 60, whole(1))]);
    assert_eq!(
        convert(&score, &ConversionSettings::plain(480)).unwrap_err(),
        ConversionError::TempoUndefined
    );
}

#[test]
fn test_resolved_tempo_is_never_zero() {
    let events = (0..16).map(|i| ScoreEvent::note(beats(i, 2), 0, 60, beats(1, 2))).collect();
    let score = Score::new(events).with_tempo_marks(vec![
        TempoMark::explicit(whole(3), 90.0),
        TempoMark::explicit(whole(6), 132.0),
    ]);
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    assert!(output.tempo.values().iter().all(|bpm| *bpm > 0.0));
    assert_eq!(output.tempo.values()[0], 90.0);
    assert!(output.timeline.seconds().windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_ticks_never_decrease_per_track() {
    let mut events = Vec::new();
    for track in 0..3 {
        for i in 0..12 {
            let duration = beats(1 + (i + track as i64) % 3, 2);
            events.push(ScoreEvent::note(beats(i, 2), track, 60 + i as i32, duration));
        }
    }
    let score = with_tempo(events, 120.0);
    let settings = ConversionSettings { humanize: 6, ..ConversionSettings::default() };
    let output = convert(&score, &settings).unwrap();

    for track in 0..3 {
        let ticks: Vec<u64> = output.events.iter().filter(|e| e.track() == Some(track)).map(TickEvent::tick).collect();
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]), "track {}", track);
    }
    assert!(note_ons(&output.events).iter().all(|(_, _, v)| (1..=127).contains(v)));
}

#[test]
fn test_humanization_is_reproducible() {
    let events = (0..32).map(|i| ScoreEvent::note(beats(i, 2), 0, 60, beats(1, 2))).collect();
    let score = with_tempo(events, 120.0);
    let settings = ConversionSettings { humanize: 8, seed: 99, ..ConversionSettings::default() };

    let first = convert(&score, &settings).unwrap();
    let second = convert(&score, &settings).unwrap();
    assert_eq!(first.events, second.events);
}

#[test]
fn test_trim_twice_equals_once() {
    let score = with_tempo(vec![ScoreEvent::note(whole(3), 0, 60, whole(1))], 120.0);
    let settings = ConversionSettings { start_offset: Some(96), ..ConversionSettings::plain(480) };
    let mut output = convert(&score, &settings).unwrap();

    assert_eq!(note_ons(&output.events), vec![(96, 60, 64)]);
    let before = output.events.clone();
    assert_eq!(trim_leading_silence(&mut output.events, 96), 96);
    assert_eq!(output.events, before);
}

#[test]
fn test_score_and_settings_from_json() {
    let score = Score::from_json(
        r#"{
            "events": [
                { "position": [0, 1], "track": 0, "kind": { "directive": { "time_signature": { "numerator": 3, "denominator": 4 } } } },
                { "position": [0, 1], "track": 0, "kind": "note", "pitch": 60, "duration": [3, 2] },
                { "position": [3, 2], "track": 0, "kind": "note", "pitch": 62, "duration": [3, 2] }
            ],
            "tempo_marks": [ { "position": [0, 1], "beats_per_minute": 90.0, "source": "explicit" } ],
            "measure_starts": [ [0, 1] ]
        }"#,
    )
    .unwrap();
    let settings = ConversionSettings::from_json(
        r#"{ "resolution": { "fixed": { "ticks_per_quarter": 96 } }, "metric_bias": 0, "accent_bump": 0 }"#,
    )
    .unwrap();

    let output = convert(&score, &settings).unwrap();
    assert_eq!(score.track_count(), 1);
    assert!(output.events.contains(&TickEvent::TimeSignature { tick: 0, numerator: 3, denominator: 4 }));
    assert_eq!(note_ons(&output.events), vec![(0, 60, 64), (144, 62, 64)]);
    assert_eq!(note_offs(&output.events), vec![(144, 60), (288, 62)]);
}

#[test]
fn test_output_feeds_the_smf_sink() {
    let score = with_tempo(
        vec![ScoreEvent::note(whole(0), 0, 60, whole(1)), ScoreEvent::note(whole(0), 1, 64, whole(2))],
        120.0,
    );
    let output = convert(&score, &ConversionSettings::plain(480)).unwrap();

    let mut sink = SmfSink::new();
    sink.write(output.ticks_per_quarter, &output.events).unwrap();
    let smf = sink.into_smf().unwrap();
    assert_eq!(smf.tracks.len(), 1 + output.track_count);
}
