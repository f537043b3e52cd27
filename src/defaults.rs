//! Default values for tick conversion
//!
//! Provides sensible defaults for resolution, velocity, tempo heuristics and
//! channel assignment.

/// Default ticks per quarter note
/// 480 is standard and provides good resolution
pub const DEFAULT_TPQ: u32 = 480;

/// Per-event tick ceiling of the legacy container format
pub const LEGACY_TICK_CEILING: u32 = 999;

/// Default MIDI velocity for tracks without any dynamic mark (1-127)
pub const DEFAULT_VELOCITY: u8 = 64;

/// Reference tempo the mensuration multipliers apply to
pub const DEFAULT_MENSURAL_BASE_TEMPO: f64 = 232.0;

/// Velocity added on strong beats and removed off the beat
pub const DEFAULT_METRIC_BIAS: i32 = 4;

/// Velocity added to accented and sforzando notes
pub const DEFAULT_ACCENT_BUMP: i32 = 20;

/// Seed for the humanization streams
pub const DEFAULT_SEED: u64 = 0x5eed_cafe;

/// Ticks between the last event and the end-of-track markers
pub const DEFAULT_END_PADDING_TICKS: u32 = 120;

/// Header resolution of the millisecond time base: at 120 BPM
/// (500 000 microseconds per quarter) one tick is one millisecond.
pub const MILLISECOND_TICKS_PER_QUARTER: u32 = 500;
pub const MILLISECOND_MICROSECONDS_PER_QUARTER: u32 = 500_000;

/// MIDI controller number for pan
pub const PAN_CONTROLLER: u8 = 10;

/// Melodic channels: every channel except 9 (drums)
pub const MELODIC_CHANNELS: usize = 15;

/// Assign MIDI channel from track index.
///
/// Tracks 0-8 keep their index, tracks 9-14 move up one to skip the drum
/// channel. With more than 15 tracks the mapping starts over, so track 15
/// shares channel 0 with track 0 (and so on).
pub fn assign_channel(track: usize) -> u8 {
    let slot = track % MELODIC_CHANNELS;
    if slot >= 9 { (slot + 1) as u8 } else { slot as u8 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_channel() {
        assert_eq!(assign_channel(0), 0);
        assert_eq!(assign_channel(8), 8);
        assert_eq!(assign_channel(9), 10);
        assert_eq!(assign_channel(14), 15);
        assert_eq!(assign_channel(15), 0);
        assert_eq!(assign_channel(16), 1);

        let first: std::collections::HashSet<u8> = (0..MELODIC_CHANNELS).map(assign_channel).collect();
        assert_eq!(first.len(), MELODIC_CHANNELS);
        assert!(!first.contains(&9));
    }

    #[test]
    fn test_millisecond_base_is_one_tick_per_ms() {
        let micros_per_tick = MILLISECOND_MICROSECONDS_PER_QUARTER / MILLISECOND_TICKS_PER_QUARTER;
        assert_eq!(micros_per_tick, 1000);
    }
}
