//! Per-note velocity shaping: metric bias, humanization jitter, accent bump.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::model::TrackId;
use crate::settings::ConversionSettings;

/// Independent, reproducible jitter stream for one track.
fn rng_for(seed: u64, track: TrackId) -> Pcg32 {
    let salt = (track as u64).wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    Pcg32::seed_from_u64(seed ^ salt)
}

#[derive(Debug, Clone)]
pub struct VelocityShaper {
    metric_bias: i32,
    humanize: i32,
    accent_bump: i32,
    seed: u64,
    streams: Vec<Pcg32>,
}

impl VelocityShaper {
    pub fn new(settings: &ConversionSettings, track_count: usize) -> Self {
        Self {
            metric_bias: settings.metric_bias,
            humanize: settings.humanize.max(0),
            accent_bump: settings.accent_bump,
            seed: settings.seed,
            streams: (0..track_count).map(|track| rng_for(settings.seed, track)).collect(),
        }
    }

    fn stream(&mut self, track: TrackId) -> &mut Pcg32 {
        while self.streams.len() <= track {
            let next = self.streams.len();
            self.streams.push(rng_for(self.seed, next));
        }
        &mut self.streams[track]
    }

    /// Final attack velocity in [1, 127].
    ///
    /// `metric_level >= 0` counts as on the beat.
    pub fn shape(&mut self, track: TrackId, base: f64, metric_level: i32, accented: bool) -> u8 {
        let mut velocity = base.round() as i32;

        let bias = if metric_level >= 0 { self.metric_bias } else { self.metric_bias.saturating_neg() };
        velocity = velocity.saturating_add(bias);

        if self.humanize > 0 {
            let humanize = self.humanize;
            velocity = velocity.saturating_add(self.stream(track).gen_range(-humanize..=humanize));
        }

        if accented {
            velocity = velocity.saturating_add(self.accent_bump);
        }

        velocity.clamp(1, 127) as u8
    }
}
