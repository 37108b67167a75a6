//! Fixed mastering pass: loud, non-clipping output.
//!
//! Single non-configurable chain built from the same stage primitives the
//! filter presets use: gentle glue compression, a 1.5x drive into a fast
//! 20:1 limiter at -1 dB. No peak normalization analysis pass; the drive and
//! limiter ceiling do the work.

use log::info;

use crate::buffer::SampleBuffer;
use crate::chain::{self, EffectChain, Stage};
use crate::error::RenderError;
use crate::session::CancelToken;

fn mastering_chain() -> EffectChain {
    // Known-good constants; validation cannot fail
    EffectChain::new(vec![
        Stage::Compressor {
            threshold_db: -20.0,
            knee_db: 30.0,
            ratio: 4.0,
            attack_s: 0.003,
            release_s: 0.25,
        },
        Stage::Gain { factor: 1.5 },
        Stage::Limiter {
            threshold_db: -1.0,
            ratio: 20.0,
            attack_s: 0.001,
            release_s: 0.1,
        },
    ])
    .unwrap_or_else(|_| EffectChain::identity())
}

/// Master a recording. Returns a new buffer; the input is untouched.
pub fn master(buffer: &SampleBuffer) -> Result<SampleBuffer, RenderError> {
    info!(
        "mastering {:.2}s buffer ({} channels)",
        buffer.duration_seconds(),
        buffer.channel_count()
    );
    chain::render(buffer, &mastering_chain())
}

/// `master` observing a cancellation token.
pub fn master_cancellable(
    buffer: &SampleBuffer,
    cancel: &CancelToken,
) -> Result<SampleBuffer, RenderError> {
    chain::render_cancellable(buffer, &mastering_chain(), cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_quality;
    use std::f32::consts::PI;

    const SR: u32 = 44100;

    fn quiet_voice_buffer() -> SampleBuffer {
        let samples: Vec<f32> = (0..SR as usize * 2)
            .map(|i| {
                let t = i as f32 / SR as f32;
                0.15 * (2.0 * PI * 200.0 * t).sin()
            })
            .collect();
        SampleBuffer::from_mono(samples, SR).unwrap()
    }

    #[test]
    fn mastered_output_is_louder() {
        let input = quiet_voice_buffer();
        let out = master(&input).unwrap();

        let before = analyze_quality(&input);
        let after = analyze_quality(&out);
        assert!(
            after.rms_db > before.rms_db + 1.0,
            "rms {} -> {}",
            before.rms_db,
            after.rms_db
        );
    }

    #[test]
    fn mastered_output_does_not_clip() {
        let hot: Vec<f32> = (0..SR as usize)
            .map(|i| 0.95 * (2.0 * PI * 300.0 * i as f32 / SR as f32).sin())
            .collect();
        let input = SampleBuffer::from_mono(hot, SR).unwrap();
        let out = master(&input).unwrap();

        let report = analyze_quality(&out);
        assert!(!report.clipping_detected, "peak {} dB", report.peak_db);
        assert!(out.channel(0).iter().all(|x| x.is_finite()));
    }

    #[test]
    fn shape_is_preserved() {
        let input = quiet_voice_buffer();
        let out = master(&input).unwrap();
        assert_eq!(out.len(), input.len());
        assert_eq!(out.sample_rate(), input.sample_rate());
        assert_eq!(out.channel_count(), input.channel_count());
    }

    #[test]
    fn cancellation_aborts_master() {
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            master_cancellable(&quiet_voice_buffer(), &token),
            Err(RenderError::Cancelled)
        ));
    }
}
