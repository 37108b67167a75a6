//! Offline pause and volume statistics over a full recording.
//!
//! Strided single pass: every 100th sample is enough to localize pauses of
//! half a second and keeps the scan cheap for long takes.

use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;

/// Amplitude below which a sample counts as silence.
pub const SILENCE_THRESHOLD: f32 = 0.02;

/// A silence run must exceed this duration to register as a pause.
pub const MIN_PAUSE_SECONDS: f32 = 0.5;

/// Samples skipped between measurements.
const ANALYSIS_STRIDE: usize = 100;

/// Amplitude floor for the average-volume accumulator; keeps digital silence
/// from dragging the average down.
const VOLUME_FLOOR: f32 = 0.001;

/// Pause and average-volume statistics of one recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseStats {
    pub pause_count: u32,
    /// Mean absolute amplitude of audible samples, scaled to 0..100.
    pub average_volume: f32,
}

/// Analyze the first channel of `buffer` for pauses and average volume.
///
/// A silence run still open at the end of the buffer is counted once its
/// accumulated duration exceeds the pause threshold: a recording that trails
/// off into silence genuinely contains that pause.
pub fn analyze_pauses(buffer: &SampleBuffer) -> PauseStats {
    let data = buffer.channel(0);
    let step_seconds = ANALYSIS_STRIDE as f32 / buffer.sample_rate() as f32;

    let mut pause_count = 0u32;
    let mut silence_duration = 0.0f32;
    let mut volume_sum = 0.0f32;
    let mut audible_samples = 0u32;

    for i in (0..data.len()).step_by(ANALYSIS_STRIDE) {
        let amplitude = data[i].abs();

        if amplitude > VOLUME_FLOOR {
            volume_sum += amplitude;
            audible_samples += 1;
        }

        if amplitude < SILENCE_THRESHOLD {
            silence_duration += step_seconds;
        } else {
            if silence_duration > MIN_PAUSE_SECONDS {
                pause_count += 1;
            }
            silence_duration = 0.0;
        }
    }

    // Trailing-silence policy: an unterminated run long enough to be a pause
    // still counts as one.
    if silence_duration > MIN_PAUSE_SECONDS {
        pause_count += 1;
    }

    let average_volume = if audible_samples > 0 {
        (volume_sum / audible_samples as f32) * 100.0
    } else {
        0.0
    };

    log::debug!(
        "pause analysis: {} pauses, avg volume {:.1} over {:.2}s",
        pause_count,
        average_volume,
        buffer.duration_seconds()
    );

    PauseStats {
        pause_count,
        average_volume,
    }
}
