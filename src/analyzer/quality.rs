//! Offline quality report: levels, clipping, dynamic range.
//!
//! Full-resolution single pass over the first channel. Loudness is an RMS
//! proxy (rms - 3 dB), not K-weighted LUFS; good enough to coach recording
//! level, not for broadcast compliance.

use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::dsp::utils::lin_to_db;

/// Absolute amplitude at or above which a sample counts as clipped.
const CLIP_THRESHOLD: f32 = 0.99;

/// Clipped samples tolerated before the report flags clipping.
const CLIP_TOLERANCE: u32 = 10;

/// RMS level below which the recording is considered mostly silence.
const SILENCE_ISSUE_DB: f32 = -50.0;

/// Offset applied to RMS dB as the loudness proxy.
const LOUDNESS_OFFSET_DB: f32 = 3.0;

/// Level and integrity metrics for one recording. All dB fields are finite
/// and rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub duration_seconds: f32,
    pub peak_db: f32,
    pub rms_db: f32,
    /// RMS-based proxy, not true LUFS.
    pub estimated_loudness_db: f32,
    pub clipping_detected: bool,
    pub dynamic_range_db: f32,
    pub has_silence_issues: bool,
}

/// Analyze the first channel of `buffer`. Degenerate buffers (empty or pure
/// silence) bottom out at the -100 dB conversion floor; no field is ever NaN
/// or infinite.
pub fn analyze_quality(buffer: &SampleBuffer) -> QualityReport {
    let data = buffer.channel(0);

    let mut peak = 0.0f32;
    let mut sum_squares = 0.0f64;
    let mut clip_count = 0u32;

    for &sample in data {
        let abs = sample.abs();
        if abs > peak {
            peak = abs;
        }
        if abs >= CLIP_THRESHOLD {
            clip_count += 1;
        }
        sum_squares += (abs as f64) * (abs as f64);
    }

    let rms = if data.is_empty() {
        0.0
    } else {
        (sum_squares / data.len() as f64).sqrt() as f32
    };

    let peak_db = lin_to_db(peak);
    let rms_db = lin_to_db(rms);

    let report = QualityReport {
        duration_seconds: buffer.duration_seconds(),
        peak_db: round1(peak_db),
        rms_db: round1(rms_db),
        estimated_loudness_db: round1(rms_db - LOUDNESS_OFFSET_DB),
        clipping_detected: clip_count > CLIP_TOLERANCE,
        dynamic_range_db: round1(peak_db - rms_db),
        has_silence_issues: rms_db < SILENCE_ISSUE_DB,
    };

    log::debug!(
        "quality: peak {:.1} dB, rms {:.1} dB, {} clipped samples",
        report.peak_db,
        report.rms_db,
        clip_count
    );

    report
}

fn round1(x: f32) -> f32 {
    (x * 10.0).round() / 10.0
}
