//! Autocorrelation pitch detection.
//!
//! Estimates the fundamental frequency of a single analysis frame. Quiet or
//! aperiodic frames return 0.0 ("no reliable pitch"), which is a normal
//! result rather than an error. O(N²) in the frame length; callers should
//! stick to short frames (2048 samples is the recommended window).

use crate::dsp::utils::frame_rms;

/// Accepted pitch band; estimates outside it are rejected as artifacts.
pub const MIN_PITCH_HZ: f32 = 50.0;
pub const MAX_PITCH_HZ: f32 = 5000.0;

/// Minimum frame RMS for a usable estimate.
const RMS_GATE: f32 = 0.01;

/// Amplitude below which leading/trailing samples are trimmed before
/// correlation, reducing boundary bias.
const TRIM_THRESHOLD: f32 = 0.1;

/// Estimate the fundamental frequency of `frame` in Hz, or 0.0 when no
/// reliable pitch is present. Pure and deterministic.
pub fn detect_pitch(frame: &[f32], sample_rate: u32) -> f32 {
    let size = frame.len();
    if size < 2 || frame_rms(frame) < RMS_GATE {
        return 0.0;
    }

    // Trim quiet edges: first sub-threshold index from either end wins,
    // scanning at most half the frame.
    let mut start = 0;
    let mut end = size - 1;
    for i in 0..size / 2 {
        if frame[i].abs() < TRIM_THRESHOLD {
            start = i;
            break;
        }
    }
    for i in 1..size / 2 {
        if frame[size - i].abs() < TRIM_THRESHOLD {
            end = size - i;
            break;
        }
    }
    if end <= start + 1 {
        return 0.0;
    }

    let buf = &frame[start..end];
    let n = buf.len();

    // Unnormalized autocorrelation c[lag] = sum buf[j] * buf[j + lag]
    let mut c = vec![0.0f32; n];
    for (lag, c_lag) in c.iter_mut().enumerate() {
        let mut s = 0.0f32;
        for j in 0..n - lag {
            s += buf[j] * buf[j + lag];
        }
        *c_lag = s;
    }

    // Walk past the zero-lag peak: advance while strictly decreasing
    let mut d = 0;
    while d + 1 < n && c[d] > c[d + 1] {
        d += 1;
    }
    if d + 1 >= n {
        return 0.0;
    }

    // Strongest correlation from the first local minimum onward gives the period
    let mut t0 = d;
    let mut max_val = f32::MIN;
    for (lag, &val) in c.iter().enumerate().skip(d) {
        if val > max_val {
            max_val = val;
            t0 = lag;
        }
    }
    if t0 == 0 {
        return 0.0;
    }

    let freq = sample_rate as f32 / t0 as f32;
    if !freq.is_finite() || !(MIN_PITCH_HZ..=MAX_PITCH_HZ).contains(&freq) {
        return 0.0;
    }
    freq
}
