//! Second-order IIR filter (RBJ cookbook designs).
//!
//! One biquad per channel per stage; state is never shared across channels.
//! Coefficients are fixed at construction, so offline passes stay
//! deterministic.

use std::f32::consts::PI;

/// Transposed direct form II biquad.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    fn from_normalized(b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0,
            b1,
            b2,
            a1,
            a2,
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn identity() -> Self {
        Self::from_normalized(1.0, 0.0, 0.0, 0.0, 0.0)
    }

    pub fn high_pass(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let a0 = 1.0 + alpha;
        let inv = 1.0 / a0;
        Self::from_normalized(
            (1.0 + cw0) * 0.5 * inv,
            -(1.0 + cw0) * inv,
            (1.0 + cw0) * 0.5 * inv,
            -2.0 * cw0 * inv,
            (1.0 - alpha) * inv,
        )
    }

    pub fn low_pass(cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let a0 = 1.0 + alpha;
        let inv = 1.0 / a0;
        Self::from_normalized(
            (1.0 - cw0) * 0.5 * inv,
            (1.0 - cw0) * inv,
            (1.0 - cw0) * 0.5 * inv,
            -2.0 * cw0 * inv,
            (1.0 - alpha) * inv,
        )
    }

    pub fn low_shelf(freq_hz: f32, gain_db: f32, sample_rate: f32) -> Self {
        // Flat shelf is exactly a pass-through
        if gain_db.abs() < 0.01 {
            return Self::identity();
        }

        let a = (10.0f32).powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq_hz / sample_rate;
        let cw0 = w0.cos();
        let sw0 = w0.sin();
        let sqrt_a = a.sqrt();
        // Shelf slope fixed at 1 (gentlest monotonic shelf)
        let alpha = sw0 * 0.5 * ((a + 1.0 / a) * (1.0 / SHELF_SLOPE - 1.0) + 2.0).sqrt();

        let b0 = a * ((a + 1.0) - (a - 1.0) * cw0 + 2.0 * sqrt_a * alpha);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cw0);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cw0 - 2.0 * sqrt_a * alpha);
        let a0 = (a + 1.0) + (a - 1.0) * cw0 + 2.0 * sqrt_a * alpha;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cw0);
        let a2 = (a + 1.0) + (a - 1.0) * cw0 - 2.0 * sqrt_a * alpha;

        let inv = 1.0 / a0;
        Self::from_normalized(b0 * inv, b1 * inv, b2 * inv, a1 * inv, a2 * inv)
    }

    pub fn high_shelf(freq_hz: f32, gain_db: f32, sample_rate: f32) -> Self {
        if gain_db.abs() < 0.01 {
            return Self::identity();
        }

        let a = (10.0f32).powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq_hz / sample_rate;
        let cw0 = w0.cos();
        let sw0 = w0.sin();
        let sqrt_a = a.sqrt();
        let alpha = sw0 * 0.5 * ((a + 1.0 / a) * (1.0 / SHELF_SLOPE - 1.0) + 2.0).sqrt();

        let b0 = a * ((a + 1.0) + (a - 1.0) * cw0 + 2.0 * sqrt_a * alpha);
        let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cw0);
        let b2 = a * ((a + 1.0) + (a - 1.0) * cw0 - 2.0 * sqrt_a * alpha);
        let a0 = (a + 1.0) - (a - 1.0) * cw0 + 2.0 * sqrt_a * alpha;
        let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cw0);
        let a2 = (a + 1.0) - (a - 1.0) * cw0 - 2.0 * sqrt_a * alpha;

        let inv = 1.0 / a0;
        Self::from_normalized(b0 * inv, b1 * inv, b2 * inv, a1 * inv, a2 * inv)
    }

    pub fn peaking(freq_hz: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        if gain_db.abs() < 0.01 {
            return Self::identity();
        }

        let a = (10.0f32).powf(gain_db / 40.0);
        let w0 = 2.0 * PI * freq_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let a0 = 1.0 + alpha / a;
        let inv = 1.0 / a0;
        Self::from_normalized(
            (1.0 + alpha * a) * inv,
            -2.0 * cw0 * inv,
            (1.0 - alpha * a) * inv,
            -2.0 * cw0 * inv,
            (1.0 - alpha / a) * inv,
        )
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = input * self.b0 + self.z1;
        // Anti-denormal: tiny DC offset
        self.z1 = input * self.b1 + self.z2 - self.a1 * out + 1e-25;
        self.z2 = input * self.b2 - self.a2 * out + 1e-25;
        out
    }

    /// Clear filter delay state.
    #[inline]
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Run the filter over a whole channel, writing a new vector.
    pub fn process_block(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&x| self.process(x)).collect()
    }
}

const SHELF_SLOPE: f32 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::utils::frame_rms;

    fn sine(freq: f32, sr: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sr).sin())
            .collect()
    }

    #[test]
    fn low_pass_attenuates_high_frequencies() {
        let sr = 44100.0;
        let mut lp = Biquad::low_pass(800.0, 0.707, sr);
        let hi = lp.process_block(&sine(8000.0, sr, 8192));
        let mut lp = Biquad::low_pass(800.0, 0.707, sr);
        let lo = lp.process_block(&sine(100.0, sr, 8192));

        // Skip the settling transient before measuring
        assert!(frame_rms(&hi[2048..]) < 0.05);
        assert!(frame_rms(&lo[2048..]) > 0.6);
    }

    #[test]
    fn high_pass_attenuates_low_frequencies() {
        let sr = 44100.0;
        let mut hp = Biquad::high_pass(300.0, 0.707, sr);
        let lo = hp.process_block(&sine(40.0, sr, 8192));
        let mut hp = Biquad::high_pass(300.0, 0.707, sr);
        let hi = hp.process_block(&sine(2000.0, sr, 8192));

        assert!(frame_rms(&lo[2048..]) < 0.05);
        assert!(frame_rms(&hi[2048..]) > 0.6);
    }

    #[test]
    fn flat_shelf_is_identity() {
        let mut shelf = Biquad::high_shelf(3000.0, 0.0, 44100.0);
        let input = sine(440.0, 44100.0, 256);
        let out = shelf.process_block(&input);
        for (x, y) in input.iter().zip(out.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn peaking_boost_raises_band_energy() {
        let sr = 44100.0;
        let mut peak = Biquad::peaking(4000.0, 1.0, 3.0, sr);
        let out = peak.process_block(&sine(4000.0, sr, 8192));
        let gain = frame_rms(&out[2048..]) / frame_rms(&sine(4000.0, sr, 8192)[2048..]);
        // +3 dB is a factor of ~1.41
        assert!(gain > 1.3 && gain < 1.5, "gain {gain}");
    }
}
