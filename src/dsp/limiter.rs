//! High-ratio peak limiter.
//!
//! Hard-knee gain computer driven by a fast peak envelope. Used as the final
//! stage of the mastering chain; it controls peaks and contributes no tone of
//! its own.

use crate::dsp::utils::{db_to_lin, lin_to_db, time_constant_coeff, DB_EPS};

#[derive(Debug, Clone, Copy)]
pub struct Limiter {
    threshold_db: f32,
    ratio: f32,
    ceiling: f32,
    attack_coeff: f32,
    release_coeff: f32,
    peak_env: f32,
}

impl Limiter {
    pub fn new(threshold_db: f32, ratio: f32, attack_s: f32, release_s: f32, sample_rate: f32) -> Self {
        Self {
            threshold_db,
            ratio,
            ceiling: db_to_lin(threshold_db),
            attack_coeff: time_constant_coeff(attack_s * 1000.0, sample_rate),
            release_coeff: time_constant_coeff(release_s * 1000.0, sample_rate),
            peak_env: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let abs = input.abs();
        self.peak_env = if abs > self.peak_env {
            self.attack_coeff * self.peak_env + (1.0 - self.attack_coeff) * abs
        } else {
            self.release_coeff * self.peak_env + (1.0 - self.release_coeff) * abs
        };

        let over_db = lin_to_db(self.peak_env.max(DB_EPS)) - self.threshold_db;
        let out = if over_db <= 0.0 {
            input
        } else {
            input * db_to_lin(-over_db * (1.0 - 1.0 / self.ratio))
        };
        // Hard clip at the ceiling: the envelope lags attacks by up to one
        // time constant, and the mastering contract is no overshoot at all.
        out.clamp(-self.ceiling, self.ceiling)
    }

    pub fn reset(&mut self) {
        self.peak_env = 0.0;
    }

    pub fn process_block(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&x| self.process(x)).collect()
    }
}
