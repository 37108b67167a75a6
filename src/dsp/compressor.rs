//! Soft-knee dynamics compressor.
//!
//! Feed-forward design: a squared-energy envelope with attack/release
//! smoothing drives a soft-knee gain computer, and a fixed makeup gain
//! compensates for the reduction a full-scale signal would receive
//! (`fullRangeGain^0.6`), so compressed material comes out louder rather
//! than merely flattened. State is per channel; construct one per channel
//! per render.

use crate::dsp::utils::{db_to_lin, lin_to_db, time_constant_coeff, update_env_sq, DB_EPS};

const MAKEUP_EXPONENT: f32 = 0.6;

#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    threshold_db: f32,
    knee_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    makeup: f32,
    env_sq: f32,
}

impl Compressor {
    pub fn new(
        threshold_db: f32,
        knee_db: f32,
        ratio: f32,
        attack_s: f32,
        release_s: f32,
        sample_rate: f32,
    ) -> Self {
        // Reduction applied to a 0 dBFS signal, partially restored as makeup
        let full_range_reduction = soft_knee(0.0 - threshold_db, ratio, knee_db);
        let makeup = db_to_lin(full_range_reduction * MAKEUP_EXPONENT);

        Self {
            threshold_db,
            knee_db,
            ratio,
            attack_coeff: time_constant_coeff(attack_s * 1000.0, sample_rate),
            release_coeff: time_constant_coeff(release_s * 1000.0, sample_rate),
            makeup,
            env_sq: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let sq = input * input;
        self.env_sq = update_env_sq(self.env_sq, sq, self.attack_coeff, self.release_coeff);

        let level_db = lin_to_db(self.env_sq.sqrt().max(DB_EPS));
        let reduction_db = soft_knee(level_db - self.threshold_db, self.ratio, self.knee_db);

        input * db_to_lin(-reduction_db) * self.makeup
    }

    pub fn reset(&mut self) {
        self.env_sq = 0.0;
    }

    pub fn process_block(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&x| self.process(x)).collect()
    }
}

/// Gain reduction in dB for a level `over_db` above threshold.
/// A zero-width knee degenerates to the hard-knee characteristic.
#[inline]
pub(crate) fn soft_knee(over_db: f32, ratio: f32, knee_db: f32) -> f32 {
    let slope = 1.0 - 1.0 / ratio;
    if knee_db <= 0.0 {
        return over_db.max(0.0) * slope;
    }
    let half = 0.5 * knee_db;
    if over_db <= -half {
        0.0
    } else if over_db >= half {
        over_db * slope
    } else {
        let x = over_db + half;
        (x * x) / (2.0 * knee_db) * slope
    }
}
