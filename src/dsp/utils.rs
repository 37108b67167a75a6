//! Shared DSP math helpers.

/// Linear amplitude floor for dB conversion. Keeps every dB value finite
/// (-100 dB floor), including for pure silence.
pub const DB_EPS: f32 = 1e-5;

pub fn lin_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.max(DB_EPS).log10()
}

pub fn db_to_lin(db: f32) -> f32 {
    (10.0f32).powf(db / 20.0)
}

/// One-pole smoothing coefficient for a time constant in milliseconds.
/// A non-positive time yields 0.0 (instant response).
pub fn time_constant_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    if time_ms <= 0.0 {
        return 0.0;
    }
    (-1.0 / (time_ms * 0.001 * sample_rate)).exp()
}

/// Attack/release smoothing of a squared (energy) envelope.
#[inline]
pub fn update_env_sq(env_sq: f32, sq: f32, attack: f32, release: f32) -> f32 {
    if sq > env_sq {
        attack * env_sq + (1.0 - attack) * sq
    } else {
        release * env_sq + (1.0 - release) * sq
    }
}

pub fn frame_rms(x: &[f32]) -> f32 {
    let mut s = 0.0f32;
    for &v in x {
        s += v * v;
    }
    (s / (x.len().max(1) as f32)).sqrt()
}
