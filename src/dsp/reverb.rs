//! Convolution reverb primitives.
//!
//! The impulse response is exponentially-decaying white noise, generated per
//! render from a caller-controlled RNG so tests can pin the seed. Convolution
//! runs in the frequency domain (single overlap-free FFT over the padded
//! signal); the impulse is normalized to unit energy so the wet level does
//! not depend on the impulse duration.

use rand::rngs::StdRng;
use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::RenderError;
use crate::session::CancelToken;

/// Workspace cap for impulse generation (30 s at 192 kHz).
const MAX_IMPULSE_SAMPLES: usize = 30 * 192_000;

/// Exponentially-decaying white-noise impulse, normalized to unit energy.
pub fn decaying_noise_impulse(
    duration_s: f32,
    decay_exponent: f32,
    sample_rate: u32,
    rng: &mut StdRng,
) -> Result<Vec<f32>, RenderError> {
    let len = (duration_s * sample_rate as f32) as usize;
    if len > MAX_IMPULSE_SAMPLES {
        return Err(RenderError::ImpulseTooLarge { samples: len });
    }

    let mut impulse = Vec::with_capacity(len);
    for i in 0..len {
        let envelope = (1.0 - i as f32 / len as f32).powf(decay_exponent);
        let noise: f32 = rng.gen_range(-1.0..1.0);
        impulse.push(noise * envelope);
    }

    let energy: f32 = impulse.iter().map(|x| x * x).sum();
    if energy > 0.0 {
        let scale = 1.0 / energy.sqrt();
        for x in &mut impulse {
            *x *= scale;
        }
    }
    Ok(impulse)
}

/// FFT convolution of `signal` with `impulse`, truncated to `signal.len()`.
///
/// The reverb tail beyond the input length is dropped: effect renders must
/// preserve buffer duration.
pub fn convolve_truncated(
    signal: &[f32],
    impulse: &[f32],
    cancel: Option<&CancelToken>,
) -> Result<Vec<f32>, RenderError> {
    if signal.is_empty() || impulse.is_empty() {
        return Ok(vec![0.0; signal.len()]);
    }

    let n = (signal.len() + impulse.len() - 1).next_power_of_two();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut a: Vec<Complex<f32>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(n)
        .collect();
    let mut b: Vec<Complex<f32>> = impulse
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(n)
        .collect();

    fft.process(&mut a);
    check_cancel(cancel)?;
    fft.process(&mut b);
    check_cancel(cancel)?;

    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x *= *y;
    }

    ifft.process(&mut a);
    check_cancel(cancel)?;

    let scale = 1.0 / n as f32;
    Ok(a[..signal.len()].iter().map(|c| c.re * scale).collect())
}

#[inline]
fn check_cancel(cancel: Option<&CancelToken>) -> Result<(), RenderError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(RenderError::Cancelled),
        _ => Ok(()),
    }
}
