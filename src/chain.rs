//! Effect chains: plain stage descriptions and the renderer that interprets
//! them.
//!
//! A chain is data, not a node graph: an ordered list of `Stage` variants,
//! validated at construction so a render can never trip over bad parameters.
//! `render` interprets the list left to right as offline whole-buffer passes
//! with fresh per-channel state, always producing a new `SampleBuffer`.

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::dsp::reverb::{convolve_truncated, decaying_noise_impulse};
use crate::dsp::{Biquad, Compressor, Limiter};
use crate::error::{ConfigError, RenderError};
use crate::session::CancelToken;

/// Q used for plain high-pass/low-pass stages (Butterworth).
const FILTER_Q: f32 = 0.707;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShelfKind {
    Low,
    High,
}

/// One DSP stage. Pure description; state lives only inside a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    HighPass {
        cutoff_hz: f32,
    },
    LowPass {
        cutoff_hz: f32,
    },
    Shelf {
        kind: ShelfKind,
        freq_hz: f32,
        gain_db: f32,
    },
    Peaking {
        freq_hz: f32,
        q: f32,
        gain_db: f32,
    },
    Compressor {
        threshold_db: f32,
        knee_db: f32,
        ratio: f32,
        attack_s: f32,
        release_s: f32,
    },
    Limiter {
        threshold_db: f32,
        ratio: f32,
        attack_s: f32,
        release_s: f32,
    },
    ConvolutionReverb {
        impulse_duration_s: f32,
        decay_exponent: f32,
        dry_mix: f32,
        wet_mix: f32,
    },
    Gain {
        factor: f32,
    },
}

impl Stage {
    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Stage::HighPass { cutoff_hz } => check_freq("high-pass cutoff", cutoff_hz),
            Stage::LowPass { cutoff_hz } => check_freq("low-pass cutoff", cutoff_hz),
            Stage::Shelf { freq_hz, gain_db, .. } => {
                check_freq("shelf frequency", freq_hz)?;
                check_finite("shelf gain", gain_db)
            }
            Stage::Peaking { freq_hz, q, gain_db } => {
                check_freq("peaking frequency", freq_hz)?;
                if !(q > 0.0) || !q.is_finite() {
                    return Err(ConfigError::OutOfRange {
                        context: "peaking Q",
                        min: f32::EPSILON,
                        max: f32::INFINITY,
                        value: q,
                    });
                }
                check_finite("peaking gain", gain_db)
            }
            Stage::Compressor {
                threshold_db,
                knee_db,
                ratio,
                attack_s,
                release_s,
            } => {
                check_finite("compressor threshold", threshold_db)?;
                if knee_db < 0.0 || !knee_db.is_finite() {
                    return Err(ConfigError::OutOfRange {
                        context: "compressor knee",
                        min: 0.0,
                        max: f32::INFINITY,
                        value: knee_db,
                    });
                }
                check_ratio("compressor ratio", ratio)?;
                check_time("compressor attack", attack_s)?;
                check_time("compressor release", release_s)
            }
            Stage::Limiter {
                threshold_db,
                ratio,
                attack_s,
                release_s,
            } => {
                check_finite("limiter threshold", threshold_db)?;
                check_ratio("limiter ratio", ratio)?;
                check_time("limiter attack", attack_s)?;
                check_time("limiter release", release_s)
            }
            Stage::ConvolutionReverb {
                impulse_duration_s,
                decay_exponent,
                dry_mix,
                wet_mix,
            } => {
                if !(impulse_duration_s > 0.0) || !impulse_duration_s.is_finite() {
                    return Err(ConfigError::InvalidTime {
                        context: "reverb impulse duration",
                        value: impulse_duration_s,
                    });
                }
                if !(decay_exponent > 0.0) || !decay_exponent.is_finite() {
                    return Err(ConfigError::OutOfRange {
                        context: "reverb decay exponent",
                        min: f32::EPSILON,
                        max: f32::INFINITY,
                        value: decay_exponent,
                    });
                }
                check_mix("reverb dry mix", dry_mix)?;
                check_mix("reverb wet mix", wet_mix)
            }
            Stage::Gain { factor } => {
                if factor < 0.0 || !factor.is_finite() {
                    return Err(ConfigError::OutOfRange {
                        context: "gain factor",
                        min: 0.0,
                        max: f32::INFINITY,
                        value: factor,
                    });
                }
                Ok(())
            }
        }
    }
}

fn check_freq(context: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidFrequency { context, value })
    }
}

fn check_finite(context: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            context,
            min: f32::NEG_INFINITY,
            max: f32::INFINITY,
            value,
        })
    }
}

fn check_ratio(context: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 1.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidRatio { context, value })
    }
}

fn check_time(context: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidTime { context, value })
    }
}

fn check_mix(context: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            context,
            min: 0.0,
            max: 1.0,
            value,
        })
    }
}

/// Validated ordered list of stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectChain {
    stages: Vec<Stage>,
}

impl EffectChain {
    pub fn new(stages: Vec<Stage>) -> Result<Self, ConfigError> {
        for stage in &stages {
            stage.validate()?;
        }
        Ok(Self { stages })
    }

    /// The empty chain; rendering it is the identity.
    pub fn identity() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Named effect-chain presets offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterPreset {
    Original,
    Radio,
    Phone,
    Auditorium,
    Clean,
}

impl FilterPreset {
    pub fn name(&self) -> &'static str {
        match self {
            FilterPreset::Original => "Original",
            FilterPreset::Radio => "Radio",
            FilterPreset::Phone => "Phone",
            FilterPreset::Auditorium => "Auditorium",
            FilterPreset::Clean => "Clean",
        }
    }

    /// The stage list this preset renders. Preset parameters are known-good,
    /// so construction bypasses re-validation.
    pub fn chain(&self) -> EffectChain {
        let stages = match self {
            FilterPreset::Original => vec![],
            // Broadcast feel: heavy leveling plus bass/treble shelves
            FilterPreset::Radio => vec![
                Stage::Compressor {
                    threshold_db: -24.0,
                    knee_db: 30.0,
                    ratio: 12.0,
                    attack_s: 0.003,
                    release_s: 0.25,
                },
                Stage::Shelf {
                    kind: ShelfKind::Low,
                    freq_hz: 200.0,
                    gain_db: 4.0,
                },
                Stage::Shelf {
                    kind: ShelfKind::High,
                    freq_hz: 3000.0,
                    gain_db: 4.0,
                },
            ],
            // Telephone bandwidth plus hard squash
            FilterPreset::Phone => vec![
                Stage::HighPass { cutoff_hz: 300.0 },
                Stage::LowPass { cutoff_hz: 3000.0 },
                Stage::Compressor {
                    threshold_db: -10.0,
                    knee_db: 30.0,
                    ratio: 20.0,
                    attack_s: 0.003,
                    release_s: 0.25,
                },
            ],
            FilterPreset::Auditorium => vec![Stage::ConvolutionReverb {
                impulse_duration_s: 2.0,
                decay_exponent: 2.0,
                dry_mix: 0.6,
                wet_mix: 0.4,
            }],
            // Rumble cut, hiss shelf, presence, gentle leveling
            FilterPreset::Clean => vec![
                Stage::HighPass { cutoff_hz: 85.0 },
                Stage::Shelf {
                    kind: ShelfKind::High,
                    freq_hz: 10000.0,
                    gain_db: -5.0,
                },
                Stage::Peaking {
                    freq_hz: 4000.0,
                    q: 1.0,
                    gain_db: 3.0,
                },
                Stage::Compressor {
                    threshold_db: -24.0,
                    knee_db: 30.0,
                    ratio: 4.0,
                    attack_s: 0.003,
                    release_s: 0.25,
                },
            ],
        };
        EffectChain { stages }
    }
}

/// Render `chain` against `buffer`, producing a new buffer. The input is
/// never mutated; the reverb impulse (if any) is drawn fresh per render.
pub fn render(buffer: &SampleBuffer, chain: &EffectChain) -> Result<SampleBuffer, RenderError> {
    render_inner(buffer, chain, None, None)
}

/// `render` with a fixed impulse seed, for reproducible output.
pub fn render_seeded(
    buffer: &SampleBuffer,
    chain: &EffectChain,
    seed: u64,
) -> Result<SampleBuffer, RenderError> {
    render_inner(buffer, chain, Some(seed), None)
}

/// `render` observing a cancellation token between stages and convolution
/// passes. A cancelled render returns `RenderError::Cancelled` and publishes
/// nothing; the caller's buffer is untouched and retryable.
pub fn render_cancellable(
    buffer: &SampleBuffer,
    chain: &EffectChain,
    cancel: &CancelToken,
) -> Result<SampleBuffer, RenderError> {
    render_inner(buffer, chain, None, Some(cancel))
}

/// Render a named preset. `Original` is the bit-identical identity.
pub fn render_preset(
    buffer: &SampleBuffer,
    preset: FilterPreset,
) -> Result<SampleBuffer, RenderError> {
    match preset {
        FilterPreset::Original => Ok(buffer.clone()),
        _ => render(buffer, &preset.chain()),
    }
}

fn render_inner(
    buffer: &SampleBuffer,
    chain: &EffectChain,
    seed: Option<u64>,
    cancel: Option<&CancelToken>,
) -> Result<SampleBuffer, RenderError> {
    let sample_rate = buffer.sample_rate();
    let mut channels: Vec<Vec<f32>> = buffer.channels().to_vec();
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    debug!(
        "rendering {} stages over {} frames x {} channels",
        chain.stages.len(),
        buffer.len(),
        buffer.channel_count()
    );

    for (index, stage) in chain.stages.iter().enumerate() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
        }
        channels = apply_stage(stage, channels, sample_rate, &mut rng, cancel)?;
        debug!("stage {index} complete: {stage:?}");
    }

    Ok(SampleBuffer {
        channels,
        sample_rate,
    })
}

fn apply_stage(
    stage: &Stage,
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    rng: &mut StdRng,
    cancel: Option<&CancelToken>,
) -> Result<Vec<Vec<f32>>, RenderError> {
    let sr = sample_rate as f32;
    match *stage {
        Stage::HighPass { cutoff_hz } => Ok(channels
            .iter()
            .map(|ch| Biquad::high_pass(cutoff_hz, FILTER_Q, sr).process_block(ch))
            .collect()),
        Stage::LowPass { cutoff_hz } => Ok(channels
            .iter()
            .map(|ch| Biquad::low_pass(cutoff_hz, FILTER_Q, sr).process_block(ch))
            .collect()),
        Stage::Shelf { kind, freq_hz, gain_db } => Ok(channels
            .iter()
            .map(|ch| {
                let mut shelf = match kind {
                    ShelfKind::Low => Biquad::low_shelf(freq_hz, gain_db, sr),
                    ShelfKind::High => Biquad::high_shelf(freq_hz, gain_db, sr),
                };
                shelf.process_block(ch)
            })
            .collect()),
        Stage::Peaking { freq_hz, q, gain_db } => Ok(channels
            .iter()
            .map(|ch| Biquad::peaking(freq_hz, q, gain_db, sr).process_block(ch))
            .collect()),
        Stage::Compressor {
            threshold_db,
            knee_db,
            ratio,
            attack_s,
            release_s,
        } => Ok(channels
            .iter()
            .map(|ch| {
                Compressor::new(threshold_db, knee_db, ratio, attack_s, release_s, sr)
                    .process_block(ch)
            })
            .collect()),
        Stage::Limiter {
            threshold_db,
            ratio,
            attack_s,
            release_s,
        } => Ok(channels
            .iter()
            .map(|ch| Limiter::new(threshold_db, ratio, attack_s, release_s, sr).process_block(ch))
            .collect()),
        Stage::ConvolutionReverb {
            impulse_duration_s,
            decay_exponent,
            dry_mix,
            wet_mix,
        } => {
            // One impulse per render, shared across channels
            let impulse =
                decaying_noise_impulse(impulse_duration_s, decay_exponent, sample_rate, rng)?;
            channels
                .iter()
                .map(|ch| {
                    let wet = convolve_truncated(ch, &impulse, cancel)?;
                    Ok(ch
                        .iter()
                        .zip(wet.iter())
                        .map(|(&dry, &w)| dry * dry_mix + w * wet_mix)
                        .collect())
                })
                .collect()
        }
        Stage::Gain { factor } => Ok(channels
            .iter()
            .map(|ch| ch.iter().map(|&x| x * factor).collect())
            .collect()),
    }
}
