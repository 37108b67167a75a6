//! Error types for the engine boundary.
//!
//! Parameter problems surface at construction time (`ConfigError`), never
//! mid-render. Offline renders fail with `RenderError` and leave the caller's
//! input buffer untouched. "No pitch" and silent buffers are normal analysis
//! results, not errors.

use thiserror::Error;

/// Failure to decode an input byte stream into a sample buffer.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed WAV data: {0}")]
    MalformedWav(#[from] hound::Error),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("audio stream contains no channels")]
    EmptyStream,
}

/// Failure during an offline render pass.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The render was superseded or cancelled; no partial result exists.
    #[error("render cancelled")]
    Cancelled,

    /// Impulse response would exceed the convolution workspace cap.
    #[error("impulse response too large: {samples} samples")]
    ImpulseTooLarge { samples: usize },
}

/// Invalid stage, chain, buffer, or session parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{context}: frequency must be positive and finite, got {value}")]
    InvalidFrequency { context: &'static str, value: f32 },

    #[error("{context}: ratio must be >= 1, got {value}")]
    InvalidRatio { context: &'static str, value: f32 },

    #[error("{context}: time must be non-negative and finite, got {value} s")]
    InvalidTime { context: &'static str, value: f32 },

    #[error("{context}: value must be within [{min}, {max}], got {value}")]
    OutOfRange {
        context: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },

    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("buffer must have at least one channel")]
    NoChannels,

    #[error("all channels must have equal length")]
    ChannelLengthMismatch,

    #[error("frame size must be positive")]
    InvalidFrameSize,

    #[error("no ambience file has been supplied")]
    MissingAmbienceFile,
}
