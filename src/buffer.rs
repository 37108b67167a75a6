//! Captured audio as an immutable value.
//!
//! A `SampleBuffer` is the unit every offline component consumes: the decoder
//! produces one, the analyzers read it, and every transform returns a fresh
//! one. Once constructed it is never mutated, so concurrent analysis passes
//! need no synchronization.

use crate::error::ConfigError;

/// Planar float audio: one `Vec<f32>` per channel, values conceptually in
/// [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub(crate) channels: Vec<Vec<f32>>,
    pub(crate) sample_rate: u32,
}

impl SampleBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// Requires at least one channel, equal channel lengths, and a positive
    /// sample rate. Zero-length channels are allowed; analyzers treat them as
    /// degenerate silence.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        let len = channels[0].len();
        if channels.iter().any(|ch| ch.len() != len) {
            return Err(ConfigError::ChannelLengthMismatch);
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel convenience constructor.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, ConfigError> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_seconds(&self) -> f32 {
        self.len() as f32 / self.sample_rate as f32
    }

    /// Samples of one channel. Panics if `index` is out of bounds, which is a
    /// caller bug; channel count is fixed at construction.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }
}
