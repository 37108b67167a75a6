//! Explicit session context and render cancellation.
//!
//! There is no hidden audio-context singleton: the host constructs an
//! `AudioSession` with the capture parameters it actually runs at and passes
//! it into the components that need them. Offline renders observe a
//! `CancelToken` so a superseding request can invalidate a running one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ConfigError;

/// Recommended analysis window for pitch detection.
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Capture/analysis parameters for one host session. Owned by the caller,
/// cheap to copy into constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSession {
    sample_rate: u32,
    frame_size: usize,
}

impl AudioSession {
    pub fn new(sample_rate: u32) -> Result<Self, ConfigError> {
        Self::with_frame_size(sample_rate, DEFAULT_FRAME_SIZE)
    }

    pub fn with_frame_size(sample_rate: u32, frame_size: usize) -> Result<Self, ConfigError> {
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if frame_size == 0 {
            return Err(ConfigError::InvalidFrameSize);
        }
        Ok(Self {
            sample_rate,
            frame_size,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
}

/// Shared cancellation flag for offline renders.
///
/// Cloning yields a handle to the same flag; the host keeps one clone and
/// hands the other to the render call. Cancellation is observed between
/// stages and between convolution passes, and a cancelled render publishes
/// no partial result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_validates_parameters() {
        assert!(AudioSession::new(44100).is_ok());
        assert!(AudioSession::new(0).is_err());
        assert!(AudioSession::with_frame_size(44100, 0).is_err());
        assert_eq!(AudioSession::new(48000).unwrap().frame_size(), DEFAULT_FRAME_SIZE);
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
