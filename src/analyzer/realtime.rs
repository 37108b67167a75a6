//! Per-tick live analysis: volume, pitch, and tone from one capture frame.
//!
//! Driven by the host's polling loop; each call is a pure function of the
//! frames handed in, so throttling to every Nth tick is entirely the
//! caller's business. When capture is unavailable the analyzer can emit
//! placeholder frames that are explicitly labeled as such, never disguised
//! as measurements.

use serde::{Deserialize, Serialize};

use crate::analyzer::pitch::detect_pitch;
use crate::buffer::SampleBuffer;
use crate::dsp::utils::frame_rms;
use crate::session::AudioSession;

/// Voice register classification of a detected pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitchLabel {
    Unvoiced,
    Low,
    Mid,
    High,
}

/// Whether a frame came from real capture data or the no-capture fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSource {
    Live,
    Placeholder,
}

/// Snapshot of one polling tick. Transient; not persisted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFrame {
    /// 0..=100, RMS scaled.
    pub volume: u8,
    /// Rounded Hz; 0.0 means no reliable pitch.
    pub pitch_hz: f32,
    pub pitch_label: PitchLabel,
    /// 0..=100 brightness proxy (spectral centroid).
    pub tone: u8,
    pub source: FrameSource,
}

/// Pitch register boundaries in Hz.
const LOW_BAND_CEILING_HZ: f32 = 165.0;
const MID_BAND_CEILING_HZ: f32 = 255.0;

/// RMS-to-percent scale for the volume meter.
const VOLUME_SCALE: f32 = 500.0;

/// Centroid-to-percent scale for the tone meter.
const TONE_SCALE: f32 = 300.0;

pub struct RealTimeAnalyzer {
    sample_rate: u32,
    placeholder_phase: f32,
}

impl RealTimeAnalyzer {
    pub fn new(session: &AudioSession) -> Self {
        Self {
            sample_rate: session.sample_rate(),
            placeholder_phase: 0.0,
        }
    }

    /// Analyze one tick worth of capture data: a time-domain frame and the
    /// matching frequency-domain magnitude array.
    pub fn analyze(&self, time_domain: &[f32], freq_magnitudes: &[f32]) -> AnalysisFrame {
        let rms = frame_rms(time_domain);
        let volume = (rms * VOLUME_SCALE).round().min(100.0) as u8;

        let pitch_hz = detect_pitch(time_domain, self.sample_rate).round();
        let pitch_label = classify_pitch(pitch_hz);

        AnalysisFrame {
            volume,
            pitch_hz,
            pitch_label,
            tone: spectral_tone(freq_magnitudes),
            source: FrameSource::Live,
        }
    }

    /// Fallback for hosts with no capture stream (permission denied, no
    /// device). Produces smoothly varying synthetic metrics, labeled
    /// `FrameSource::Placeholder` so they can never be mistaken for
    /// measurements.
    pub fn placeholder_frame(&mut self) -> AnalysisFrame {
        self.placeholder_phase += 0.35;
        let p = self.placeholder_phase;

        let volume = (45.0 + 20.0 * p.sin()).round().clamp(0.0, 100.0) as u8;
        let pitch_hz = (180.0 + 40.0 * (0.4 * p).sin()).round();
        let tone = (50.0 + 25.0 * (0.23 * p + 1.0).sin())
            .round()
            .clamp(0.0, 100.0) as u8;

        AnalysisFrame {
            volume,
            pitch_hz,
            pitch_label: classify_pitch(pitch_hz),
            tone,
            source: FrameSource::Placeholder,
        }
    }
}

fn classify_pitch(pitch_hz: f32) -> PitchLabel {
    if pitch_hz <= 0.0 {
        PitchLabel::Unvoiced
    } else if pitch_hz < LOW_BAND_CEILING_HZ {
        PitchLabel::Low
    } else if pitch_hz < MID_BAND_CEILING_HZ {
        PitchLabel::Mid
    } else {
        PitchLabel::High
    }
}

/// Spectral-centroid brightness proxy over a magnitude array, scaled to
/// 0..=100. An empty or silent spectrum reads as 0.
fn spectral_tone(magnitudes: &[f32]) -> u8 {
    let mut numerator = 0.0f32;
    let mut denominator = 0.0f32;
    for (i, &mag) in magnitudes.iter().enumerate() {
        numerator += i as f32 * mag;
        denominator += mag;
    }
    if denominator == 0.0 {
        return 0;
    }
    let centroid = numerator / denominator;
    ((centroid / magnitudes.len() as f32) * TONE_SCALE)
        .round()
        .min(100.0) as u8
}

/// A lazy, restartable source of analysis frames: finite for decoded files,
/// unbounded for live capture (implemented host-side). The consumer stops a
/// stream by simply ceasing to pull.
pub trait FrameProducer {
    /// Fill `frame` with the next samples. Returns `false` when the source
    /// is exhausted; live sources never are.
    fn next_frame(&mut self, frame: &mut [f32]) -> bool;

    /// Rewind to the beginning of the sequence where that is meaningful.
    fn restart(&mut self);
}

/// Finite producer over the first channel of a captured buffer.
pub struct BufferFrames<'a> {
    buffer: &'a SampleBuffer,
    pos: usize,
}

impl<'a> BufferFrames<'a> {
    pub fn new(buffer: &'a SampleBuffer) -> Self {
        Self { buffer, pos: 0 }
    }
}

impl FrameProducer for BufferFrames<'_> {
    fn next_frame(&mut self, frame: &mut [f32]) -> bool {
        let data = self.buffer.channel(0);
        if self.pos >= data.len() {
            return false;
        }
        let available = (data.len() - self.pos).min(frame.len());
        frame[..available].copy_from_slice(&data[self.pos..self.pos + available]);
        // Zero-pad a final partial frame
        frame[available..].fill(0.0);
        self.pos += frame.len();
        true
    }

    fn restart(&mut self) {
        self.pos = 0;
    }
}
