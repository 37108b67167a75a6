//! voxlab: the audio engine of a voice-training application.
//!
//! The engine only ever consumes and produces numeric signal data. An
//! external capture layer streams live frames into [`RealTimeAnalyzer`]; a
//! finished recording arrives as an immutable [`SampleBuffer`] and flows
//! through the offline passes ([`analyze_pauses`], [`analyze_quality`]),
//! optionally through an effect chain ([`chain::render`], presets in
//! [`FilterPreset`]) or the fixed mastering pass ([`mastering::master`]),
//! and leaves as canonical WAV bytes ([`wav::encode_wav`]). The ambient bed
//! synthesizer ([`AmbientSynth`]) runs beside all of that and never touches
//! recorded buffers.
//!
//! Offline passes are run-to-completion batch operations and accept a
//! [`CancelToken`] where a host may supersede them. Buffers are immutable
//! once captured, so concurrent analyzers need no locking.

pub mod analyzer;
pub mod buffer;
pub mod chain;
pub mod dsp;
pub mod error;
pub mod mastering;
pub mod noise;
pub mod session;
pub mod wav;

pub use analyzer::{
    analyze_pauses, analyze_quality, detect_pitch, AnalysisFrame, BufferFrames, FrameProducer,
    FrameSource, PauseStats, PitchLabel, QualityReport, RealTimeAnalyzer,
};
pub use buffer::SampleBuffer;
pub use chain::{EffectChain, FilterPreset, ShelfKind, Stage};
pub use error::{ConfigError, DecodeError, RenderError};
pub use noise::{AmbientSynth, NoiseKind};
pub use session::{AudioSession, CancelToken, DEFAULT_FRAME_SIZE};

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SR: u32 = 44100;

    /// 1 s of 440 Hz tone, 1 s of silence, 1 s of 440 Hz tone.
    fn tone_silence_tone() -> SampleBuffer {
        let tone: Vec<f32> = (0..SR as usize)
            .map(|i| 0.6 * (2.0 * PI * 440.0 * i as f32 / SR as f32).sin())
            .collect();
        let mut samples = tone.clone();
        samples.extend(std::iter::repeat(0.0).take(SR as usize));
        samples.extend(tone);
        SampleBuffer::from_mono(samples, SR).unwrap()
    }

    #[test]
    fn recording_scenario_end_to_end() {
        let buffer = tone_silence_tone();
        assert!((buffer.duration_seconds() - 3.0).abs() < 1e-4);

        // One mid-recording pause
        let stats = analyze_pauses(&buffer);
        assert_eq!(stats.pause_count, 1);
        assert!(stats.average_volume > 0.0);

        // Any window inside either tone segment reads 440 Hz
        for start in [0, 4096, 2 * SR as usize + 4096] {
            let frame = &buffer.channel(0)[start..start + 2048];
            let pitch = detect_pitch(frame, SR);
            assert!((pitch - 440.0).abs() <= 5.0, "window at {start}: {pitch}");
        }

        // Tone amplitude stays under the clipping threshold
        let report = analyze_quality(&buffer);
        assert!(!report.clipping_detected);
        assert!(!report.has_silence_issues);
    }

    #[test]
    fn render_then_export_pipeline() {
        let buffer = tone_silence_tone();

        let cleaned = chain::render(&buffer, &FilterPreset::Clean.chain()).unwrap();
        let mastered = mastering::master(&cleaned).unwrap();
        let bytes = wav::encode_wav(&mastered);

        assert_eq!(bytes.len(), 44 + mastered.len() * 2);
        let back = wav::decode_wav(&bytes).unwrap();
        assert_eq!(back.len(), buffer.len());
        assert_eq!(back.sample_rate(), SR);

        // The original capture is untouched by the whole pipeline
        assert_eq!(buffer, tone_silence_tone());
    }

    #[test]
    fn live_ticks_over_a_recording() {
        let session = AudioSession::new(SR).unwrap();
        let analyzer = RealTimeAnalyzer::new(&session);
        let buffer = tone_silence_tone();

        let mut producer = BufferFrames::new(&buffer);
        let mut frame = vec![0.0f32; session.frame_size()];
        let mut voiced_ticks = 0;
        let mut unvoiced_ticks = 0;

        while producer.next_frame(&mut frame) {
            let tick = analyzer.analyze(&frame, &[]);
            match tick.pitch_label {
                PitchLabel::Unvoiced => unvoiced_ticks += 1,
                _ => voiced_ticks += 1,
            }
        }

        // Roughly two thirds voiced, one third silent
        assert!(voiced_ticks > unvoiced_ticks);
        assert!(unvoiced_ticks > 0);
    }

    #[test]
    fn superseding_a_render() {
        let buffer = tone_silence_tone();
        let token = CancelToken::new();
        token.cancel();

        let result = chain::render_cancellable(&buffer, &FilterPreset::Auditorium.chain(), &token);
        assert!(matches!(result, Err(RenderError::Cancelled)));

        // Caller retains the original and can retry without the token
        let retry = chain::render_preset(&buffer, FilterPreset::Original).unwrap();
        assert_eq!(retry, buffer);
    }
}
