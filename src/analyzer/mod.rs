//! Signal analysis: live per-tick metrics and offline passes over a
//! captured buffer.

pub mod pauses;
pub mod pitch;
pub mod quality;
pub mod realtime;

pub use pauses::{analyze_pauses, PauseStats};
pub use pitch::detect_pitch;
pub use quality::{analyze_quality, QualityReport};
pub use realtime::{
    AnalysisFrame, BufferFrames, FrameProducer, FrameSource, PitchLabel, RealTimeAnalyzer,
};
