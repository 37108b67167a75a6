//! DSP stage primitives: per-sample filters and dynamics, plus the
//! convolution-reverb building blocks. Stages hold per-channel state and are
//! instantiated fresh for every render pass.

pub mod biquad;
pub mod compressor;
pub mod limiter;
pub mod reverb;
pub mod utils;

pub use biquad::Biquad;
pub use compressor::Compressor;
pub use limiter::Limiter;
