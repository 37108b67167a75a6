//! Ambient noise bed synthesizer.
//!
//! One bed at a time: starting a new bed tears the old one down first. The
//! bed is a 2-second looping noise buffer shaped by a per-kind low-pass (or
//! a caller-decoded file), mixed into the host's output through an
//! exponentially-ramped master gain. The host pulls audio with `render`;
//! after `stop`, generator resources are released only once the fade-out
//! ramp completes, so the bed never clicks off.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::dsp::Biquad;
use crate::error::ConfigError;
use crate::session::AudioSession;

/// Looping noise buffer length in seconds.
const BED_SECONDS: f32 = 2.0;

/// Exponential ramp floor; gains never reach exact zero.
const GAIN_FLOOR: f32 = 1e-3;

/// Fade-in and stop fade-out time.
const START_STOP_RAMP_S: f32 = 1.0;

/// Volume-change ramp time.
const VOLUME_RAMP_S: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseKind {
    Rain,
    Fire,
    Cafe,
    File,
}

struct KindShape {
    /// Low-pass cutoff applied to the white-noise bed.
    cutoff_hz: f32,
    /// Output gain applied after filtering.
    output_gain: f32,
}

fn shape_for(kind: NoiseKind) -> KindShape {
    match kind {
        // Steady wash
        NoiseKind::Rain => KindShape {
            cutoff_hz: 800.0,
            output_gain: 0.5,
        },
        // Low rumble, hotter to compensate for the narrow band
        NoiseKind::Fire => KindShape {
            cutoff_hz: 150.0,
            output_gain: 0.6,
        },
        // Pink-noise proxy for room tone
        NoiseKind::Cafe => KindShape {
            cutoff_hz: 400.0,
            output_gain: 0.4,
        },
        NoiseKind::File => KindShape {
            cutoff_hz: 0.0,
            output_gain: 1.0,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BedPhase {
    Running,
    Stopping,
}

struct ActiveBed {
    kind: NoiseKind,
    samples: Vec<f32>,
    pos: usize,
    gain: f32,
    target_gain: f32,
    /// Per-sample multiplicative step toward `target_gain`.
    ramp_step: f32,
    phase: BedPhase,
}

impl ActiveBed {
    fn retarget(&mut self, target: f32, ramp_seconds: f32, sample_rate: f32) {
        let target = target.max(GAIN_FLOOR);
        self.target_gain = target;
        let steps = (ramp_seconds * sample_rate).max(1.0);
        self.ramp_step = (target / self.gain.max(GAIN_FLOOR)).powf(1.0 / steps);
    }

    #[inline]
    fn advance_gain(&mut self) {
        if (self.gain - self.target_gain).abs() <= self.target_gain * 1e-3 {
            self.gain = self.target_gain;
        } else {
            self.gain *= self.ramp_step;
        }
    }
}

/// Session-scoped ambient noise source. At most one bed is active; its
/// lifecycle belongs to the host session, not to any recording.
pub struct AmbientSynth {
    sample_rate: u32,
    rng: StdRng,
    user_file: Option<SampleBuffer>,
    bed: Option<ActiveBed>,
}

impl AmbientSynth {
    pub fn new(session: &AudioSession) -> Self {
        Self::with_seed(session, rand::random())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(session: &AudioSession, seed: u64) -> Self {
        Self {
            sample_rate: session.sample_rate(),
            rng: StdRng::seed_from_u64(seed),
            user_file: None,
            bed: None,
        }
    }

    /// Supply a decoded file to loop for `NoiseKind::File`.
    pub fn set_user_file(&mut self, buffer: SampleBuffer) {
        self.user_file = Some(buffer);
    }

    /// Start a bed, replacing any active one (never overlapping sources).
    /// The master gain ramps in from near-zero over one second.
    pub fn play(&mut self, kind: NoiseKind, gain: f32) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&gain) {
            return Err(ConfigError::OutOfRange {
                context: "ambience gain",
                min: 0.0,
                max: 1.0,
                value: gain,
            });
        }

        let samples = match kind {
            NoiseKind::File => {
                let file = self.user_file.as_ref().ok_or(ConfigError::MissingAmbienceFile)?;
                if file.is_empty() {
                    return Err(ConfigError::MissingAmbienceFile);
                }
                file.channel(0).to_vec()
            }
            _ => self.build_noise_bed(kind),
        };

        let mut bed = ActiveBed {
            kind,
            samples,
            pos: 0,
            gain: GAIN_FLOOR,
            target_gain: GAIN_FLOOR,
            ramp_step: 1.0,
            phase: BedPhase::Running,
        };
        bed.retarget(gain, START_STOP_RAMP_S, self.sample_rate as f32);
        self.bed = Some(bed);

        log::debug!("ambience started: {kind:?} at gain {gain:.2}");
        Ok(())
    }

    /// Ramp the running bed to a new gain over 0.1 s. No-op when idle.
    pub fn set_volume(&mut self, gain: f32) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&gain) {
            return Err(ConfigError::OutOfRange {
                context: "ambience gain",
                min: 0.0,
                max: 1.0,
                value: gain,
            });
        }
        let sample_rate = self.sample_rate as f32;
        if let Some(bed) = self.bed.as_mut() {
            if bed.phase == BedPhase::Running {
                bed.retarget(gain, VOLUME_RAMP_S, sample_rate);
            }
        }
        Ok(())
    }

    /// Begin the one-second fade-out. Generator resources are released by a
    /// later `render` call once the ramp has completed, never before.
    pub fn stop(&mut self) {
        let sample_rate = self.sample_rate as f32;
        if let Some(bed) = self.bed.as_mut() {
            bed.phase = BedPhase::Stopping;
            bed.retarget(GAIN_FLOOR, START_STOP_RAMP_S, sample_rate);
            log::debug!("ambience stopping: {:?}", bed.kind);
        }
    }

    pub fn is_active(&self) -> bool {
        self.bed.is_some()
    }

    pub fn current_kind(&self) -> Option<NoiseKind> {
        self.bed.as_ref().map(|bed| bed.kind)
    }

    /// Mix the bed into `out` (additive). Silent when idle.
    pub fn render(&mut self, out: &mut [f32]) {
        let Some(bed) = self.bed.as_mut() else {
            return;
        };

        let mut faded_out = false;
        for slot in out.iter_mut() {
            *slot += bed.samples[bed.pos] * bed.gain;
            bed.pos = (bed.pos + 1) % bed.samples.len();
            bed.advance_gain();

            if bed.phase == BedPhase::Stopping && bed.gain <= GAIN_FLOOR {
                faded_out = true;
                break;
            }
        }

        if faded_out {
            let kind = bed.kind;
            self.bed = None;
            log::debug!("ambience released: {kind:?}");
        }
    }

    fn build_noise_bed(&mut self, kind: NoiseKind) -> Vec<f32> {
        let shape = shape_for(kind);
        let len = (BED_SECONDS * self.sample_rate as f32) as usize;

        let white: Vec<f32> = (0..len).map(|_| self.rng.gen_range(-1.0..1.0)).collect();
        let mut filter = Biquad::low_pass(shape.cutoff_hz, 0.707, self.sample_rate as f32);
        white
            .iter()
            .map(|&x| filter.process(x) * shape.output_gain)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::utils::frame_rms;

    const SR: u32 = 44100;

    fn synth() -> AmbientSynth {
        let session = AudioSession::new(SR).unwrap();
        AmbientSynth::with_seed(&session, 1234)
    }

    fn drain(synth: &mut AmbientSynth, seconds: f32) -> Vec<f32> {
        let mut out = vec![0.0f32; (seconds * SR as f32) as usize];
        synth.render(&mut out);
        out
    }

    #[test]
    fn play_fades_in_over_a_second() {
        let mut synth = synth();
        synth.play(NoiseKind::Rain, 0.8).unwrap();

        let out = drain(&mut synth, 2.0);
        let early = frame_rms(&out[..4410]); // first 100 ms
        let late = frame_rms(&out[(1.5 * SR as f32) as usize..]); // post-ramp
        assert!(early < late * 0.5, "early {early}, late {late}");
        assert!(late > 0.0);
    }

    #[test]
    fn replacing_a_bed_never_overlaps_sources() {
        let mut synth = synth();
        synth.play(NoiseKind::Rain, 0.5).unwrap();
        synth.play(NoiseKind::Fire, 0.5).unwrap();
        assert_eq!(synth.current_kind(), Some(NoiseKind::Fire));
    }

    #[test]
    fn stop_releases_only_after_the_ramp() {
        let mut synth = synth();
        synth.play(NoiseKind::Cafe, 0.6).unwrap();
        drain(&mut synth, 2.0);

        synth.stop();
        assert!(synth.is_active(), "resources held during fade");

        // Half the fade: still active
        drain(&mut synth, 0.5);
        assert!(synth.is_active());

        // Well past the fade: released
        drain(&mut synth, 2.0);
        assert!(!synth.is_active());
    }

    #[test]
    fn fire_is_darker_than_rain() {
        // Compare energy above ~1 kHz via a crude difference proxy: the
        // rain bed (800 Hz cutoff) must fluctuate faster than fire (150 Hz)
        let mut synth = synth();
        synth.play(NoiseKind::Rain, 1.0).unwrap();
        let rain = drain(&mut synth, 2.0);

        synth.play(NoiseKind::Fire, 1.0).unwrap();
        let fire = drain(&mut synth, 2.0);

        let hf = |x: &[f32]| {
            let mut sum = 0.0f32;
            for pair in x.windows(2) {
                let d = pair[1] - pair[0];
                sum += d * d;
            }
            (sum / (x.len() - 1) as f32).sqrt()
        };
        let tail = (1.5 * SR as f32) as usize;
        assert!(hf(&rain[tail..]) > 2.0 * hf(&fire[tail..]));
    }

    #[test]
    fn file_kind_requires_a_file() {
        let mut synth = synth();
        assert!(matches!(
            synth.play(NoiseKind::File, 0.5),
            Err(ConfigError::MissingAmbienceFile)
        ));

        let file = SampleBuffer::from_mono(vec![0.25; 1000], SR).unwrap();
        synth.set_user_file(file);
        synth.play(NoiseKind::File, 1.0).unwrap();

        let out = drain(&mut synth, 2.0);
        // Looped constant file: post-ramp output sits near 0.25
        let tail = &out[(1.8 * SR as f32) as usize..];
        assert!((frame_rms(tail) - 0.25).abs() < 0.02);
    }

    #[test]
    fn gain_out_of_range_is_rejected() {
        let mut synth = synth();
        assert!(synth.play(NoiseKind::Rain, 1.5).is_err());
        assert!(synth.play(NoiseKind::Rain, -0.1).is_err());
        synth.play(NoiseKind::Rain, 0.5).unwrap();
        assert!(synth.set_volume(2.0).is_err());
        assert!(synth.set_volume(0.9).is_ok());
    }

    #[test]
    fn volume_ramp_reaches_new_target() {
        let mut synth = synth();
        synth.play(NoiseKind::File, 0.0).unwrap_err(); // no file: state untouched
        synth.play(NoiseKind::Rain, 0.2).unwrap();
        drain(&mut synth, 2.0);
        let low = frame_rms(&drain(&mut synth, 0.5));

        synth.set_volume(0.9).unwrap();
        drain(&mut synth, 0.5); // let the 0.1 s ramp finish
        let high = frame_rms(&drain(&mut synth, 0.5));
        assert!(high > low * 3.0, "low {low}, high {high}");
    }
}
