//! Canonical WAV container: byte-exact 16-bit PCM encode, plus decode of the
//! formats the engine accepts natively (16-bit PCM and 32-bit float WAV).
//!
//! The encoder is hand-rolled because the header layout is part of the
//! engine's contract: exactly `44 + frames * channels * 2` bytes, interleaved
//! little-endian i16, negative samples scaled by 32768 and non-negative by
//! 32767, truncated toward zero. Decoding goes through `hound`; compressed
//! formats are an external collaborator's problem.

use std::io::Cursor;

use crate::buffer::SampleBuffer;
use crate::error::DecodeError;

const HEADER_BYTES: usize = 44;
const BYTES_PER_SAMPLE: usize = 2;

/// Serialize a buffer to a complete WAV byte stream. Pure and deterministic;
/// allocates exactly the output size.
pub fn encode_wav(buffer: &SampleBuffer) -> Vec<u8> {
    let channels = buffer.channel_count();
    let frames = buffer.len();
    let sample_rate = buffer.sample_rate();

    let data_len = frames * channels * BYTES_PER_SAMPLE;
    let file_len = HEADER_BYTES + data_len;
    let mut out = Vec::with_capacity(file_len);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((file_len - 8) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // "fmt " chunk: 16-byte PCM description
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&(channels as u16).to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * BYTES_PER_SAMPLE as u32 * channels as u32).to_le_bytes());
    out.extend_from_slice(&((channels * BYTES_PER_SAMPLE) as u16).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // "data" chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());

    for frame in 0..frames {
        for channel in buffer.channels() {
            let sample = channel[frame].clamp(-1.0, 1.0);
            let scaled = if sample < 0.0 {
                sample * 32768.0
            } else {
                sample * 32767.0
            };
            // `as` truncates toward zero, matching the contract
            out.extend_from_slice(&(scaled as i16).to_le_bytes());
        }
    }

    out
}

/// Decode a WAV byte stream into a planar sample buffer.
pub fn decode_wav(bytes: &[u8]) -> Result<SampleBuffer, DecodeError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(DecodeError::EmptyStream);
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| {
                // Inverse of the canonical asymmetric encode scaling
                s.map(|v| v as f32 / if v < 0 { 32768.0 } else { 32767.0 })
            })
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()?,
        (format, bits) => {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{format:?} at {bits} bits"
            )))
        }
    };

    let channel_count = spec.channels as usize;
    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for (i, sample) in interleaved.into_iter().enumerate() {
        channels[i % channel_count].push(sample);
    }

    SampleBuffer::new(channels, spec.sample_rate).map_err(|_| DecodeError::EmptyStream)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    #[test]
    fn header_layout_is_byte_exact() {
        let buf = SampleBuffer::from_mono(vec![0.0; 100], SR).unwrap();
        let bytes = encode_wav(&buf);

        assert_eq!(bytes.len(), 44 + 100 * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(
            u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            (bytes.len() - 8) as u32
        );
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), SR);
        assert_eq!(
            u32::from_le_bytes(bytes[28..32].try_into().unwrap()),
            SR * 2
        );
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 200);
    }

    #[test]
    fn extremes_scale_asymmetrically() {
        let buf = SampleBuffer::from_mono(vec![-1.0, 1.0, 0.0, -2.0, 2.0], SR).unwrap();
        let bytes = encode_wav(&buf);
        let sample = |i: usize| {
            i16::from_le_bytes(bytes[44 + i * 2..44 + i * 2 + 2].try_into().unwrap())
        };
        assert_eq!(sample(0), -32768);
        assert_eq!(sample(1), 32767);
        assert_eq!(sample(2), 0);
        // Out-of-range input is clamped first
        assert_eq!(sample(3), -32768);
        assert_eq!(sample(4), 32767);
    }

    #[test]
    fn round_trip_within_one_quantization_step() {
        let samples: Vec<f32> = (0..2048)
            .map(|i| ((i as f32 * 0.37).sin() * 0.9).clamp(-1.0, 1.0))
            .collect();
        let buf = SampleBuffer::from_mono(samples.clone(), SR).unwrap();

        let decoded = decode_wav(&encode_wav(&buf)).unwrap();
        assert_eq!(decoded.sample_rate(), SR);
        assert_eq!(decoded.channel_count(), 1);
        assert_eq!(decoded.len(), samples.len());

        let step = 1.0 / 32767.0;
        for (orig, back) in samples.iter().zip(decoded.channel(0).iter()) {
            assert!(
                (orig - back).abs() <= step,
                "{orig} -> {back} differs by more than {step}"
            );
        }
    }

    #[test]
    fn stereo_interleaving_round_trips() {
        let left = vec![0.5f32; 64];
        let right = vec![-0.5f32; 64];
        let buf = SampleBuffer::new(vec![left, right], 48000).unwrap();

        let decoded = decode_wav(&encode_wav(&buf)).unwrap();
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.len(), 64);
        assert!(decoded.channel(0).iter().all(|&x| (x - 0.5).abs() < 1e-3));
        assert!(decoded.channel(1).iter().all(|&x| (x + 0.5).abs() < 1e-3));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_wav(b"definitely not a wav file"),
            Err(DecodeError::MalformedWav(_))
        ));
        assert!(decode_wav(&[]).is_err());
    }

    #[test]
    fn truncated_header_fails_cleanly() {
        let buf = SampleBuffer::from_mono(vec![0.1; 32], SR).unwrap();
        let bytes = encode_wav(&buf);
        assert!(decode_wav(&bytes[..20]).is_err());
    }
}
