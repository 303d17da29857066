use anyhow::{Context, Result};
use base64::Engine;

/// Convert floating-point samples in [-1.0, 1.0] to 16-bit signed PCM bytes
/// (little-endian).
///
/// Clamping is symmetric: negative samples scale by 32768 and positive ones
/// by 32767, so both full-scale extremes map onto representable values
/// without wrapping.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let scale = if clamped < 0.0 { 32768.0 } else { 32767.0 };
        let value = (clamped * scale) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode little-endian 16-bit signed PCM bytes into samples.
///
/// A trailing odd byte is dropped rather than treated as an error; partial
/// network reads should not kill playback.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Encode raw bytes into the transport-safe text form used on the wire.
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a transport payload back into raw bytes.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("Failed to decode base64 audio payload")
}
