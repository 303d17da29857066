use std::time::Duration;

/// Outbound audio frame: microphone → wire (16 kHz mono PCM16 bytes).
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    /// Encoded 16-bit little-endian PCM bytes
    pub pcm: Vec<u8>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

/// Inbound audio frame: wire → speaker (24 kHz mono samples).
#[derive(Debug, Clone)]
pub struct InboundFrame {
    /// Decoded i16 PCM samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl InboundFrame {
    /// Playback duration of this buffer at its sample rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}
