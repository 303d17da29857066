pub mod capture;
pub mod codec;
pub mod frame;
pub mod playback;

pub use capture::{CaptureBackend, CaptureStream, MicrophoneBackend};
pub use frame::{InboundFrame, OutboundFrame};
pub use playback::{
    MonotonicClock, NullSink, PlaybackClock, PlaybackScheduler, PlaybackSink, PlaybackSlot,
};
