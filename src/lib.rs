pub mod audio;
pub mod channel;
pub mod config;
pub mod session;
pub mod transcript;

pub use audio::{
    CaptureBackend, CaptureStream, InboundFrame, MicrophoneBackend, MonotonicClock, NullSink,
    OutboundFrame, PlaybackClock, PlaybackScheduler, PlaybackSink, PlaybackSlot,
};
pub use channel::{
    ChannelConfig, ChannelEvent, ConversationChannel, OutboundAudioMessage, ServerEvent, WsChannel,
};
pub use config::Config;
pub use session::{
    AnalysisResult, FeedbackCoordinator, InterviewSession, SessionConfig, SessionHandle,
    SessionNotification, SessionStatus, TranscriptAnalyzer,
};
pub use transcript::{
    Speaker, TranscriptAggregator, TranscriptEntry, END_OF_INTERVIEW_TOKEN,
};
