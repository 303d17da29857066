pub mod config;
pub mod controller;
pub mod events;
pub mod feedback;
pub mod watchdog;

pub use config::SessionConfig;
pub use controller::InterviewSession;
pub use events::{SessionEvent, SessionHandle, SessionNotification, SessionStatus};
pub use feedback::{
    AnalysisResult, FeedbackCoordinator, TranscriptAnalyzer, MIN_FINALIZED_ENTRIES,
};
pub use watchdog::InactivityWatchdog;
