use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::feedback::AnalysisResult;
use crate::channel::ServerEvent;
use crate::transcript::TranscriptEntry;

/// Interview session state machine values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Connecting,
    Listening,
    Speaking,
    Analyzing,
    Ended,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Ended | SessionStatus::Error)
    }

    /// States in which the inactivity watchdog may end the session
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Listening | SessionStatus::Speaking)
    }
}

/// Events consumed by the session reducer
///
/// Every source of concurrency (channel reader, playback timers, watchdog,
/// host) feeds this single stream; only the controller mutates state.
#[derive(Debug)]
pub enum SessionEvent {
    ChannelOpened,
    ChannelMessage(ServerEvent),
    ChannelClosed,
    ChannelError(String),
    PlaybackFinished(u64),
    WatchdogFired,
    StopRequested,
}

/// Host-facing notifications. The host owns rendering; the core makes no
/// assumptions about the surface.
#[derive(Debug, Clone)]
pub enum SessionNotification {
    StatusChanged(SessionStatus),
    TranscriptUpdated(Vec<TranscriptEntry>),
    AnalysisReady(AnalysisResult),
    SessionError(String),
}

/// Cloneable handle the host uses to signal a running session.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(events: mpsc::Sender<SessionEvent>) -> Self {
        Self { events }
    }

    /// Request an explicit stop. Safe to call more than once.
    pub async fn stop(&self) {
        let _ = self.events.send(SessionEvent::StopRequested).await;
    }
}
