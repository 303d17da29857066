use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::events::{SessionEvent, SessionHandle, SessionNotification, SessionStatus};
use super::feedback::{AnalysisResult, FeedbackCoordinator, TranscriptAnalyzer};
use super::watchdog::InactivityWatchdog;
use crate::audio::{
    codec, CaptureBackend, CaptureStream, InboundFrame, MonotonicClock, PlaybackScheduler,
    PlaybackSink,
};
use crate::channel::{ChannelEvent, ConversationChannel, ServerEvent};
use crate::transcript::{strip_end_token, Speaker, TranscriptAggregator, TranscriptEntry};

/// Top-level state machine for one live interview
///
/// Owns the capture stream, playback scheduler, transcript aggregator,
/// inactivity watchdog, and the remote channel handle. All mutation happens
/// on the event loop in [`run`](InterviewSession::run): concurrent sources
/// (channel reader, playback timers, watchdog, host) only send
/// [`SessionEvent`]s.
pub struct InterviewSession {
    config: SessionConfig,
    status: SessionStatus,
    started_at: Option<chrono::DateTime<Utc>>,

    channel: Arc<dyn ConversationChannel>,
    capture: Option<CaptureStream>,
    scheduler: PlaybackScheduler,
    transcript: TranscriptAggregator,
    watchdog: InactivityWatchdog,
    feedback: FeedbackCoordinator,

    analysis: Option<AnalysisResult>,

    /// Teardown guard: once set, release logic never runs again and late
    /// callbacks are discarded. Shared with the capture forwarder, which
    /// checks it per frame.
    cleaning_up: Arc<AtomicBool>,

    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    notifications: mpsc::Sender<SessionNotification>,

    channel_pump: Option<JoinHandle<()>>,
    auto_feedback: bool,
}

impl InterviewSession {
    /// Create a session and hand back the host's notification stream and
    /// control handle.
    pub fn new(
        config: SessionConfig,
        channel: Arc<dyn ConversationChannel>,
        capture_backend: Box<dyn CaptureBackend>,
        sink: Arc<dyn PlaybackSink>,
        analyzer: Arc<dyn TranscriptAnalyzer>,
    ) -> (Self, mpsc::Receiver<SessionNotification>, SessionHandle) {
        let (events_tx, events_rx) = mpsc::channel(256);
        let (notify_tx, notify_rx) = mpsc::channel(256);

        let scheduler = PlaybackScheduler::new(
            Arc::new(MonotonicClock::new()),
            sink,
            events_tx.clone(),
        );

        let watchdog = InactivityWatchdog::spawn(config.watchdog_timeout, events_tx.clone());

        let capture = CaptureStream::new(
            capture_backend,
            config.capture_sample_rate,
            config.frame_samples,
        );

        let feedback = FeedbackCoordinator::new(analyzer, config.topic_prompt.clone());
        let handle = SessionHandle::new(events_tx.clone());

        let session = Self {
            config,
            status: SessionStatus::Idle,
            started_at: None,
            channel,
            capture: Some(capture),
            scheduler,
            transcript: TranscriptAggregator::new(),
            watchdog,
            feedback,
            analysis: None,
            cleaning_up: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx,
            notifications: notify_tx,
            channel_pump: None,
            auto_feedback: false,
        };

        (session, notify_rx, handle)
    }

    /// Start the interview and process events until a terminal state.
    ///
    /// Not reentrant: calling again after the session has left `Idle` is a
    /// no-op. After an inactivity timeout the session generates feedback
    /// automatically before returning.
    pub async fn run(&mut self) -> Result<()> {
        if self.status != SessionStatus::Idle {
            warn!("Interview session already started");
            return Ok(());
        }

        if let Err(e) = self.start().await {
            self.fail(format!("{e:#}")).await;
            return Err(e);
        }

        while !self.status.is_terminal() {
            let event = match self.events_rx.recv().await {
                Some(event) => event,
                None => break,
            };
            self.handle_event(event).await;
        }

        if self.auto_feedback {
            self.auto_feedback = false;
            if let Err(e) = self.generate_feedback().await {
                warn!("Automatic feedback generation failed: {e:#}");
            }
        }

        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        info!("Starting interview session: {}", self.config.interview_id);

        self.set_status(SessionStatus::Connecting).await;
        self.started_at = Some(Utc::now());

        if let Some(capture) = self.capture.as_mut() {
            capture
                .open()
                .await
                .context("Microphone unavailable or permission denied")?;
        }

        let mut channel_events = self
            .channel
            .connect(self.config.channel_config())
            .await
            .context("Failed to connect to the interview service")?;

        let events_tx = self.events_tx.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = channel_events.recv().await {
                let mapped = match event {
                    ChannelEvent::Opened => SessionEvent::ChannelOpened,
                    ChannelEvent::Message(message) => SessionEvent::ChannelMessage(message),
                    ChannelEvent::Closed => SessionEvent::ChannelClosed,
                    ChannelEvent::Error(e) => SessionEvent::ChannelError(e),
                };
                if events_tx.send(mapped).await.is_err() {
                    break;
                }
            }
        });
        self.channel_pump = Some(pump);

        Ok(())
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        // Callbacks racing in after teardown began must not mutate state.
        if self.cleaning_up.load(Ordering::SeqCst) {
            debug!("Discarding event after teardown: {:?}", event);
            return;
        }

        match event {
            SessionEvent::ChannelOpened => {
                if self.status != SessionStatus::Connecting {
                    return;
                }
                info!("Interview channel open, capture begins forwarding");
                self.set_status(SessionStatus::Listening).await;
                if let Some(capture) = self.capture.as_mut() {
                    let channel = Arc::clone(&self.channel);
                    let cleaning_up = Arc::clone(&self.cleaning_up);
                    if let Err(e) = capture.begin_forwarding(channel, cleaning_up) {
                        self.fail(format!("Failed to start capture forwarding: {e:#}"))
                            .await;
                    }
                }
            }

            SessionEvent::ChannelMessage(message) => {
                self.handle_server_event(message).await;
            }

            SessionEvent::ChannelClosed => {
                info!("Interview channel closed by remote peer");
                self.end_interview().await;
            }

            SessionEvent::ChannelError(e) => {
                self.fail(format!("Interview channel error: {e}")).await;
            }

            SessionEvent::PlaybackFinished(handle_id) => {
                let drained = self.scheduler.on_finished(handle_id);
                if drained && self.status == SessionStatus::Speaking {
                    self.set_status(SessionStatus::Listening).await;
                }
            }

            SessionEvent::WatchdogFired => {
                self.handle_watchdog().await;
            }

            SessionEvent::StopRequested => {
                info!("Explicit stop requested");
                self.end_interview().await;
            }
        }
    }

    async fn handle_server_event(&mut self, message: ServerEvent) {
        if let Some(audio) = message.audio {
            match codec::decode_base64(&audio) {
                Ok(bytes) => {
                    let frame = InboundFrame {
                        samples: codec::decode_pcm16(&bytes),
                        sample_rate: self.config.playback_sample_rate,
                    };
                    self.scheduler.enqueue(frame);
                    self.watchdog.rearm();
                    if self.status == SessionStatus::Listening {
                        self.set_status(SessionStatus::Speaking).await;
                    }
                }
                Err(e) => warn!("Dropping undecodable audio payload: {e:#}"),
            }
        }

        let mut transcript_changed = false;
        let mut end_marker = false;

        if let Some(text) = message.user_transcript {
            if self.transcript.push_fragment(Speaker::User, &text) {
                transcript_changed = true;
            }
            self.watchdog.rearm();
        }

        if let Some(text) = message.ai_transcript {
            // The end marker is an out-of-band signal; it must never reach
            // stored text, and an empty residual creates no entry.
            let (residual, saw_token) = strip_end_token(&text);
            if self.transcript.push_fragment(Speaker::Ai, &residual) {
                transcript_changed = true;
            }
            end_marker = saw_token;
            self.watchdog.rearm();
        }

        if message.turn_complete && !self.transcript.is_empty() {
            self.transcript.finalize_all();
            transcript_changed = true;
        }

        if transcript_changed {
            self.notify(SessionNotification::TranscriptUpdated(
                self.transcript.snapshot(),
            ))
            .await;
        }

        if end_marker {
            info!("End-of-interview marker received");
            self.end_interview().await;
        }
    }

    async fn handle_watchdog(&mut self) {
        // False wake: the AI is still speaking or audio is still playing.
        if self.scheduler.is_playing() || self.status == SessionStatus::Speaking {
            self.watchdog.rearm();
            return;
        }

        if self.status.is_live() {
            info!(
                "Ending interview after {:?} of inactivity",
                self.config.watchdog_timeout
            );
            self.end_interview().await;
            self.auto_feedback = true;
        }
    }

    /// Transition to `Ended` with a single teardown pass.
    async fn end_interview(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.teardown().await;
        self.set_status(SessionStatus::Ended).await;
    }

    async fn fail(&mut self, message: String) {
        error!("{message}");
        self.teardown().await;
        self.set_status(SessionStatus::Error).await;
        self.notify(SessionNotification::SessionError(message)).await;
    }

    /// Release every owned resource exactly once.
    ///
    /// Invoked from explicit stop, remote close, remote error, and the
    /// inactivity path; the swap on `cleaning_up` makes the races benign.
    /// Release errors are logged and swallowed so teardown always completes.
    async fn teardown(&mut self) {
        if self.cleaning_up.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("Tearing down interview session");

        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.stop().await {
                warn!("Failed to stop capture stream: {e:#}");
            }
        }

        self.watchdog.disarm();
        self.scheduler.stop_all();

        if let Some(pump) = self.channel_pump.take() {
            pump.abort();
        }

        if let Err(e) = self.channel.close().await {
            warn!("Failed to close interview channel: {e:#}");
        }
    }

    /// Run end-of-session analysis. Callable once the session has ended;
    /// failure reverts to `Ended` with the transcript preserved so the host
    /// can retry.
    pub async fn generate_feedback(&mut self) -> Result<AnalysisResult> {
        if !self.status.is_terminal() {
            bail!("Feedback is only available after the interview has ended");
        }

        self.set_status(SessionStatus::Analyzing).await;

        match self.feedback.generate(self.transcript.entries()).await {
            Ok(result) => {
                self.analysis = Some(result.clone());
                self.set_status(SessionStatus::Ended).await;
                self.notify(SessionNotification::AnalysisReady(result.clone()))
                    .await;
                Ok(result)
            }
            Err(e) => {
                self.set_status(SessionStatus::Ended).await;
                self.notify(SessionNotification::SessionError(format!("{e:#}")))
                    .await;
                Err(e)
            }
        }
    }

    async fn set_status(&mut self, status: SessionStatus) {
        if self.status == status {
            return;
        }

        debug!("Session status: {:?} -> {:?}", self.status, status);
        self.status = status;

        // Entering a live state rearms the idle timer; terminal and
        // analyzing states leave it disarmed.
        if status.is_live() {
            self.watchdog.rearm();
        } else if matches!(
            status,
            SessionStatus::Analyzing | SessionStatus::Ended | SessionStatus::Error
        ) {
            self.watchdog.disarm();
        }

        self.notify(SessionNotification::StatusChanged(status)).await;
    }

    async fn notify(&self, notification: SessionNotification) {
        // A host that dropped its receiver just stops hearing from us.
        let _ = self.notifications.send(notification).await;
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.transcript.entries()
    }

    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn started_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.started_at
    }
}
