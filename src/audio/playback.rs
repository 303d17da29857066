use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::frame::InboundFrame;
use crate::session::SessionEvent;

/// Monotonic clock for the playback timeline
///
/// Injectable so scheduling decisions can be tested against a manual clock.
pub trait PlaybackClock: Send + Sync {
    /// Elapsed time since the clock origin
    fn now(&self) -> Duration;
}

/// Real clock anchored at scheduler creation.
pub struct MonotonicClock {
    origin: tokio::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Rendering surface for scheduled buffers
///
/// The scheduler decides *when* each buffer starts; the sink decides how it
/// is rendered. `stop_all` must tolerate being called with buffers mid-play
/// or with nothing playing at all.
pub trait PlaybackSink: Send + Sync {
    fn play(&self, handle_id: u64, frame: &InboundFrame);
    fn stop_all(&self);
}

/// Sink that discards audio; used when no output device is wired up.
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn play(&self, _handle_id: u64, _frame: &InboundFrame) {}
    fn stop_all(&self) {}
}

/// A single scheduled playback decision, returned for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSlot {
    pub handle_id: u64,
    /// Start offset on the scheduler timeline
    pub start: Duration,
    /// Buffer duration
    pub duration: Duration,
}

/// Schedules inbound audio buffers for gapless, non-overlapping playback.
///
/// Each buffer starts at `max(clock.now(), next_slot)` and advances
/// `next_slot` by its duration, so chunks play back-to-back regardless of
/// arrival jitter. The cursor is monotonically non-decreasing and never
/// behind the clock at a scheduling decision.
pub struct PlaybackScheduler {
    clock: Arc<dyn PlaybackClock>,
    sink: Arc<dyn PlaybackSink>,
    events: mpsc::Sender<SessionEvent>,
    next_slot: Duration,
    next_handle_id: u64,
    live: HashMap<u64, JoinHandle<()>>,
}

impl PlaybackScheduler {
    pub fn new(
        clock: Arc<dyn PlaybackClock>,
        sink: Arc<dyn PlaybackSink>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            clock,
            sink,
            events,
            next_slot: Duration::ZERO,
            next_handle_id: 0,
            live: HashMap::new(),
        }
    }

    /// Schedule a decoded buffer at the next free timeline slot.
    pub fn enqueue(&mut self, frame: InboundFrame) -> PlaybackSlot {
        let now = self.clock.now();
        let start = self.next_slot.max(now);
        let duration = frame.duration();
        self.next_slot = start + duration;

        let handle_id = self.next_handle_id;
        self.next_handle_id += 1;

        let slot = PlaybackSlot {
            handle_id,
            start,
            duration,
        };

        debug!(
            "Scheduled playback handle {} at {:?} for {:?}",
            handle_id, start, duration
        );

        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let delay = start.saturating_sub(now);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.play(handle_id, &frame);
            tokio::time::sleep(duration).await;
            let _ = events.send(SessionEvent::PlaybackFinished(handle_id)).await;
        });

        self.live.insert(handle_id, task);

        slot
    }

    /// Record natural completion of a handle. Returns true if the live set
    /// drained (drives `speaking → listening`).
    pub fn on_finished(&mut self, handle_id: u64) -> bool {
        self.live.remove(&handle_id);
        self.live.is_empty()
    }

    /// Whether any scheduled buffer is still live. This is the single
    /// derived "AI is speaking" query; call sites must not duplicate it.
    pub fn is_playing(&self) -> bool {
        !self.live.is_empty()
    }

    /// Current next-free-slot cursor.
    pub fn next_slot(&self) -> Duration {
        self.next_slot
    }

    /// Force-stop every tracked handle, even mid-playback.
    pub fn stop_all(&mut self) {
        if self.live.is_empty() {
            return;
        }

        info!("Force-stopping {} live playback handle(s)", self.live.len());

        for (_, task) in self.live.drain() {
            task.abort();
        }

        self.sink.stop_all();
    }
}
