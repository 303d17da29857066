pub mod messages;
pub mod ws;

use anyhow::Result;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::audio::OutboundFrame;

pub use messages::{ChannelConfig, OutboundAudioMessage, ServerEvent};
pub use ws::WsChannel;

/// Lifecycle and message events from the remote conversational channel
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The channel is open and ready for audio
    Opened,
    /// A message from the remote peer
    Message(ServerEvent),
    /// The remote peer closed the channel
    Closed,
    /// Transport failure
    Error(String),
}

/// Bidirectional channel to the remote conversational AI
///
/// The wire protocol is an implementation detail; the session core only
/// depends on this trait. Implementations must tolerate `send_audio` before
/// the connection resolves (queue, then flush in order on open) and `close`
/// on an unopened or already-closed channel.
#[async_trait::async_trait]
pub trait ConversationChannel: Send + Sync {
    /// Open the channel. Returns a receiver of channel events; `Opened` is
    /// delivered through it once the connection is live.
    async fn connect(&self, config: ChannelConfig) -> Result<mpsc::Receiver<ChannelEvent>>;

    /// Send one outbound audio frame, preserving capture order.
    async fn send_audio(&self, frame: OutboundFrame) -> Result<()>;

    /// Close the channel. Idempotent.
    async fn close(&self) -> Result<()>;
}

/// Order-preserving buffer for frames sent before the connection resolves.
///
/// Frames queue while disconnected and flush exactly once, in order, when
/// the transport opens. After the flush, sends bypass the queue.
pub struct PendingSends {
    queue: Mutex<Option<Vec<OutboundFrame>>>,
}

impl PendingSends {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Some(Vec::new())),
        }
    }

    /// Queue a frame if the transport is not open yet. Returns false if the
    /// queue was already flushed and the frame should be sent directly.
    pub fn push(&self, frame: OutboundFrame) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        match queue.as_mut() {
            Some(pending) => {
                pending.push(frame);
                true
            }
            None => false,
        }
    }

    /// Take every queued frame, in order, and stop queueing.
    pub fn flush(&self) -> Vec<OutboundFrame> {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.take().unwrap_or_default()
    }
}

impl Default for PendingSends {
    fn default() -> Self {
        Self::new()
    }
}
