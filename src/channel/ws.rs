use anyhow::{Context, Result};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use super::{ChannelConfig, ChannelEvent, ConversationChannel, OutboundAudioMessage, PendingSends, ServerEvent};
use crate::audio::{codec, OutboundFrame};

type WsWriter = futures::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// WebSocket transport for the conversational channel
///
/// Sends a JSON setup message on connect, then JSON-encoded audio frames
/// outbound and JSON [`ServerEvent`]s inbound. Frames sent before the
/// connection resolves are queued and flushed in order once it opens.
pub struct WsChannel {
    url: String,
    interview_id: StdMutex<String>,
    sequence: AtomicU32,
    writer: Mutex<Option<WsWriter>>,
    pending: PendingSends,
}

impl WsChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            interview_id: StdMutex::new(String::new()),
            sequence: AtomicU32::new(0),
            writer: Mutex::new(None),
            pending: PendingSends::new(),
        }
    }

    fn encode_frame(&self, frame: &OutboundFrame) -> Result<String> {
        let interview_id = self
            .interview_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let message = OutboundAudioMessage {
            interview_id,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            pcm: codec::encode_base64(&frame.pcm),
            sample_rate: frame.sample_rate,
            channels: frame.channels,
            timestamp: Utc::now().to_rfc3339(),
        };

        serde_json::to_string(&message).context("Failed to serialize audio frame")
    }
}

#[async_trait::async_trait]
impl ConversationChannel for WsChannel {
    async fn connect(&self, config: ChannelConfig) -> Result<mpsc::Receiver<ChannelEvent>> {
        info!("Connecting to interview channel at {}", self.url);

        {
            let mut id = self.interview_id.lock().unwrap_or_else(|e| e.into_inner());
            *id = config.interview_id.clone();
        }

        let (socket, _) = connect_async(self.url.as_str())
            .await
            .context("Failed to open interview channel")?;

        let (mut write, mut read) = socket.split();

        let setup = serde_json::to_string(&config).context("Failed to serialize channel setup")?;
        write
            .send(Message::Text(setup))
            .await
            .context("Failed to send channel setup")?;

        // Install the writer and flush the pre-open queue under the same
        // lock, so direct sends cannot overtake queued frames.
        {
            let mut writer = self.writer.lock().await;
            for frame in self.pending.flush() {
                let text = self.encode_frame(&frame)?;
                write
                    .send(Message::Text(text))
                    .await
                    .context("Failed to flush queued audio frame")?;
            }
            *writer = Some(write);
        }

        info!("Interview channel open");

        let (events_tx, events_rx) = mpsc::channel(64);
        let _ = events_tx.send(ChannelEvent::Opened).await;

        tokio::spawn(async move {
            loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                if events_tx.send(ChannelEvent::Message(event)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Failed to parse channel message: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = events_tx.send(ChannelEvent::Closed).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = events_tx.send(ChannelEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
            info!("Interview channel reader stopped");
        });

        Ok(events_rx)
    }

    async fn send_audio(&self, frame: OutboundFrame) -> Result<()> {
        // Queue-then-flush before the connection resolves.
        if self.pending.push(frame.clone()) {
            return Ok(());
        }

        let text = self.encode_frame(&frame)?;

        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(write) => write
                .send(Message::Text(text))
                .await
                .context("Failed to send audio frame"),
            None => anyhow::bail!("Interview channel is closed"),
        }
    }

    async fn close(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        if let Some(mut write) = writer.take() {
            info!("Closing interview channel");
            if let Err(e) = write.send(Message::Close(None)).await {
                warn!("Failed to send close frame: {}", e);
            }
            if let Err(e) = write.close().await {
                warn!("Failed to close interview channel: {}", e);
            }
        }
        Ok(())
    }
}
