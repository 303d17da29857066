use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::codec;
use super::frame::OutboundFrame;
use crate::channel::ConversationChannel;

/// Microphone capture backend trait
///
/// Implementations own the input device and deliver raw f32 sample buffers
/// as the device produces them. Frame sizing and PCM conversion happen in
/// [`CaptureStream`], not here.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Acquire the device and start capturing
    ///
    /// Returns a channel receiver that will receive raw sample buffers
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>>;

    /// Release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Default cpal-based microphone backend
///
/// cpal streams are not `Send`, so the stream lives on a dedicated thread
/// that forwards buffers into a tokio channel until told to stop.
pub struct MicrophoneBackend {
    sample_rate: u32,
    stop_flag: Option<Arc<AtomicBool>>,
    worker: Option<std::thread::JoinHandle<()>>,
    capturing: bool,
}

impl MicrophoneBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            stop_flag: None,
            worker: None,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>> {
        if self.capturing {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel::<Vec<f32>>(32);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_flag);
        let sample_rate = self.sample_rate;

        let worker = std::thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_input_device() {
                Some(device) => device,
                None => {
                    let _ = ready_tx.send(Err(anyhow!(
                        "No microphone available (permission denied or no input device)"
                    )));
                    return;
                }
            };

            let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

            let stream_config = cpal::StreamConfig {
                channels: 1,
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let stream = device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // try_send: never block the device callback; a dropped
                    // buffer under backpressure beats a glitching device.
                    let _ = tx.try_send(data.to_vec());
                },
                |err| warn!("Microphone stream error: {}", err),
                None,
            );

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(anyhow::Error::new(e)
                        .context("Failed to open microphone input stream")));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(
                    anyhow::Error::new(e).context("Failed to start microphone stream")
                ));
                return;
            }

            info!("Microphone capture started on '{}' ({}Hz mono)", device_name, sample_rate);
            let _ = ready_tx.send(Ok(()));

            while !stop.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(50));
            }

            drop(stream);
            info!("Microphone capture thread stopped");
        });

        ready_rx
            .await
            .context("Capture thread exited before reporting status")??;

        self.stop_flag = Some(stop_flag);
        self.worker = Some(worker);
        self.capturing = true;

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::SeqCst);
        }

        if let Some(worker) = self.worker.take() {
            let joined = tokio::task::spawn_blocking(move || worker.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                warn!("Microphone capture thread did not shut down cleanly");
            }
        }

        self.capturing = false;

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

/// Owns the microphone backend and forwards fixed-size encoded frames to the
/// remote channel.
///
/// Device buffers arrive at whatever size the driver prefers; they are
/// regrouped into `frame_samples` windows (4096 by default) before encoding.
pub struct CaptureStream {
    backend: Box<dyn CaptureBackend>,
    sample_rate: u32,
    frame_samples: usize,
    frames: Option<mpsc::Receiver<Vec<f32>>>,
    forward_task: Option<JoinHandle<()>>,
}

impl CaptureStream {
    pub fn new(backend: Box<dyn CaptureBackend>, sample_rate: u32, frame_samples: usize) -> Self {
        Self {
            backend,
            sample_rate,
            frame_samples,
            frames: None,
            forward_task: None,
        }
    }

    /// Acquire the capture device. Fails with a device/permission error if
    /// the microphone cannot be opened.
    pub async fn open(&mut self) -> Result<()> {
        let rx = self
            .backend
            .start()
            .await
            .with_context(|| format!("Failed to open capture backend '{}'", self.backend.name()))?;
        self.frames = Some(rx);
        Ok(())
    }

    /// Start forwarding encoded frames to the channel in capture order.
    ///
    /// The `cleaning_up` flag is re-checked before every emitted frame, not
    /// just at stream open: device buffers may still be in flight when
    /// teardown begins, and none of them may reach the wire after it.
    pub fn begin_forwarding(
        &mut self,
        channel: Arc<dyn ConversationChannel>,
        cleaning_up: Arc<AtomicBool>,
    ) -> Result<()> {
        let mut rx = match self.frames.take() {
            Some(rx) => rx,
            None => bail!("Capture device is not open"),
        };

        let sample_rate = self.sample_rate;
        let frame_samples = self.frame_samples;

        let task = tokio::spawn(async move {
            info!("Capture forwarding task started");

            let mut pending: Vec<f32> = Vec::with_capacity(frame_samples * 2);

            while let Some(buffer) = rx.recv().await {
                pending.extend_from_slice(&buffer);

                while pending.len() >= frame_samples {
                    if cleaning_up.load(Ordering::SeqCst) {
                        info!("Capture forwarding stopped by teardown");
                        return;
                    }

                    let window: Vec<f32> = pending.drain(..frame_samples).collect();
                    let frame = OutboundFrame {
                        pcm: codec::encode_pcm16(&window),
                        sample_rate,
                        channels: 1,
                    };

                    if let Err(e) = channel.send_audio(frame).await {
                        warn!("Failed to forward capture frame: {}", e);
                    }
                }

                if cleaning_up.load(Ordering::SeqCst) {
                    info!("Capture forwarding stopped by teardown");
                    return;
                }
            }

            info!("Capture forwarding task stopped (device closed)");
        });

        self.forward_task = Some(task);

        Ok(())
    }

    /// Stop forwarding and release the device.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.forward_task.take() {
            task.abort();
        }
        self.frames = None;
        self.backend.stop().await
    }
}
