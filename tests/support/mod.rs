// Shared scripted collaborators for session integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use interview_live::audio::{CaptureBackend, OutboundFrame};
use interview_live::channel::{ChannelConfig, ChannelEvent, ConversationChannel};
use interview_live::session::{AnalysisResult, TranscriptAnalyzer};
use interview_live::transcript::TranscriptEntry;
use tokio::sync::mpsc;

/// Channel double driven by the test through a plain event sender.
pub struct ScriptedChannel {
    events: Mutex<Option<mpsc::Receiver<ChannelEvent>>>,
    pub sent: Mutex<Vec<OutboundFrame>>,
    pub closes: AtomicUsize,
}

impl ScriptedChannel {
    pub fn new() -> (Arc<Self>, mpsc::Sender<ChannelEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let channel = Arc::new(Self {
            events: Mutex::new(Some(rx)),
            sent: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        });
        (channel, tx)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ConversationChannel for ScriptedChannel {
    async fn connect(&self, _config: ChannelConfig) -> Result<mpsc::Receiver<ChannelEvent>> {
        match self.events.lock().unwrap().take() {
            Some(rx) => Ok(rx),
            None => bail!("already connected"),
        }
    }

    async fn send_audio(&self, frame: OutboundFrame) -> Result<()> {
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Capture backend double; the test pushes raw device buffers through the
/// handle.
pub struct MockCapture {
    device: Arc<Mutex<Option<mpsc::Sender<Vec<f32>>>>>,
    stops: Arc<AtomicUsize>,
    capturing: bool,
}

#[derive(Clone)]
pub struct MockCaptureHandle {
    device: Arc<Mutex<Option<mpsc::Sender<Vec<f32>>>>>,
    pub stops: Arc<AtomicUsize>,
}

impl MockCaptureHandle {
    pub async fn push(&self, samples: Vec<f32>) {
        let sender = self.device.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender.send(samples).await;
        }
    }
}

impl MockCapture {
    pub fn new() -> (Self, MockCaptureHandle) {
        let device = Arc::new(Mutex::new(None));
        let stops = Arc::new(AtomicUsize::new(0));
        let handle = MockCaptureHandle {
            device: Arc::clone(&device),
            stops: Arc::clone(&stops),
        };
        (
            Self {
                device,
                stops,
                capturing: false,
            },
            handle,
        )
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MockCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>> {
        let (tx, rx) = mpsc::channel(32);
        *self.device.lock().unwrap() = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        *self.device.lock().unwrap() = None;
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted microphone"
    }
}

/// Capture backend whose device cannot be acquired.
pub struct FailingCapture;

#[async_trait::async_trait]
impl CaptureBackend for FailingCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<Vec<f32>>> {
        bail!("input device busy")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "failing microphone"
    }
}

/// Analyzer double; failure mode can be flipped between calls to exercise
/// retry.
pub struct MockAnalyzer {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl TranscriptAnalyzer for MockAnalyzer {
    async fn analyze(
        &self,
        _transcript: &[TranscriptEntry],
        _topic_prompt: &str,
        _duration_secs: f64,
    ) -> Result<AnalysisResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            bail!("analysis backend unavailable");
        }
        Ok(AnalysisResult {
            overall_score: 77,
            strengths: vec!["good pacing".to_string()],
            improvements: vec!["more detail".to_string()],
            summary: "reasonable performance".to_string(),
        })
    }
}
