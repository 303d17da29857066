use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::channel::ChannelConfig;

/// Configuration for a live interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique interview identifier
    pub interview_id: String,

    /// Topic prompt handed to the transcript analyzer
    pub topic_prompt: String,

    /// Persona / system instructions for the AI interviewer
    pub persona_instructions: String,

    /// Ordered interview questions
    pub questions: Vec<String>,

    /// Microphone capture sample rate (the wire expects 16kHz mono)
    pub capture_sample_rate: u32,

    /// Inbound AI voice sample rate (24kHz mono)
    pub playback_sample_rate: u32,

    /// Samples per outbound capture frame
    pub frame_samples: usize,

    /// Idle window before the watchdog ends the interview
    pub watchdog_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interview_id: format!("interview-{}", uuid::Uuid::new_v4()),
            topic_prompt: String::new(),
            persona_instructions: String::new(),
            questions: Vec::new(),
            capture_sample_rate: 16000,
            playback_sample_rate: 24000,
            frame_samples: 4096,
            watchdog_timeout: Duration::from_secs(20),
        }
    }
}

impl SessionConfig {
    /// Setup message for the conversational channel.
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            interview_id: self.interview_id.clone(),
            persona_instructions: self.persona_instructions.clone(),
            questions: self.questions.clone(),
        }
    }
}
