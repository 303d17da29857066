use serde::{Deserialize, Serialize};

/// Setup message sent when opening the conversational channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Interview session identifier
    pub interview_id: String,
    /// Persona / system instructions for the AI interviewer
    pub persona_instructions: String,
    /// Ordered list of interview questions
    pub questions: Vec<String>,
}

/// Outbound audio message sent to the conversational channel
#[derive(Debug, Serialize, Deserialize)]
pub struct OutboundAudioMessage {
    pub interview_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
}

/// Inbound event from the conversational channel
///
/// A single message may carry any combination of transcription fragments,
/// an audio payload, and a turn-complete flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerEvent {
    /// Partial speech-to-text of the candidate's speech
    #[serde(default)]
    pub user_transcript: Option<String>,
    /// Partial text of the AI interviewer's turn
    #[serde(default)]
    pub ai_transcript: Option<String>,
    /// Base64-encoded 24kHz mono PCM16 audio of the AI's voice
    #[serde(default)]
    pub audio: Option<String>,
    /// The AI has finished a full turn
    #[serde(default)]
    pub turn_complete: bool,
}
