use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved literal the AI appends to its final text output to signal the
/// end of the interview. Never rendered and never stored.
pub const END_OF_INTERVIEW_TOKEN: &str = "[END_OF_INTERVIEW]";

/// Which party produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Ai,
}

/// One speaker turn in the interview transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who is speaking
    pub speaker: Speaker,
    /// Accumulated text for this turn
    pub text: String,
    /// Whether the turn has been finalized
    pub is_final: bool,
    /// Capture time of the first fragment in the entry
    pub timestamp: DateTime<Utc>,
}

/// Strip the end-of-interview token from an AI fragment.
///
/// Returns the residual text (trimmed) and whether the token was present.
pub fn strip_end_token(text: &str) -> (String, bool) {
    if text.contains(END_OF_INTERVIEW_TOKEN) {
        let residual = text.replace(END_OF_INTERVIEW_TOKEN, "");
        (residual.trim().to_string(), true)
    } else {
        (text.to_string(), false)
    }
}

/// Merges streamed transcription fragments into ordered, timestamped entries.
///
/// Consecutive fragments from the same speaker extend the open entry;
/// a speaker change or a finalized last entry starts a new one.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Apply one transcription fragment. Returns true if the transcript
    /// changed (empty fragments are dropped).
    pub fn push_fragment(&mut self, speaker: Speaker, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        if let Some(last) = self.entries.last_mut() {
            if last.speaker == speaker && !last.is_final {
                last.text.push(' ');
                last.text.push_str(text);
                return true;
            }
        }

        self.entries.push(TranscriptEntry {
            speaker,
            text: text.to_string(),
            is_final: false,
            timestamp: Utc::now(),
        });

        true
    }

    /// Finalize every current entry in one batch.
    ///
    /// The remote protocol finalizes both sides' turns together on a single
    /// turn-complete signal, not per entry.
    pub fn finalize_all(&mut self) {
        for entry in &mut self.entries {
            entry.is_final = true;
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn finalized_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_final).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot for host notifications and feedback generation.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }
}
