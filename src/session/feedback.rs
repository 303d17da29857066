use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::transcript::TranscriptEntry;

/// Minimum finalized entries before analysis is worth requesting
pub const MIN_FINALIZED_ENTRIES: usize = 2;

/// Result of end-of-session transcript analysis
///
/// Serializable so the host can persist it, or keep it ephemeral for guest
/// sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Overall interview score (0-100)
    pub overall_score: u8,
    /// What the candidate did well
    pub strengths: Vec<String>,
    /// Where the candidate should improve
    pub improvements: Vec<String>,
    /// Short narrative summary
    pub summary: String,
}

/// External transcript-analysis collaborator
#[async_trait::async_trait]
pub trait TranscriptAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        transcript: &[TranscriptEntry],
        topic_prompt: &str,
        duration_secs: f64,
    ) -> Result<AnalysisResult>;
}

/// Guards and triggers end-of-session analysis.
pub struct FeedbackCoordinator {
    analyzer: Arc<dyn TranscriptAnalyzer>,
    topic_prompt: String,
}

impl FeedbackCoordinator {
    pub fn new(analyzer: Arc<dyn TranscriptAnalyzer>, topic_prompt: String) -> Self {
        Self {
            analyzer,
            topic_prompt,
        }
    }

    /// Session duration in seconds: latest minus earliest entry timestamp,
    /// 0.0 with fewer than two timestamped entries.
    pub fn duration_secs(entries: &[TranscriptEntry]) -> f64 {
        if entries.len() < 2 {
            return 0.0;
        }

        let first = entries.iter().map(|e| e.timestamp).min();
        let last = entries.iter().map(|e| e.timestamp).max();

        match (first, last) {
            (Some(first), Some(last)) => {
                last.signed_duration_since(first).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        }
    }

    /// Validate the transcript and invoke the analyzer.
    pub async fn generate(&self, entries: &[TranscriptEntry]) -> Result<AnalysisResult> {
        let finalized = entries.iter().filter(|e| e.is_final).count();
        if finalized < MIN_FINALIZED_ENTRIES {
            bail!(
                "Not enough conversation to analyze: {} finalized entries (need {})",
                finalized,
                MIN_FINALIZED_ENTRIES
            );
        }

        let duration_secs = Self::duration_secs(entries);

        info!(
            "Requesting interview analysis ({} entries, {:.1}s)",
            entries.len(),
            duration_secs
        );

        self.analyzer
            .analyze(entries, &self.topic_prompt, duration_secs)
            .await
            .context("Interview analysis failed")
    }
}
