//! Error types for the Gemini exchange.

use thiserror::Error;

/// Why an exchange produced no answer.
///
/// The conversation shows the same fallback for every variant; the detail
/// only goes to the log.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endpoint returned status {status}")]
    Status { status: u16 },

    #[error("Response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response has no answer text at candidates[0].content.parts[0].text")]
    MissingAnswer,

    #[error("Exchange task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ExchangeError {
    /// Short stable label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::Transport(_) => "transport",
            ExchangeError::Status { .. } => "status",
            ExchangeError::Decode(_) => "decode",
            ExchangeError::MissingAnswer => "missing_answer",
            ExchangeError::Task(_) => "task",
        }
    }
}
