pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod gemini;
pub mod state;

// Re-export main types for convenience
pub use config::Config;
pub use controller::{Controller, FALLBACK_MESSAGE};
pub use error::ExchangeError;
pub use format::{format_answer, format_answer_escaped, parse_markup, MarkupSpan};
pub use gemini::GeminiClient;
pub use state::{ConversationState, HistoryEntry, Message, Role};
