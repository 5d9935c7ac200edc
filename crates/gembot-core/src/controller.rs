//! Interaction controller: the only writer of [`ConversationState`].
//!
//! A submission appends the user message and clears the pending question
//! right away, then runs the exchange on a spawned task. The outcome is
//! recorded when the UI polls for it (or awaits it). Only one exchange is
//! in flight at a time; further submissions are rejected until it finishes,
//! so answers always land in the order the questions were asked.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ExchangeError;
use crate::format::{format_answer, format_answer_escaped};
use crate::gemini::GeminiClient;
use crate::state::{ConversationState, Message};

/// Shown in place of an answer whenever the exchange fails, whatever the cause
pub const FALLBACK_MESSAGE: &str = "Sorry, I couldn't fetch a response.";

type Exchange = JoinHandle<Result<String, ExchangeError>>;

pub struct Controller {
    state: ConversationState,
    client: GeminiClient,
    escape_markup: bool,
    in_flight: Option<Exchange>,
}

impl Controller {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            state: ConversationState::new(),
            client,
            escape_markup: false,
            in_flight: None,
        }
    }

    /// Escape markup characters in answers before formatting them
    pub fn with_escape_markup(mut self, escape_markup: bool) -> Self {
        self.escape_markup = escape_markup;
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn pending_question(&self) -> &str {
        self.state.pending_question()
    }

    pub fn set_pending_question(&mut self, text: &str) {
        self.state.set_pending_question(text);
    }

    /// True while an exchange has been started and its outcome not yet recorded
    pub fn is_waiting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a question/answer cycle.
    ///
    /// Returns `false` without touching state when the text is blank or an
    /// exchange is already in flight. Needs a tokio runtime.
    pub fn submit_question(&mut self, raw_text: &str) -> bool {
        if raw_text.trim().is_empty() {
            return false;
        }
        if self.in_flight.is_some() {
            debug!("Submission rejected: exchange already in flight");
            return false;
        }

        self.state.push(Message::user(raw_text));
        self.state.clear_pending_question();

        info!(chars = raw_text.chars().count(), "Submitting question");
        let client = self.client.clone();
        let question = raw_text.to_string();
        self.in_flight = Some(tokio::spawn(async move { client.ask(&question).await }));
        true
    }

    /// Re-ask a question from the history sidebar as if it were typed again.
    pub fn select_history_entry(&mut self, full_text: &str) -> bool {
        self.state.set_pending_question(full_text);
        self.submit_question(full_text)
    }

    /// Record the outcome if the exchange has finished. Never blocks.
    pub async fn poll_response(&mut self) -> bool {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|handle| handle.is_finished());
        if !finished {
            return false;
        }
        self.wait_for_response().await
    }

    /// Wait for the in-flight exchange and record its outcome.
    ///
    /// Returns `false` if nothing was in flight.
    pub async fn wait_for_response(&mut self) -> bool {
        let Some(handle) = self.in_flight.take() else {
            return false;
        };

        let outcome = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ExchangeError::Task(e)),
        };
        self.record_outcome(outcome);
        true
    }

    /// Submit and wait for the whole cycle to complete.
    pub async fn ask(&mut self, raw_text: &str) -> bool {
        self.submit_question(raw_text) && self.wait_for_response().await
    }

    fn record_outcome(&mut self, outcome: Result<String, ExchangeError>) {
        match outcome {
            Ok(answer) => {
                let markup = if self.escape_markup {
                    format_answer_escaped(&answer)
                } else {
                    format_answer(&answer)
                };
                self.state.push(Message::bot_formatted(markup));
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Exchange failed");
                self.state.push(Message::bot_plain(FALLBACK_MESSAGE));
            }
        }
    }
}
