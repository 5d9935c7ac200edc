use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use gembot_core::{parse_markup, Config, Controller, GeminiClient};

/// Wrap width used before the first frame reports the real chat width
const DEFAULT_WRAP_WIDTH: usize = 50;
const DEFAULT_CHAT_HEIGHT: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    History,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub focus: FocusPane,

    // Conversation (owned by the controller, read-only from here)
    pub controller: Controller,
    pub model_label: String,

    // Input state; the text itself is the controller's pending question
    pub input_cursor: usize,

    // History sidebar
    pub history_state: ListState,

    // Chat transcript
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of chat area for scroll calculations
    pub chat_width: u16,  // Inner width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub history_area: Option<Rect>,
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let endpoint = config.endpoint()?;
        let controller = Controller::new(GeminiClient::new(&endpoint))
            .with_escape_markup(config.escape_markup);

        Ok(Self::with_controller(controller, config.model()))
    }

    pub fn with_controller(controller: Controller, model_label: &str) -> Self {
        Self {
            should_quit: false,
            focus: FocusPane::Input,
            controller,
            model_label: model_label.to_string(),
            input_cursor: 0,
            history_state: ListState::default(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            history_area: None,
            chat_area: None,
        }
    }

    pub fn input(&self) -> &str {
        self.controller.pending_question()
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let mut text = self.input().to_string();
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        text.insert(byte_pos, c);
        self.controller.set_pending_question(&text);
        self.input_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        let mut text = self.input().to_string();
        let byte_pos = char_to_byte_index(&text, self.input_cursor);
        text.remove(byte_pos);
        self.controller.set_pending_question(&text);
    }

    pub fn delete_at_cursor(&mut self) {
        let mut text = self.input().to_string();
        if self.input_cursor < text.chars().count() {
            let byte_pos = char_to_byte_index(&text, self.input_cursor);
            text.remove(byte_pos);
            self.controller.set_pending_question(&text);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input().chars().count();
    }

    // Submission

    /// Send the typed question (Enter or the send action)
    pub fn submit_input(&mut self) {
        let question = self.input().to_string();
        if self.controller.submit_question(&question) {
            self.after_submit();
        }
    }

    /// Re-send the full question behind a history row
    pub fn select_history(&mut self, idx: usize) {
        let Some(full_text) = self.history_full_text(idx) else {
            return;
        };
        self.history_state.select(Some(idx));
        if self.controller.select_history_entry(&full_text) {
            self.after_submit();
        } else {
            // Still waiting on the previous answer; leave it in the input
            self.cursor_end();
        }
    }

    fn after_submit(&mut self) {
        self.input_cursor = 0;
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();
    }

    /// Record a finished exchange, if any
    pub async fn poll_exchange(&mut self) {
        if self.controller.poll_response().await {
            self.scroll_chat_to_bottom();
        }
    }

    // History sidebar

    pub fn history_len(&self) -> usize {
        self.controller.state().history().count()
    }

    pub fn history_full_text(&self, idx: usize) -> Option<String> {
        self.controller
            .state()
            .history()
            .nth(idx)
            .map(|entry| entry.full_text.to_string())
    }

    pub fn history_nav_down(&mut self) {
        let len = self.history_len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn history_nav_up(&mut self) {
        let len = self.history_len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => len - 1,
        };
        self.history_state.select(Some(i));
    }

    pub fn history_first(&mut self) {
        if self.history_len() > 0 {
            self.history_state.select(Some(0));
        }
    }

    pub fn history_last(&mut self) {
        let len = self.history_len();
        if len > 0 {
            self.history_state.select(Some(len - 1));
        }
    }

    pub fn focus_history(&mut self) {
        self.focus = FocusPane::History;
        if self.history_state.selected().is_none() {
            self.history_last();
        }
    }

    pub fn focus_input(&mut self) {
        self.focus = FocusPane::Input;
        self.cursor_end();
    }

    // Chat transcript

    pub fn scroll_down(&mut self) {
        let max = self.max_chat_scroll();
        self.chat_scroll = (self.chat_scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.visible_chat_height() / 2).max(1);
        self.chat_scroll = (self.chat_scroll + half).min(self.max_chat_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.visible_chat_height() / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_sub(half);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll chat to bottom so the latest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn visible_chat_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            DEFAULT_CHAT_HEIGHT
        }
    }

    fn max_chat_scroll(&self) -> u16 {
        self.transcript_line_count()
            .saturating_sub(self.visible_chat_height())
    }

    /// Approximate number of wrapped lines the transcript occupies
    pub fn transcript_line_count(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            DEFAULT_WRAP_WIDTH
        };

        // Use character count, not byte length, for proper UTF-8 handling
        let wrapped = |char_count: usize| -> u16 {
            if char_count == 0 {
                1
            } else {
                char_count.div_ceil(wrap_width) as u16
            }
        };

        let mut total_lines: u16 = 0;

        for msg in self.controller.state().messages() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "Bot:")
            if msg.is_formatted() {
                for line in parse_markup(msg.display_text()) {
                    let chars: usize = line.iter().map(|span| span.text.chars().count()).sum();
                    total_lines = total_lines.saturating_add(wrapped(chars));
                }
            } else {
                for line in msg.display_text().lines() {
                    total_lines = total_lines.saturating_add(wrapped(line.chars().count()));
                }
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.controller.is_waiting() {
            total_lines = total_lines.saturating_add(2); // "Bot:" + "Thinking..."
        }

        total_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let controller = Controller::new(GeminiClient::new("http://127.0.0.1:9/unused"));
        App::with_controller(controller, "test-model")
    }

    #[test]
    fn test_editing_is_utf8_safe() {
        let mut app = app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.delete_before_cursor();
        assert_eq!(app.input(), "hélo");
        assert_eq!(app.input_cursor, 2);

        app.cursor_home();
        app.delete_at_cursor();
        assert_eq!(app.input(), "élo");

        app.cursor_end();
        app.insert_char('!');
        assert_eq!(app.input(), "élo!");
    }

    #[test]
    fn test_blank_input_does_not_submit() {
        let mut app = app();
        app.insert_char(' ');
        app.submit_input();
        assert!(app.controller.state().is_empty());
        assert_eq!(app.input(), " ");
    }

    #[test]
    fn test_history_nav_on_empty_history() {
        let mut app = app();
        app.history_nav_down();
        app.history_nav_up();
        app.focus_history();
        assert_eq!(app.history_state.selected(), None);
        assert_eq!(app.focus, FocusPane::History);
    }

    #[tokio::test]
    async fn test_history_click_resubmits_full_question() {
        use gembot_core::Role;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "**ok**" }] } }]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let controller = Controller::new(GeminiClient::new(&server.uri()));
        let mut app = App::with_controller(controller, "test-model");

        for c in "why is the sky blue at noon".chars() {
            app.insert_char(c);
        }
        app.submit_input();
        assert_eq!(app.input(), "");
        assert_eq!(app.input_cursor, 0);
        app.controller.wait_for_response().await;

        app.focus_history();
        assert_eq!(app.history_state.selected(), Some(0));
        app.select_history(0);
        app.controller.wait_for_response().await;

        let messages = app.controller.state().messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].role(), Role::User);
        assert_eq!(messages[2].display_text(), "why is the sky blue...");
        assert_eq!(messages[2].full_text(), Some("why is the sky blue at noon"));
        assert_eq!(messages[3].display_text(), "<b>ok</b>");
        assert_eq!(app.history_len(), 2);
    }

    #[test]
    fn test_scroll_clamped_on_empty_transcript() {
        let mut app = app();
        app.scroll_down();
        app.scroll_half_page_down();
        assert_eq!(app.chat_scroll, 0);
    }
}
