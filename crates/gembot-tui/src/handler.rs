use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }

    // Every event is a chance to pick up a finished answer
    app.poll_exchange().await;
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any focus
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::PageDown => {
            app.scroll_half_page_down();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_half_page_up();
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Input => handle_input_key(app, key),
        FocusPane::History => handle_history_key(app, key),
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_input(),
        KeyCode::Esc | KeyCode::Tab => app.focus_history(),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_history_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => app.history_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.history_nav_up(),
        KeyCode::Char('g') => app.history_first(),
        KeyCode::Char('G') => app.history_last(),

        // Half-page scroll of the transcript
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Enter => {
            if let Some(idx) = app.history_state.selected() {
                app.select_history(idx);
            }
        }

        KeyCode::Tab | KeyCode::Esc | KeyCode::Char('i') => app.focus_input(),

        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Map a click inside the bordered history list to a row index
fn history_row_at(app: &App, area: Rect, y: u16) -> Option<usize> {
    let inner_top = area.y + 1;
    let inner_bottom = area.y + area.height.saturating_sub(1);
    if y < inner_top || y >= inner_bottom {
        return None;
    }
    let idx = (y - inner_top) as usize + app.history_state.offset();
    (idx < app.history_len()).then_some(idx)
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_history = app.history_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_down();
                app.scroll_down();
                app.scroll_down();
            } else if in_history {
                app.history_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_up();
                app.scroll_up();
                app.scroll_up();
            } else if in_history {
                app.history_nav_up();
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(area) = app.history_area.filter(|_| in_history) {
                if let Some(idx) = history_row_at(app, area, y) {
                    app.focus = FocusPane::History;
                    app.select_history(idx);
                }
            } else if !in_chat {
                app.focus_input();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use gembot_core::{Controller, GeminiClient};

    fn app() -> App {
        let controller = Controller::new(GeminiClient::new("http://127.0.0.1:9/unused"));
        App::with_controller(controller, "test-model")
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[tokio::test]
    async fn test_typing_goes_to_pending_question() {
        let mut app = app();
        for c in "hi".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await;
        }
        handle_event(&mut app, key(KeyCode::Backspace)).await;
        assert_eq!(app.input(), "h");
    }

    #[tokio::test]
    async fn test_tab_toggles_focus_and_q_quits_from_history() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Tab)).await;
        assert_eq!(app.focus, FocusPane::History);

        handle_event(&mut app, key(KeyCode::Char('q'))).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_q_in_input_is_text() {
        let mut app = app();
        handle_event(&mut app, key(KeyCode::Char('q'))).await;
        assert!(!app.should_quit);
        assert_eq!(app.input(), "q");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let mut app = app();
        let event = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, event).await;
        assert!(app.should_quit);
    }

    #[test]
    fn test_history_row_outside_border_is_none() {
        let app = app();
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(history_row_at(&app, area, 0), None);
        assert_eq!(history_row_at(&app, area, 9), None);
        // Inside the border, but no history yet
        assert_eq!(history_row_at(&app, area, 1), None);
    }
}
