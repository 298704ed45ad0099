// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages for the board
// controller, or into local ViewState mutations (list scrolling).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;
use crate::feedback::SentimentFilter;
use crate::protocol::{Focus, UserCommand};

/// Lines moved by PageUp/PageDown, counted in feedback items.
const PAGE_SIZE: usize = 5;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// controller. Returns `None` when the key was handled locally or ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. Some platforms also report Release and
    // Repeat events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    let command_key = ctrl || key_event.modifiers.contains(KeyModifiers::SUPER);

    // Global shortcuts, regardless of focus.
    if command_key {
        match key_event.code {
            KeyCode::Enter => return Some(UserCommand::Submit),
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return Some(UserCommand::Quit),
            KeyCode::Char('s') if ctrl => return Some(UserCommand::Submit),
            KeyCode::Char('r') if ctrl => return Some(UserCommand::Refresh),
            KeyCode::Char('f') if ctrl => return Some(UserCommand::CycleFilter),
            _ => return None,
        }
    }

    match key_event.code {
        KeyCode::F(n @ 1..=4) => {
            let filter = SentimentFilter::PILLS[usize::from(n - 1)];
            Some(UserCommand::SetFilter(filter))
        }

        KeyCode::Tab => Some(UserCommand::FocusNext),
        KeyCode::BackTab => Some(UserCommand::FocusPrev),

        KeyCode::Enter => match view_state.board.focus {
            Focus::Name => Some(UserCommand::FocusNext),
            Focus::Message => Some(UserCommand::InsertChar('\n')),
            Focus::Search => None,
        },

        KeyCode::Esc => {
            if !view_state.board.query.is_empty() {
                Some(UserCommand::ClearSearch)
            } else if view_state.board.error.is_some() {
                Some(UserCommand::DismissError)
            } else {
                None
            }
        }

        KeyCode::Backspace => Some(UserCommand::DeleteChar),

        KeyCode::Up => {
            scroll_up(view_state, 1);
            None
        }
        KeyCode::Down => {
            scroll_down(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            scroll_up(view_state, PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            scroll_down(view_state, PAGE_SIZE);
            None
        }

        KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::ALT) => {
            Some(UserCommand::InsertChar(c))
        }

        _ => None,
    }
}

fn scroll_up(view_state: &mut ViewState, lines: usize) {
    view_state.list_scroll = view_state.list_scroll.saturating_sub(lines);
}

/// Scroll down, stopping at the last item.
fn scroll_down(view_state: &mut ViewState, lines: usize) {
    let max = view_state.board.items.len().saturating_sub(1);
    view_state.list_scroll = view_state.list_scroll.saturating_add(lines).min(max);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
