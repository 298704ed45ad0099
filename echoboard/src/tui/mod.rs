// TUI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest `BoardSnapshot` pushed by the
// board controller plus purely local state (list scroll). Edits are never
// applied locally; every key that changes board state becomes a
// `UserCommand` and the next snapshot reflects it.

pub mod input;
pub mod layout;
pub mod widgets;

use std::io::stdout;
use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::{BoardSnapshot, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state used for rendering.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Latest snapshot from the board controller.
    pub board: BoardSnapshot,
    /// Index of the first visible feedback item.
    pub list_scroll: usize,
}

impl ViewState {
    /// Replace the board snapshot, keeping the scroll offset inside the new
    /// item range.
    pub fn apply_snapshot(&mut self, snapshot: BoardSnapshot) {
        self.board = snapshot;
        self.list_scroll = self
            .list_scroll
            .min(self.board.items.len().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => state.apply_snapshot(*snapshot),
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete board frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::form::render(frame, &layout, state);
    widgets::filters::render(frame, &layout, state);
    widgets::feedback_list::render(frame, layout.feedback_list, state);
    render_help_bar(frame, &layout);

    if let Some(text) = state.board.toast.as_deref() {
        widgets::toast::render(frame, frame.area(), text);
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " Tab:Focus | Ctrl+Enter/Ctrl+S:Submit | F1-F4:Filter | Ctrl+R:Refresh | Esc:Clear | Ctrl+Q:Quit";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook that restores the terminal.
/// 3. Requests disambiguated key codes so Ctrl+Enter is distinguishable.
/// 4. Runs a select loop over UI updates, keyboard input and render ticks.
/// 5. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Restore the terminal before the default hook prints the panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::execute!(stdout(), PopKeyboardEnhancementFlags);
        ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. Unsupported terminals reject the flags; Ctrl+S still submits there.
    let enhanced_keys = crossterm::execute!(
        stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    )
    .is_ok();
    debug!("Keyboard enhancement flags pushed: {}", enhanced_keys);

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    // ~30 fps
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // 4. Main loop
    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            if cmd_tx.send(cmd).await.is_err() || quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 5. Restore terminal
    if enhanced_keys {
        let _ = crossterm::execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
