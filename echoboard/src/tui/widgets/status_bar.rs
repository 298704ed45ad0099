// Status bar widget: title, item counts, activity indicator.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::BoardSnapshot;
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [title] [counts] [activity]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let board = &state.board;
    let (dot, label, color) = activity_indicator(board);

    let spans = vec![
        Span::styled(
            " EchoBoard ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        Span::styled(count_label(board), Style::default().fg(Color::White)),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        Span::styled(format!("{} ", dot), Style::default().fg(color)),
        Span::styled(label, Style::default().fg(color)),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// "N items", or "shown of total" when a filter or search narrows the list.
pub fn count_label(board: &BoardSnapshot) -> String {
    let shown = board.items.len();
    if shown == board.total {
        let noun = if board.total == 1 { "item" } else { "items" };
        format!("{} {}", board.total, noun)
    } else {
        format!("{} of {} shown", shown, board.total)
    }
}

/// Dot, label and color for the current network activity.
pub fn activity_indicator(board: &BoardSnapshot) -> (&'static str, &'static str, Color) {
    if board.posting {
        ("●", "Submitting…", Color::Yellow)
    } else if board.loading {
        ("●", "Loading…", Color::Yellow)
    } else if board.error.is_some() {
        ("●", "Error", Color::Red)
    } else {
        ("●", "Ready", Color::Green)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
