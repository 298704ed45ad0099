// Feedback list widget: one card per item, newest first.
//
// Each card: "[AL] Ann Lee  2024-05-01 14:00  ● positive", the message, and
// an optional "AI summary:" line.

use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;

use super::filters::sentiment_color;
use crate::feedback::FeedbackItem;
use crate::protocol::BoardSnapshot;
use crate::tui::ViewState;

const TITLE: &str = " All Feedback ";
const INDENT: &str = "     ";

/// Render the list into the given area, starting at `state.list_scroll`.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let board = &state.board;
    let block = Block::default().borders(Borders::ALL).title(TITLE);

    if board.items.is_empty() {
        let paragraph = Paragraph::new(format!("  {}", empty_message(board)))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let total = board.items.len();
    let scroll = state.list_scroll.min(total.saturating_sub(1));

    let items: Vec<ListItem> = board
        .items
        .iter()
        .skip(scroll)
        .map(|item| ListItem::new(card_lines(item)))
        .collect();
    frame.render_widget(List::new(items).block(block), area);

    if total > 1 {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(1)).position(scroll);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

/// Text shown instead of the list when nothing passes the filters.
pub fn empty_message(board: &BoardSnapshot) -> &'static str {
    if board.loading {
        "Loading feedback…"
    } else {
        "No feedback yet."
    }
}

/// The lines making up one card, followed by a blank spacer line.
pub fn card_lines(item: &FeedbackItem) -> Vec<Line<'static>> {
    let mut header = vec![
        Span::styled(
            format!("[{:>2}] ", item.initials()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            item.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", item.local_time()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(badge) = item.badge() {
        let color = item.sentiment_kind().map_or(Color::Gray, sentiment_color);
        header.push(Span::styled(
            format!("  ● {}", badge),
            Style::default().fg(color),
        ));
    }

    let mut lines = vec![Line::from(header)];
    lines.extend(
        item.message
            .split('\n')
            .map(|line| Line::raw(format!("{INDENT}{line}"))),
    );
    if let Some(summary) = item.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(Line::from(vec![
            Span::raw(INDENT),
            Span::styled(
                "AI summary:",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", summary),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        ]));
    }
    lines.push(Line::default());
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
