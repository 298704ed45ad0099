// Filter pills and search box.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::feedback::{Sentiment, SentimentFilter};
use crate::protocol::Focus;
use crate::tui::layout::AppLayout;
use crate::tui::ViewState;

/// Render the pill row and the search box.
pub fn render(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let board = &state.board;

    let pills = Paragraph::new(Line::from(pill_spans(board.filter)))
        .block(Block::default().borders(Borders::ALL).title(" Filter "));
    frame.render_widget(pills, layout.filter_pills);

    let focused = board.focus == Focus::Search;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let mut spans = Vec::new();
    if board.query.is_empty() && !focused {
        spans.push(Span::styled(
            "Search name, message, or summary…",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::raw(board.query.as_str()));
        if focused {
            spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
        }
    }
    let title = if board.query.is_empty() {
        " Search ".to_string()
    } else {
        " Search (Esc to clear) ".to_string()
    };
    let search = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    frame.render_widget(search, layout.search);
}

/// One span per pill, prefixed with its function key. The active pill is
/// highlighted.
/// E.g. "F1 All  F2 ● positive  F3 ● mixed  F4 ● negative"
pub fn pill_spans(active: SentimentFilter) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, pill) in SentimentFilter::PILLS.iter().enumerate() {
        let style = if *pill == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let dot = match pill {
            SentimentFilter::All => String::new(),
            SentimentFilter::Only(_) => "● ".to_string(),
        };
        spans.push(Span::styled(
            format!(" F{} {}{} ", i + 1, dot, pill.label()),
            style.fg(pill_color(*pill, *pill == active)),
        ));
        spans.push(Span::raw(" "));
    }
    spans
}

/// Color associated with a sentiment, shared with the list badges.
pub fn sentiment_color(sentiment: Sentiment) -> Color {
    match sentiment {
        Sentiment::Positive => Color::Green,
        Sentiment::Mixed => Color::Yellow,
        Sentiment::Negative => Color::Red,
        Sentiment::Neutral => Color::Gray,
    }
}

fn pill_color(pill: SentimentFilter, active: bool) -> Color {
    match (pill, active) {
        (_, true) => Color::Black,
        (SentimentFilter::All, false) => Color::White,
        (SentimentFilter::Only(s), false) => sentiment_color(s),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
