// Submission form widget: name and message inputs, counters, submit label,
// inline error.

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::feedback::{MESSAGE_LIMIT, NAME_LIMIT};
use crate::protocol::{BoardSnapshot, Focus};
use crate::tui::layout::AppLayout;
use crate::tui::ViewState;

const CURSOR: &str = "▏";

/// Render the form zones of the layout.
pub fn render(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let board = &state.board;

    let name = input_paragraph(
        &board.name,
        "Your name",
        board.focus == Focus::Name,
    )
    .block(field_block(" Name ", board.focus == Focus::Name));
    frame.render_widget(name, layout.name_field);

    let message_focused = board.focus == Focus::Message;
    let inner_width = layout.message_field.width.saturating_sub(2);
    let inner_height = layout.message_field.height.saturating_sub(2);
    let overflow = wrapped_rows(&board.message, inner_width).saturating_sub(inner_height);
    let message = input_paragraph(&board.message, "Your feedback…", message_focused)
        .wrap(Wrap { trim: false })
        .scroll((overflow, 0))
        .block(field_block(" Message ", message_focused));
    frame.render_widget(message, layout.message_field);

    render_status(frame, layout.form_status, board);
}

/// Counters and submit label on the first row, the error on the second.
fn render_status(frame: &mut Frame, area: Rect, board: &BoardSnapshot) {
    let rows = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);

    let counters = Paragraph::new(Span::styled(
        format!(" {}", counters_text(board)),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(counters, rows[0]);

    let label_style = if board.posting {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    };
    let label = Paragraph::new(Span::styled(format!(" {} ", submit_label(board.posting)), label_style))
        .alignment(Alignment::Right);
    frame.render_widget(label, rows[0]);

    if let Some(error) = board.error.as_deref() {
        let paragraph = Paragraph::new(Span::styled(
            format!(" {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(paragraph, rows[1]);
    }
}

/// "n/50 • m/500", counted in characters.
pub fn counters_text(board: &BoardSnapshot) -> String {
    format!(
        "{}/{} • {}/{}",
        board.name_len(),
        NAME_LIMIT,
        board.message_len(),
        MESSAGE_LIMIT
    )
}

pub fn submit_label(posting: bool) -> &'static str {
    if posting {
        "Submitting…"
    } else {
        "Submit"
    }
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

/// Field text, or a dim placeholder when empty. The focused field shows a
/// cursor after its last character.
fn input_paragraph<'a>(value: &'a str, placeholder: &'a str, focused: bool) -> Paragraph<'a> {
    let cursor = || Span::styled(CURSOR, Style::default().fg(Color::Cyan));

    if value.is_empty() {
        let mut spans = Vec::new();
        if focused {
            spans.push(cursor());
        }
        spans.push(Span::styled(placeholder, Style::default().fg(Color::DarkGray)));
        return Paragraph::new(Line::from(spans));
    }

    let mut lines: Vec<Line> = value.split('\n').map(Line::raw).collect();
    if focused {
        if let Some(last) = lines.last_mut() {
            last.push_span(cursor());
        }
    }
    Paragraph::new(lines)
}

/// Rows `text` occupies when wrapped at `width` columns, plus one for the
/// cursor.
pub fn wrapped_rows(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = text
        .split('\n')
        .map(|line| (line.chars().count() + 1).div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
