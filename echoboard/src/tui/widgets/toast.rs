// Toast overlay widget.
//
// Renders a short confirmation message in a bordered box near the bottom of
// the screen, on top of the main layout. The controller decides when the
// toast appears and disappears.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const TOAST_HEIGHT: u16 = 3;
/// Rows kept free below the toast so the help bar stays readable.
const BOTTOM_GAP: u16 = 2;

/// Render the toast centered horizontally, just above the help bar.
pub fn render(frame: &mut Frame, area: Rect, text: &str) {
    let width = u16::try_from(text.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(4);
    let toast_area = toast_rect(width, TOAST_HEIGHT, area);

    frame.render_widget(Clear, toast_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let paragraph = Paragraph::new(Span::styled(
        format!(" {}", text),
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ))
    .block(block)
    .style(Style::default().bg(Color::Black));

    frame.render_widget(paragraph, toast_area);
}

/// Compute a horizontally centered rectangle near the bottom of `area`.
///
/// If the area is too small, the toast is clamped to the available space.
fn toast_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);
    let gap = BOTTOM_GAP.min(area.height.saturating_sub(clamped_height));

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(clamped_height),
        Constraint::Length(gap),
    ])
    .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[1]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
