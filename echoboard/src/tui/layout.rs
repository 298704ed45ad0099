// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the board:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Name field (3 rows)                               |
// | Message field (6 rows)                            |
// | Counters / submit label / error (2 rows)          |
// +-------------------------+------------------------+
// | Filter pills (55%)       | Search box (45%)       |
// +-------------------------+------------------------+
// | Feedback list (fill)                              |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each board zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: title, item counts, activity indicator.
    pub status_bar: Rect,
    pub name_field: Rect,
    pub message_field: Rect,
    /// Character counters, submit label and the inline error.
    pub form_status: Rect,
    pub filter_pills: Rect,
    pub search: Rect,
    pub feedback_list: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the board layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Length(3), // name
            Constraint::Length(6), // message
            Constraint::Length(2), // form status
            Constraint::Length(3), // filters + search
            Constraint::Min(5),    // feedback list
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let tools = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(vertical[4]);

    AppLayout {
        status_bar: vertical[0],
        name_field: vertical[1],
        message_field: vertical[2],
        form_status: vertical[3],
        filter_pills: tools[0],
        search: tools[1],
        feedback_list: vertical[5],
        help_bar: vertical[6],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
