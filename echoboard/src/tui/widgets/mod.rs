// TUI widget modules for each board zone.

pub mod feedback_list;
pub mod filters;
pub mod form;
pub mod status_bar;
pub mod toast;
