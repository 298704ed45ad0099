// Message types shared by the board controller, the TUI, and the background
// tasks the controller spawns.
//
// The TUI sends `UserCommand`s and receives `UiUpdate`s. Network calls and
// timers report back to the controller as `ApiEvent`s.

use crate::api::client::ApiError;
use crate::feedback::{FeedbackItem, SentimentFilter};

// ---------------------------------------------------------------------------
// Focus
// ---------------------------------------------------------------------------

/// Which text field receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Name,
    Message,
    Search,
}

impl Focus {
    const ORDER: [Focus; 3] = [Focus::Name, Focus::Message, Focus::Search];

    pub fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

// ---------------------------------------------------------------------------
// TUI -> controller
// ---------------------------------------------------------------------------

/// Commands sent from the TUI to the board controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Append a character to the focused field.
    InsertChar(char),
    /// Remove the last character of the focused field.
    DeleteChar,
    FocusNext,
    FocusPrev,
    SetFilter(SentimentFilter),
    CycleFilter,
    ClearSearch,
    /// Submit the form with the current field values.
    Submit,
    /// Re-fetch the list.
    Refresh,
    DismissError,
    Quit,
}

// ---------------------------------------------------------------------------
// Controller -> TUI
// ---------------------------------------------------------------------------

/// Updates pushed from the board controller to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Snapshot(Box<BoardSnapshot>),
}

/// Everything the TUI needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardSnapshot {
    /// Items passing the active filter and search query, in display order.
    pub items: Vec<FeedbackItem>,
    /// Size of the unfiltered collection.
    pub total: usize,
    pub loading: bool,
    pub posting: bool,
    pub error: Option<String>,
    pub toast: Option<String>,
    pub name: String,
    pub message: String,
    pub query: String,
    pub filter: SentimentFilter,
    pub focus: Focus,
}

impl BoardSnapshot {
    pub fn name_len(&self) -> usize {
        self.name.chars().count()
    }

    pub fn message_len(&self) -> usize {
        self.message.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Background tasks -> controller
// ---------------------------------------------------------------------------

/// Results and timer ticks delivered to the controller by spawned tasks.
#[derive(Debug)]
pub enum ApiEvent {
    /// A list request finished. `request` is the sequence number assigned
    /// when the request was issued.
    Listed {
        request: u64,
        result: Result<Vec<FeedbackItem>, ApiError>,
    },
    /// The create request finished.
    Created(Result<FeedbackItem, ApiError>),
    /// A scheduled reconciliation refresh is due.
    ReconcileDue,
    /// The toast timer for the given toast generation elapsed.
    ToastExpired { generation: u64 },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
