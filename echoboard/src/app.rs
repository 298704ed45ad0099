// Board controller and its event loop.
//
// The controller owns every piece of board state: the item collection, the
// form fields, focus, filter and search, and the transient loading / posting
// / error / toast flags. It processes one message at a time from two
// channels (user commands from the TUI, API events from spawned tasks) and
// pushes a fresh snapshot to the TUI after each one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::client::FeedbackApi;
use crate::config::BoardConfig;
use crate::feedback::{
    validate_submission, FeedbackItem, FilterMemo, SentimentFilter, MESSAGE_LIMIT, NAME_LIMIT,
};
use crate::protocol::{ApiEvent, BoardSnapshot, Focus, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Toast text shown after a successful submit.
pub const TOAST_SUBMITTED: &str = "Thanks! Feedback submitted.";

// ---------------------------------------------------------------------------
// BoardController
// ---------------------------------------------------------------------------

/// The board's state machine.
///
/// `loading`, `posting`, `error` and `toast` are independent of each other.
/// Network calls and timers run as spawned tasks that report back through
/// `api_tx`; the controller is the only writer of the item collection.
pub struct BoardController {
    config: BoardConfig,
    api: Arc<dyn FeedbackApi>,
    api_tx: mpsc::Sender<ApiEvent>,

    items: Vec<FeedbackItem>,
    /// Bumped on every change to `items`; keys the filter memo.
    items_revision: u64,
    memo: FilterMemo,

    name: String,
    message: String,
    query: String,
    filter: SentimentFilter,
    focus: Focus,

    /// Number of list requests still in flight. `loading` is derived from it.
    pending_lists: usize,
    /// Sequence number of the most recently issued list request.
    list_seq: u64,
    /// Sequence number of the newest list response applied so far.
    applied_list_seq: u64,
    posting: bool,
    error: Option<String>,
    toast: Option<String>,
    /// Incremented per toast so an expired timer for a replaced toast is
    /// ignored.
    toast_generation: u64,
    toast_task: Option<JoinHandle<()>>,
    reconcile_tasks: Vec<JoinHandle<()>>,
    disposed: bool,
}

impl BoardController {
    pub fn new(
        config: BoardConfig,
        api: Arc<dyn FeedbackApi>,
        api_tx: mpsc::Sender<ApiEvent>,
    ) -> Self {
        BoardController {
            config,
            api,
            api_tx,
            items: Vec::new(),
            items_revision: 0,
            memo: FilterMemo::default(),
            name: String::new(),
            message: String::new(),
            query: String::new(),
            filter: SentimentFilter::All,
            focus: Focus::Name,
            pending_lists: 0,
            list_seq: 0,
            applied_list_seq: 0,
            posting: false,
            error: None,
            toast: None,
            toast_generation: 0,
            toast_task: None,
            reconcile_tasks: Vec::new(),
            disposed: false,
        }
    }

    // -- Accessors --

    pub fn items(&self) -> &[FeedbackItem] {
        &self.items
    }

    pub fn loading(&self) -> bool {
        self.pending_lists > 0
    }

    pub fn posting(&self) -> bool {
        self.posting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.as_deref()
    }

    #[cfg(test)]
    fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Items passing the active filter and search query, in display order.
    pub fn filtered(&mut self) -> Vec<FeedbackItem> {
        let indices =
            self.memo
                .indices(self.items_revision, &self.items, self.filter, &self.query);
        indices.iter().map(|&i| self.items[i].clone()).collect()
    }

    /// Build the view the TUI renders.
    pub fn snapshot(&mut self) -> BoardSnapshot {
        BoardSnapshot {
            items: self.filtered(),
            total: self.items.len(),
            loading: self.loading(),
            posting: self.posting,
            error: self.error.clone(),
            toast: self.toast.clone(),
            name: self.name.clone(),
            message: self.message.clone(),
            query: self.query.clone(),
            filter: self.filter,
            focus: self.focus,
        }
    }

    // -- Network-backed transitions --

    /// Issue a list request. Used on mount, for reconciliation, and for a
    /// manual refresh.
    pub fn refresh(&mut self) {
        if self.disposed {
            return;
        }
        self.list_seq += 1;
        self.pending_lists += 1;
        let request = self.list_seq;
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();

        debug!(request, "Refreshing feedback list");
        tokio::spawn(async move {
            let result = api.list().await;
            let _ = tx.send(ApiEvent::Listed { request, result }).await;
        });
    }

    /// Validate the form and, if it passes, post it.
    ///
    /// Ignored while a previous submit is still in flight.
    pub fn submit(&mut self) {
        if self.disposed {
            return;
        }
        if self.posting {
            debug!("Submit ignored: a submission is already in flight");
            return;
        }
        self.error = None;

        let submission = match validate_submission(&self.name, &self.message) {
            Ok(submission) => submission,
            Err(e) => {
                debug!("Submission rejected locally: {}", e);
                self.error = Some(e.to_string());
                return;
            }
        };

        self.posting = true;
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();

        info!("Submitting feedback from {}", submission.name);
        tokio::spawn(async move {
            let result = api.create(&submission.name, &submission.message).await;
            let _ = tx.send(ApiEvent::Created(result)).await;
        });
    }

    // -- Event handling --

    /// Apply a user command. `Quit` is handled by the event loop.
    pub fn handle_command(&mut self, cmd: UserCommand) {
        match cmd {
            UserCommand::InsertChar(c) => self.insert_char(c),
            UserCommand::DeleteChar => {
                self.focused_field_mut().pop();
            }
            UserCommand::FocusNext => self.focus = self.focus.next(),
            UserCommand::FocusPrev => self.focus = self.focus.prev(),
            UserCommand::SetFilter(filter) => self.filter = filter,
            UserCommand::CycleFilter => self.filter = self.filter.next(),
            UserCommand::ClearSearch => self.query.clear(),
            UserCommand::Submit => self.submit(),
            UserCommand::Refresh => self.refresh(),
            UserCommand::DismissError => self.error = None,
            UserCommand::Quit => {}
        }
    }

    /// Apply the result of a background task.
    pub fn handle_event(&mut self, event: ApiEvent) {
        if self.disposed {
            debug!("Discarding API event after disposal: {:?}", event);
            return;
        }

        match event {
            ApiEvent::Listed { request, result } => {
                self.pending_lists = self.pending_lists.saturating_sub(1);
                match result {
                    Ok(items) if request > self.applied_list_seq => {
                        debug!(request, count = items.len(), "Applying feedback list");
                        self.items = items;
                        self.items_revision += 1;
                        self.applied_list_seq = request;
                        self.error = None;
                    }
                    Ok(_) => {
                        debug!(
                            "Discarding stale list response (request: {}, applied: {})",
                            request, self.applied_list_seq
                        );
                    }
                    Err(e) if request > self.applied_list_seq => {
                        warn!(request, status = ?e.status(), "Feedback list request failed: {}", e);
                        self.error = Some(e.to_string());
                    }
                    Err(e) => {
                        debug!(
                            "Discarding stale list failure (request: {}, applied: {}): {}",
                            request, self.applied_list_seq, e
                        );
                    }
                }
            }
            ApiEvent::Created(result) => {
                self.posting = false;
                match result {
                    Ok(item) => {
                        info!("Feedback {} created", item.id);
                        self.name.clear();
                        self.message.clear();
                        self.items.retain(|existing| existing.id != item.id);
                        self.items.insert(0, item);
                        self.items_revision += 1;
                        self.schedule_reconciliation();
                        self.show_toast(TOAST_SUBMITTED);
                        self.focus = Focus::Message;
                    }
                    Err(e) => {
                        warn!(status = ?e.status(), "Feedback submission failed: {}", e);
                        self.error = Some(e.to_string());
                    }
                }
            }
            ApiEvent::ReconcileDue => {
                self.reconcile_tasks.retain(|handle| !handle.is_finished());
                self.refresh();
            }
            ApiEvent::ToastExpired { generation } => {
                if generation == self.toast_generation {
                    self.toast = None;
                    self.toast_task = None;
                }
            }
        }
    }

    /// Cancel pending timers and stop reacting to events.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let cancelled = self.abort_timers();
        info!("Board disposed ({} pending timers cancelled)", cancelled);
    }

    // -- Internals --

    fn focused_field_mut(&mut self) -> &mut String {
        match self.focus {
            Focus::Name => &mut self.name,
            Focus::Message => &mut self.message,
            Focus::Search => &mut self.query,
        }
    }

    /// Append to the focused field. The form fields refuse input past their
    /// limits; only the message accepts newlines.
    fn insert_char(&mut self, c: char) {
        let (limit, allow_newline) = match self.focus {
            Focus::Name => (Some(NAME_LIMIT), false),
            Focus::Message => (Some(MESSAGE_LIMIT), true),
            Focus::Search => (None, false),
        };
        if c == '\n' && !allow_newline {
            return;
        }
        let field = self.focused_field_mut();
        if limit.is_some_and(|max| field.chars().count() >= max) {
            return;
        }
        field.push(c);
    }

    fn schedule_reconciliation(&mut self) {
        for delay in self.config.reconcile_delays() {
            let tx = self.api_tx.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(ApiEvent::ReconcileDue).await;
            });
            self.reconcile_tasks.push(handle);
        }
        debug!(
            "Scheduled {} reconciliation refreshes",
            self.config.reconcile_delays_ms.len()
        );
    }

    fn show_toast(&mut self, text: &str) {
        if let Some(handle) = self.toast_task.take() {
            handle.abort();
        }
        self.toast_generation += 1;
        self.toast = Some(text.to_string());

        let generation = self.toast_generation;
        let delay: Duration = self.config.toast_duration();
        let tx = self.api_tx.clone();
        self.toast_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ApiEvent::ToastExpired { generation }).await;
        }));
    }

    /// Abort the toast timer and every reconciliation timer. Returns how
    /// many were still pending.
    fn abort_timers(&mut self) -> usize {
        let mut cancelled = 0;
        for handle in self.reconcile_tasks.drain(..) {
            if !handle.is_finished() {
                cancelled += 1;
            }
            handle.abort();
        }
        if let Some(handle) = self.toast_task.take() {
            if !handle.is_finished() {
                cancelled += 1;
            }
            handle.abort();
        }
        cancelled
    }
}

impl Drop for BoardController {
    fn drop(&mut self) {
        self.abort_timers();
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the board event loop.
///
/// Issues the initial refresh, then listens on:
/// 1. API events from spawned request and timer tasks
/// 2. User commands from the TUI
///
/// Pushes a snapshot through `ui_tx` after every message. Exits on
/// `UserCommand::Quit` or when the command or UI channel closes, disposing
/// the controller on the way out.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut api_rx: mpsc::Receiver<ApiEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut board: BoardController,
) -> anyhow::Result<()> {
    info!("Board event loop started");

    board.refresh();
    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(board.snapshot())))
        .await;

    loop {
        tokio::select! {
            // --- API events ---
            event = api_rx.recv() => {
                match event {
                    Some(event) => board.handle_event(event),
                    None => {
                        info!("API event channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => board.handle_command(cmd),
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }

        let snapshot = board.snapshot();
        if ui_tx
            .send(UiUpdate::Snapshot(Box::new(snapshot)))
            .await
            .is_err()
        {
            info!("UI channel closed, shutting down");
            break;
        }
    }

    board.dispose();
    info!("Board event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ApiError;
    use crate::feedback::Sentiment;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    // -----------------------------------------------------------------------
    // Test helpers
    // -----------------------------------------------------------------------

    /// In-memory backend. List responses are served from a queue (an `Err`
    /// entry is a failing status), then from `fallback_list`.
    #[derive(Default)]
    struct MockApi {
        list_results: Mutex<VecDeque<Result<Vec<FeedbackItem>, u16>>>,
        fallback_list: Mutex<Vec<FeedbackItem>>,
        create_error: Mutex<Option<String>>,
        next_id: Mutex<i64>,
        list_calls: AtomicUsize,
        create_calls: Mutex<Vec<(String, String)>>,
    }

    impl MockApi {
        fn with_items(items: Vec<FeedbackItem>) -> Self {
            let api = MockApi::default();
            *api.fallback_list.lock().unwrap() = items;
            *api.next_id.lock().unwrap() = 100;
            api
        }

        fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        fn create_calls(&self) -> Vec<(String, String)> {
            self.create_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedbackApi for MockApi {
        async fn list(&self) -> Result<Vec<FeedbackItem>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let queued = self.list_results.lock().unwrap().pop_front();
            match queued {
                Some(Ok(items)) => Ok(items),
                Some(Err(status)) => Err(ApiError::Load { status }),
                None => Ok(self.fallback_list.lock().unwrap().clone()),
            }
        }

        async fn create(&self, name: &str, message: &str) -> Result<FeedbackItem, ApiError> {
            self.create_calls
                .lock()
                .unwrap()
                .push((name.to_string(), message.to_string()));
            if let Some(message) = self.create_error.lock().unwrap().clone() {
                return Err(ApiError::Submit {
                    status: 500,
                    message,
                });
            }
            let id = {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                *next
            };
            Ok(item(id, name, message, None))
        }

        async fn ping(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn item(id: i64, name: &str, message: &str, sentiment: Option<&str>) -> FeedbackItem {
        FeedbackItem {
            id,
            name: name.to_string(),
            message: message.to_string(),
            sentiment: sentiment.map(str::to_string),
            summary: None,
            created_at: "2024-05-01T12:00:00Z".to_string(),
        }
    }

    fn board_with(api: &Arc<MockApi>) -> (BoardController, mpsc::Receiver<ApiEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let board = BoardController::new(BoardConfig::default(), api.clone(), tx);
        (board, rx)
    }

    /// Receive and apply the next API event.
    async fn pump(board: &mut BoardController, rx: &mut mpsc::Receiver<ApiEvent>) -> ApiEventKind {
        let event = rx.recv().await.expect("event channel open");
        let kind = ApiEventKind::of(&event);
        board.handle_event(event);
        kind
    }

    #[derive(Debug, PartialEq)]
    enum ApiEventKind {
        Listed,
        Created,
        ReconcileDue,
        ToastExpired,
    }

    impl ApiEventKind {
        fn of(event: &ApiEvent) -> Self {
            match event {
                ApiEvent::Listed { .. } => ApiEventKind::Listed,
                ApiEvent::Created(_) => ApiEventKind::Created,
                ApiEvent::ReconcileDue => ApiEventKind::ReconcileDue,
                ApiEvent::ToastExpired { .. } => ApiEventKind::ToastExpired,
            }
        }
    }

    fn assert_elapsed(start: Instant, expected_ms: u64) {
        let elapsed = start.elapsed().as_millis() as u64;
        assert!(
            (expected_ms..expected_ms + 50).contains(&elapsed),
            "expected ~{expected_ms}ms, got {elapsed}ms"
        );
    }

    fn type_text(board: &mut BoardController, text: &str) {
        for c in text.chars() {
            board.handle_command(UserCommand::InsertChar(c));
        }
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn refresh_replaces_items_and_clears_loading() {
        let api = Arc::new(MockApi::with_items(vec![item(1, "Ann", "Great job", Some("positive"))]));
        let (mut board, mut rx) = board_with(&api);

        board.refresh();
        assert!(board.loading());

        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::Listed);
        assert!(!board.loading());
        assert_eq!(board.items().len(), 1);
        assert!(board.error().is_none());
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_sets_error_and_keeps_items() {
        let api = Arc::new(MockApi::default());
        api.list_results.lock().unwrap().push_back(Err(500));
        let (mut board, mut rx) = board_with(&api);

        board.refresh();
        pump(&mut board, &mut rx).await;

        assert!(!board.loading());
        assert!(board.items().is_empty());
        let error = board.error().expect("error should be set");
        assert!(error.contains("500"), "{error}");
    }

    #[tokio::test]
    async fn successful_refresh_clears_previous_error() {
        let api = Arc::new(MockApi::with_items(vec![item(1, "Ann", "Hi", None)]));
        api.list_results.lock().unwrap().push_back(Err(502));
        let (mut board, mut rx) = board_with(&api);

        board.refresh();
        pump(&mut board, &mut rx).await;
        assert!(board.error().is_some());

        board.refresh();
        pump(&mut board, &mut rx).await;
        assert!(board.error().is_none());
        assert_eq!(board.items().len(), 1);
    }

    #[tokio::test]
    async fn stale_list_response_is_discarded() {
        let api = Arc::new(MockApi::default());
        let (mut board, mut rx) = board_with(&api);

        board.refresh();
        board.refresh();
        // Drain the real responses; replay them out of order by hand.
        let _ = rx.recv().await;
        let _ = rx.recv().await;

        board.handle_event(ApiEvent::Listed {
            request: 2,
            result: Ok(vec![item(2, "New", "fresh", None)]),
        });
        assert!(board.loading(), "one request still outstanding");
        board.handle_event(ApiEvent::Listed {
            request: 1,
            result: Ok(vec![item(1, "Old", "stale", None)]),
        });

        assert!(!board.loading());
        assert_eq!(board.items().len(), 1);
        assert_eq!(board.items()[0].id, 2);
    }

    #[tokio::test]
    async fn stale_list_failure_does_not_override_fresh_data() {
        let api = Arc::new(MockApi::default());
        let (mut board, mut rx) = board_with(&api);

        board.refresh();
        board.refresh();
        let _ = rx.recv().await;
        let _ = rx.recv().await;

        board.handle_event(ApiEvent::Listed {
            request: 2,
            result: Ok(vec![item(2, "New", "fresh", None)]),
        });
        board.handle_event(ApiEvent::Listed {
            request: 1,
            result: Err(ApiError::Load { status: 500 }),
        });

        assert!(!board.loading());
        assert!(board.error().is_none(), "{:?}", board.error());
        assert_eq!(board.items()[0].id, 2);
    }

    #[tokio::test]
    async fn newer_list_failure_is_reported() {
        let api = Arc::new(MockApi::default());
        let (mut board, mut rx) = board_with(&api);

        board.refresh();
        board.refresh();
        let _ = rx.recv().await;
        let _ = rx.recv().await;

        board.handle_event(ApiEvent::Listed {
            request: 1,
            result: Ok(vec![item(1, "Old", "kept", None)]),
        });
        board.handle_event(ApiEvent::Listed {
            request: 2,
            result: Err(ApiError::Load { status: 503 }),
        });

        assert_eq!(board.error(), Some("Load failed (503)"));
        assert_eq!(board.items()[0].id, 1, "items untouched on failure");
    }

    // -----------------------------------------------------------------------
    // Submit: validation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn submit_rejects_blank_fields_without_network() {
        let api = Arc::new(MockApi::default());
        let (mut board, mut rx) = board_with(&api);

        type_text(&mut board, "   ");
        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "Hello");
        board.handle_command(UserCommand::Submit);

        assert_eq!(board.error(), Some("Please fill in both fields."));
        assert!(!board.posting());
        assert!(rx.try_recv().is_err());
        assert!(api.create_calls().is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_over_limit_fields_naming_both_limits() {
        let api = Arc::new(MockApi::default());
        let (mut board, mut rx) = board_with(&api);

        // Typing stops at the limit, so set the field directly.
        board.name = "x".repeat(NAME_LIMIT + 1);
        board.message = "hello".into();
        board.submit();

        let error = board.error().expect("error should be set");
        assert!(error.contains("50") && error.contains("500"), "{error}");
        assert!(!board.posting());
        assert!(rx.try_recv().is_err());
        assert!(api.create_calls().is_empty());
        assert_eq!(board.name.chars().count(), NAME_LIMIT + 1, "fields untouched");
    }

    // -----------------------------------------------------------------------
    // Submit: network
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn submit_success_prepends_clears_form_and_reconciles() {
        let api = Arc::new(MockApi::with_items(vec![item(1, "Ann", "Great job", Some("positive"))]));
        let (mut board, mut rx) = board_with(&api);

        board.refresh();
        pump(&mut board, &mut rx).await;

        type_text(&mut board, "  Bob ");
        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "Nice board");
        board.handle_command(UserCommand::Submit);
        assert!(board.posting());

        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::Created);
        let start = Instant::now();

        // Optimistic update is visible immediately.
        assert_eq!(api.create_calls(), vec![("Bob".to_string(), "Nice board".to_string())]);
        assert!(!board.posting());
        assert_eq!(board.items()[0].id, 101);
        assert_eq!(board.items()[1].id, 1);
        assert!(board.name.is_empty() && board.message.is_empty());
        assert_eq!(board.toast(), Some(TOAST_SUBMITTED));
        assert_eq!(board.focus, Focus::Message);

        // First reconciliation at 1.5 s.
        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::ReconcileDue);
        assert_elapsed(start, 1500);
        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::Listed);
        assert_eq!(api.list_calls(), 2);
        assert!(board.toast().is_some());

        // Toast disappears at 2 s.
        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::ToastExpired);
        assert_elapsed(start, 2000);
        assert!(board.toast().is_none());

        // Second reconciliation at 5 s.
        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::ReconcileDue);
        assert_elapsed(start, 5000);
        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::Listed);
        assert_eq!(api.list_calls(), 3);
    }

    #[tokio::test]
    async fn submit_failure_sets_error_and_keeps_fields() {
        let api = Arc::new(MockApi::default());
        *api.create_error.lock().unwrap() = "database is locked".to_string().into();
        let (mut board, mut rx) = board_with(&api);

        type_text(&mut board, "Ann");
        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "Hello");
        board.submit();
        assert_eq!(pump(&mut board, &mut rx).await, ApiEventKind::Created);

        assert!(!board.posting());
        assert_eq!(board.error(), Some("database is locked"));
        assert_eq!(board.name, "Ann");
        assert_eq!(board.message, "Hello");
        assert!(board.items().is_empty());
        assert!(board.toast().is_none());
    }

    #[tokio::test]
    async fn submit_is_ignored_while_posting() {
        let api = Arc::new(MockApi::default());
        let (mut board, mut rx) = board_with(&api);

        type_text(&mut board, "Ann");
        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "Hello");
        board.submit();
        board.submit();
        pump(&mut board, &mut rx).await;

        assert_eq!(api.create_calls().len(), 1);
        assert_eq!(board.items().len(), 1);
    }

    #[tokio::test]
    async fn submit_clears_previous_error_first() {
        let api = Arc::new(MockApi::default());
        let (mut board, _rx) = board_with(&api);

        board.error = Some("Load failed (500)".into());
        type_text(&mut board, "Ann");
        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "Hello");
        board.submit();

        assert!(board.error().is_none());
        assert!(board.posting());
    }

    #[tokio::test]
    async fn optimistic_insert_keeps_ids_unique() {
        let api = Arc::new(MockApi::default());
        let (mut board, _rx) = board_with(&api);

        board.handle_event(ApiEvent::Listed {
            request: 1,
            result: Ok(vec![item(7, "Ann", "already listed", None), item(3, "Cy", "older", None)]),
        });
        board.posting = true;
        board.handle_event(ApiEvent::Created(Ok(item(7, "Ann", "already listed", None))));

        let ids: Vec<i64> = board.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![7, 3]);
        board.dispose();
    }

    // -----------------------------------------------------------------------
    // Disposal
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_scheduled_refreshes() {
        let api = Arc::new(MockApi::default());
        let (mut board, mut rx) = board_with(&api);

        type_text(&mut board, "Ann");
        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "Hello");
        board.submit();
        pump(&mut board, &mut rx).await;
        assert!(board.toast().is_some());

        board.dispose();
        assert!(board.is_disposed());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err(), "no timer should fire after disposal");
        assert_eq!(api.list_calls(), 0);

        // Late events and commands are inert.
        board.handle_event(ApiEvent::ReconcileDue);
        board.handle_command(UserCommand::Refresh);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_toast_ignores_old_timer() {
        let api = Arc::new(MockApi::default());
        let (mut board, _rx) = board_with(&api);

        board.show_toast("first");
        let old_generation = board.toast_generation;
        board.show_toast("second");

        board.handle_event(ApiEvent::ToastExpired {
            generation: old_generation,
        });
        assert_eq!(board.toast(), Some("second"));
        board.dispose();
    }

    // -----------------------------------------------------------------------
    // Field editing, filter, search
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn typing_routes_to_focused_field_and_respects_limits() {
        let api = Arc::new(MockApi::default());
        let (mut board, _rx) = board_with(&api);

        type_text(&mut board, &"n".repeat(NAME_LIMIT + 5));
        assert_eq!(board.name.chars().count(), NAME_LIMIT);
        board.handle_command(UserCommand::InsertChar('\n'));
        assert!(!board.name.contains('\n'));

        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "line one\nline two");
        assert_eq!(board.message, "line one\nline two");
        board.handle_command(UserCommand::DeleteChar);
        assert_eq!(board.message, "line one\nline tw");

        board.handle_command(UserCommand::FocusNext);
        type_text(&mut board, "abc");
        assert_eq!(board.query, "abc");
        board.handle_command(UserCommand::ClearSearch);
        assert!(board.query.is_empty());
    }

    #[tokio::test]
    async fn filter_and_search_derive_view_without_network() {
        let api = Arc::new(MockApi::default());
        let (mut board, _rx) = board_with(&api);
        board.handle_event(ApiEvent::Listed {
            request: 1,
            result: Ok(vec![
                item(1, "Ann", "Great job", Some("positive")),
                item(2, "Bob", "Too slow", Some("negative")),
                item(3, "Cy", "Great but slow", Some("mixed")),
                item(4, "Di", "Fine", Some("neutral")),
            ]),
        });

        board.handle_command(UserCommand::SetFilter(SentimentFilter::Only(Sentiment::Negative)));
        let ids: Vec<i64> = board.snapshot().items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2]);

        board.handle_command(UserCommand::SetFilter(SentimentFilter::All));
        board.focus = Focus::Search;
        type_text(&mut board, "GREAT");
        let snap = board.snapshot();
        assert_eq!(snap.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(snap.total, 4);

        board.handle_command(UserCommand::CycleFilter);
        assert_eq!(board.filter, SentimentFilter::Only(Sentiment::Positive));
        assert_eq!(board.snapshot().items.len(), 1);

        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test]
    async fn snapshot_reuses_memo_between_unrelated_changes() {
        let api = Arc::new(MockApi::default());
        let (mut board, _rx) = board_with(&api);
        board.handle_event(ApiEvent::Listed {
            request: 1,
            result: Ok(vec![item(1, "Ann", "Hi", None)]),
        });

        board.snapshot();
        type_text(&mut board, "Typing in the name field");
        board.snapshot();
        assert_eq!(board.memo.recomputations(), 1);
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_loads_on_mount_and_exits_on_quit() {
        let api = Arc::new(MockApi::with_items(vec![item(1, "Ann", "Hi", None)]));
        let (api_tx, api_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let board = BoardController::new(BoardConfig::default(), api.clone(), api_tx);

        let handle = tokio::spawn(run(cmd_rx, api_rx, ui_tx, board));

        let UiUpdate::Snapshot(first) = ui_rx.recv().await.unwrap();
        assert!(first.loading);

        let UiUpdate::Snapshot(loaded) = ui_rx.recv().await.unwrap();
        assert!(!loaded.loading);
        assert_eq!(loaded.items.len(), 1);

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let result = handle.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn run_exits_when_command_channel_closes() {
        let api = Arc::new(MockApi::default());
        let (api_tx, api_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, _ui_rx) = mpsc::channel(64);
        let board = BoardController::new(BoardConfig::default(), api, api_tx);

        let handle = tokio::spawn(run(cmd_rx, api_rx, ui_tx, board));
        drop(cmd_tx);

        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }
}
