//! Application state management for bookdesk.
//!
//! This module contains the core `App` struct that drives the booking
//! review queue: the active tab, cursor and scroll position, the list
//! synchronizer, the detail cache, and the confirmation gate in front of
//! every status change.

use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use bookdesk_core::{
    ApiClient, BookingRequest, BookingStatus, Config, ConfirmationGate, DetailSource, Filter,
    GateAction, KeyedCache, ListSource, ListSynchronizer, Outcome, Prompt, SyncSnapshot,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the detail result channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs. Each one is a filter on the booking queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTab {
    Pending,
    Approved,
    Declined,
    Availability,
}

impl ReviewTab {
    pub const ALL: [ReviewTab; 4] = [
        ReviewTab::Pending,
        ReviewTab::Approved,
        ReviewTab::Declined,
        ReviewTab::Availability,
    ];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            ReviewTab::Pending => "Pending",
            ReviewTab::Approved => "Approved",
            ReviewTab::Declined => "Declined",
            ReviewTab::Availability => "Availability",
        }
    }

    /// The list filter behind this tab. Availability has no status store.
    pub fn filter(&self) -> Filter<BookingStatus> {
        match self {
            ReviewTab::Pending => Filter::Status(BookingStatus::Pending),
            ReviewTab::Approved => Filter::Status(BookingStatus::Approved),
            ReviewTab::Declined => Filter::Status(BookingStatus::Declined),
            ReviewTab::Availability => Filter::NoStatus,
        }
    }

    /// Parse the `default_tab` config value.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.title().eq_ignore_ascii_case(name.trim()))
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            ReviewTab::Pending => ReviewTab::Approved,
            ReviewTab::Approved => ReviewTab::Declined,
            ReviewTab::Declined => ReviewTab::Availability,
            ReviewTab::Availability => ReviewTab::Pending,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            ReviewTab::Pending => ReviewTab::Availability,
            ReviewTab::Approved => ReviewTab::Pending,
            ReviewTab::Declined => ReviewTab::Approved,
            ReviewTab::Availability => ReviewTab::Declined,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// A detail record loaded in the background.
struct DetailResult {
    id: i64,
    record: Option<BookingRequest>,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub sync: Arc<ListSynchronizer<BookingRequest>>,
    pub details: Arc<KeyedCache<BookingRequest>>,
    pub gate: Arc<ConfirmationGate>,

    // UI State
    pub state: AppState,
    pub current_tab: ReviewTab,
    pub cursor: usize,
    pub scroll: usize,
    pub viewport_rows: usize,

    /// Copy of the synchronizer state, retaken when it announces a change.
    pub snapshot: SyncSnapshot<BookingRequest>,
    revisions: watch::Receiver<u64>,
    /// Hydrated record for the cursor row, once loaded.
    pub detail: Option<BookingRequest>,
    pub detail_loading: bool,
    /// Row the detail panel last asked the cache for.
    detail_for: Option<i64>,
    pub status_message: Option<String>,

    detail_rx: mpsc::Receiver<DetailResult>,
    detail_tx: mpsc::Sender<DetailResult>,
}

impl App {
    /// Create a new application instance over `api`.
    pub fn new(config: Config, api: ApiClient) -> Self {
        let api = Arc::new(api);
        let list_source: Arc<dyn ListSource<BookingRequest>> = api.clone();
        let detail_source: Arc<dyn DetailSource<BookingRequest>> = api;
        Self::with_sources(config, list_source, detail_source)
    }

    pub fn with_sources(
        config: Config,
        list_source: Arc<dyn ListSource<BookingRequest>>,
        detail_source: Arc<dyn DetailSource<BookingRequest>>,
    ) -> Self {
        let current_tab = config
            .default_tab
            .as_deref()
            .and_then(ReviewTab::from_name)
            .unwrap_or(ReviewTab::Pending);
        debug!(tab = current_tab.title(), "Initial tab");

        let sync = Arc::new(ListSynchronizer::new(list_source, current_tab.filter()));
        let revisions = sync.subscribe();
        let snapshot = sync.snapshot();
        let (detail_tx, detail_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            sync,
            details: Arc::new(KeyedCache::new(detail_source)),
            gate: Arc::new(ConfirmationGate::new()),
            state: AppState::Normal,
            current_tab,
            cursor: 0,
            scroll: 0,
            viewport_rows: PAGE_SCROLL_SIZE,
            snapshot,
            revisions,
            detail: None,
            detail_loading: false,
            detail_for: None,
            status_message: None,
            detail_rx,
            detail_tx,
        }
    }

    /// Fetch the initial tab.
    pub fn start(&mut self) {
        info!(tab = self.current_tab.title(), "Loading initial tab");
        self.spawn_fetch();
    }

    /// Stop accepting background results.
    pub fn shutdown(&self) {
        self.sync.unmount();
    }

    fn spawn_fetch(&self) {
        let sync = self.sync.clone();
        let filter = self.current_tab.filter();
        tokio::spawn(async move {
            sync.set_filter(filter).await;
        });
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Switch tabs. Each switch is a filter change; results of earlier,
    /// slower switches are dropped by the synchronizer.
    pub fn switch_tab(&mut self, tab: ReviewTab) {
        if tab == self.current_tab {
            return;
        }
        self.current_tab = tab;
        self.cursor = 0;
        self.scroll = 0;
        self.detail = None;
        self.detail_loading = false;
        self.detail_for = None;
        self.status_message = None;
        self.spawn_fetch();
    }

    /// Re-fetch the current tab and drop every cached detail record.
    pub fn refresh(&mut self) {
        info!(tab = self.current_tab.title(), "Manual refresh");
        self.details.clear();
        self.detail = None;
        self.detail_for = None;
        let sync = self.sync.clone();
        tokio::spawn(async move {
            sync.refresh().await;
        });
        self.status_message = Some("Refreshing...".to_string());
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.snapshot.records.len();
        if len == 0 {
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, len as isize - 1) as usize;
        self.keep_cursor_visible();
        self.detail = None;
    }

    pub fn cursor_to_start(&mut self) {
        self.cursor = 0;
        self.keep_cursor_visible();
        self.detail = None;
    }

    pub fn cursor_to_end(&mut self) {
        self.cursor = self.snapshot.records.len().saturating_sub(1);
        self.keep_cursor_visible();
        self.detail = None;
    }

    fn keep_cursor_visible(&mut self) {
        let rows = self.viewport_rows.max(1);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + rows {
            self.scroll = self.cursor + 1 - rows;
        }
    }

    /// Scroll offset to render with. Held in place while a prompt is open.
    pub fn effective_scroll(&self) -> usize {
        self.gate.pinned_scroll().unwrap_or(self.scroll)
    }

    pub fn cursor_record(&self) -> Option<&BookingRequest> {
        self.snapshot.records.get(self.cursor)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn toggle_cursor_selection(&mut self) {
        if let Some(id) = self.cursor_record().map(|b| b.id) {
            self.sync.toggle_selected(id);
            self.move_cursor(1);
        }
    }

    pub fn select_all(&mut self) {
        self.sync.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.sync.clear_selection();
        self.sync.clear_error();
        self.status_message = None;
    }

    // =========================================================================
    // Status changes
    // =========================================================================

    /// Ask for confirmation before moving the selection (or the cursor row,
    /// when nothing is selected) to `status`.
    pub fn request_transition(&mut self, status: BookingStatus) {
        if self.current_tab == ReviewTab::Availability {
            return;
        }
        if self.current_tab.filter() == Filter::Status(status) {
            self.status_message = Some(format!("Already {}", status));
            return;
        }

        let selected = self.sync.selected_ids();
        let ids = if selected.is_empty() {
            match self.cursor_record() {
                Some(booking) => vec![booking.id],
                None => {
                    self.status_message = Some("Nothing to update".to_string());
                    return;
                }
            }
        } else {
            if self.sync.bulk_actions_disabled() {
                self.status_message = Some("Busy - please wait".to_string());
                return;
            }
            selected
        };

        let prompt = transition_prompt(status, ids.len());
        let action = transition_action(self.sync.clone(), self.details.clone(), ids, status);
        if !self.gate.request(prompt, self.scroll, action) {
            self.status_message = Some("Another update is still running".to_string());
        }
    }

    /// Run the pending action. Repeat presses while it runs are ignored.
    pub fn confirm(&self) {
        let gate = self.gate.clone();
        tokio::spawn(async move {
            gate.confirm().await;
        });
    }

    pub fn cancel(&self) {
        self.gate.cancel();
    }

    // =========================================================================
    // Detail panel
    // =========================================================================

    /// Load the hydrated record for the cursor row through the cache.
    pub fn open_detail(&mut self) {
        let id = match self.cursor_record() {
            Some(booking) => booking.id,
            None => return,
        };
        self.detail_for = Some(id);

        if let Some(record) = self.details.peek(&id) {
            self.detail = Some(record);
            self.detail_loading = false;
            return;
        }

        self.detail_loading = true;
        let details = self.details.clone();
        let tx = self.detail_tx.clone();
        tokio::spawn(async move {
            let record = details.get(&id).await;
            Self::send_result(&tx, DetailResult { id, record }).await;
        });
    }

    /// Helper to send detail results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<DetailResult>, result: DetailResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send detail result - channel closed");
        }
    }

    // =========================================================================
    // Frame tick
    // =========================================================================

    /// Pull the latest synchronizer state and any finished detail loads.
    pub fn tick(&mut self) {
        if matches!(self.revisions.has_changed(), Ok(true)) {
            let _ = self.revisions.borrow_and_update();
            self.snapshot = self.sync.snapshot();
        }

        let len = self.snapshot.records.len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
            self.keep_cursor_visible();
        }

        if let Some(scroll) = self.gate.take_restored_scroll() {
            self.scroll = scroll;
            self.keep_cursor_visible();
        }

        while let Ok(result) = self.detail_rx.try_recv() {
            self.process_detail_result(result);
        }

        let cursor_id = self.cursor_record().map(|b| b.id);
        if cursor_id.is_some() && cursor_id != self.detail_for {
            self.open_detail();
        }

        if self.status_message.as_deref() == Some("Refreshing...") && !self.snapshot.loading {
            self.status_message = None;
        }
    }

    fn process_detail_result(&mut self, result: DetailResult) {
        let current = self.cursor_record().map(|b| b.id);
        if current != Some(result.id) {
            debug!(id = result.id, "Dropping detail for a row no longer under the cursor");
            return;
        }
        self.detail_loading = false;
        match result.record {
            Some(record) => self.detail = Some(record),
            None => self.status_message = Some(format!("Could not load request #{}", result.id)),
        }
    }

    /// Detail to show for the cursor row: the hydrated record if loaded,
    /// otherwise the list summary.
    pub fn detail_view(&self) -> Option<&BookingRequest> {
        let row = self.cursor_record()?;
        match &self.detail {
            Some(detail) if detail.id == row.id => Some(detail),
            _ => Some(row),
        }
    }

    pub fn is_quitting(&self) -> bool {
        matches!(self.state, AppState::Quitting)
    }
}

fn transition_prompt(status: BookingStatus, count: usize) -> Prompt {
    let noun = if count == 1 { "request" } else { "requests" };
    Prompt::new(
        format!("{} {} {}?", status.action_label(), count, noun),
        format!("The {} will move to the {} tab.", noun, status),
    )
}

/// The confirmed status change. Cached details of the moved rows carry the
/// old status, so they are dropped once the change commits.
fn transition_action(
    sync: Arc<ListSynchronizer<BookingRequest>>,
    details: Arc<KeyedCache<BookingRequest>>,
    ids: Vec<i64>,
    status: BookingStatus,
) -> GateAction {
    Box::new(move || {
        async move {
            let outcome = match ids.as_slice() {
                [id] => sync.transition(*id, status).await,
                _ => sync.transition_many(&ids, status).await,
            };
            if outcome == Outcome::Committed {
                for id in &ids {
                    details.invalidate(id);
                }
            }
        }
        .boxed()
    })
}

/// Build an `App` from configuration, failing before any UI is drawn.
pub fn build(config: Config) -> Result<App> {
    let api = ApiClient::from_config(&config)?;
    Ok(App::new(config, api))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bookdesk_core::ApiError;
    use chrono::Utc;

    /// In-memory accessor; every call succeeds immediately.
    struct StaticSource {
        rows: Vec<BookingRequest>,
    }

    impl StaticSource {
        fn new(ids: &[i64]) -> Arc<Self> {
            let rows = ids
                .iter()
                .map(|&id| BookingRequest {
                    id,
                    name: format!("Guest {}", id),
                    email: format!("guest{}@example.com", id),
                    phone: None,
                    event_type: None,
                    event_date: None,
                    guest_count: None,
                    message: Some("Full message".to_string()),
                    status: BookingStatus::Pending,
                    created_at: Utc::now(),
                })
                .collect();
            Arc::new(Self { rows })
        }
    }

    #[async_trait]
    impl ListSource<BookingRequest> for StaticSource {
        async fn fetch_by_filter(
            &self,
            _status: BookingStatus,
        ) -> Result<Vec<BookingRequest>, ApiError> {
            Ok(self.rows.clone())
        }

        async fn update_status(&self, _id: &i64, _status: BookingStatus) -> Result<(), ApiError> {
            Ok(())
        }

        async fn update_status_many(
            &self,
            _ids: &[i64],
            _status: BookingStatus,
        ) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[async_trait]
    impl DetailSource<BookingRequest> for StaticSource {
        async fn fetch_by_id(&self, id: &i64) -> Result<BookingRequest, ApiError> {
            self.rows
                .iter()
                .find(|b| b.id == *id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(id.to_string()))
        }
    }

    fn app(ids: &[i64]) -> App {
        let source = StaticSource::new(ids);
        App::with_sources(Config::default(), source.clone(), source)
    }

    async fn loaded_app(ids: &[i64]) -> App {
        let mut app = app(ids);
        app.sync.set_filter(app.current_tab.filter()).await;
        app.tick();
        app
    }

    #[test]
    fn test_tab_next() {
        assert_eq!(ReviewTab::Pending.next(), ReviewTab::Approved);
        assert_eq!(ReviewTab::Availability.next(), ReviewTab::Pending);
    }

    #[test]
    fn test_tab_prev() {
        assert_eq!(ReviewTab::Pending.prev(), ReviewTab::Availability);
        assert_eq!(ReviewTab::Declined.prev(), ReviewTab::Approved);
    }

    #[test]
    fn test_tab_filters() {
        assert_eq!(ReviewTab::Availability.filter(), Filter::NoStatus);
        assert_eq!(
            ReviewTab::Declined.filter(),
            Filter::Status(BookingStatus::Declined)
        );
    }

    #[test]
    fn test_tab_from_name() {
        assert_eq!(ReviewTab::from_name("approved"), Some(ReviewTab::Approved));
        assert_eq!(ReviewTab::from_name(" Availability "), Some(ReviewTab::Availability));
        assert_eq!(ReviewTab::from_name("archive"), None);
    }

    #[test]
    fn test_transition_prompt_wording() {
        let prompt = transition_prompt(BookingStatus::Declined, 3);
        assert_eq!(prompt.title, "Decline 3 requests?");
        let prompt = transition_prompt(BookingStatus::Approved, 1);
        assert_eq!(prompt.title, "Approve 1 request?");
    }

    #[tokio::test]
    async fn test_default_tab_from_config() {
        let source = StaticSource::new(&[]);
        let config = Config {
            default_tab: Some("declined".to_string()),
            ..Config::default()
        };
        let app = App::with_sources(config, source.clone(), source);
        assert_eq!(app.current_tab, ReviewTab::Declined);
    }

    #[tokio::test]
    async fn test_cursor_clamps_and_scrolls() {
        let mut app = loaded_app(&[1, 2, 3, 4, 5]).await;
        app.viewport_rows = 2;

        app.move_cursor(3);
        assert_eq!(app.cursor, 3);
        assert_eq!(app.scroll, 2);
        app.move_cursor(10);
        assert_eq!(app.cursor, 4);
        app.move_cursor(-10);
        assert_eq!(app.cursor, 0);
        assert_eq!(app.scroll, 0);
    }

    #[tokio::test]
    async fn test_confirmed_transition_removes_selection() {
        let mut app = loaded_app(&[1, 2, 3]).await;
        app.sync.toggle_selected(1);
        app.sync.toggle_selected(3);

        app.request_transition(BookingStatus::Approved);
        assert!(app.gate.is_visible());
        assert_eq!(app.gate.prompt().unwrap().title, "Approve 2 requests?");

        app.gate.confirm().await;
        app.tick();

        let ids: Vec<i64> = app.snapshot.records.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2]);
        assert!(app.snapshot.selected.is_empty());
        assert!(!app.gate.is_visible());
    }

    #[tokio::test]
    async fn test_confirmed_transition_drops_cached_details() {
        let mut app = app(&[1, 2]);
        app.sync.set_filter(app.current_tab.filter()).await;
        app.snapshot = app.sync.snapshot();
        app.details.get(&1).await;
        app.details.get(&2).await;

        app.request_transition(BookingStatus::Declined);
        app.gate.confirm().await;

        assert!(app.details.peek(&1).is_none());
        assert!(app.details.peek(&2).is_some());
    }

    #[tokio::test]
    async fn test_tick_keeps_snapshot_until_state_changes() {
        let mut app = loaded_app(&[1, 2, 3]).await;
        let revision = app.snapshot.revision;

        app.snapshot.records.pop();
        app.tick();
        assert_eq!(app.snapshot.records.len(), 2, "no change announced, no re-snapshot");

        app.sync.toggle_selected(1);
        app.tick();
        assert_eq!(app.snapshot.records.len(), 3);
        assert!(app.snapshot.is_selected(&1));
        assert_eq!(app.snapshot.revision, revision);
    }

    #[tokio::test]
    async fn test_transition_to_current_status_is_refused() {
        let mut app = loaded_app(&[1]).await;
        app.request_transition(BookingStatus::Pending);
        assert!(!app.gate.is_visible());
        assert_eq!(app.status_message.as_deref(), Some("Already pending"));
    }

    #[tokio::test]
    async fn test_scroll_pinned_while_prompt_open() {
        let mut app = loaded_app(&[1, 2, 3, 4, 5, 6]).await;
        app.viewport_rows = 2;
        app.move_cursor(4);
        let pinned = app.scroll;

        app.request_transition(BookingStatus::Declined);
        app.scroll = 0;
        assert_eq!(app.effective_scroll(), pinned);

        app.cancel();
        app.tick();
        assert_eq!(app.scroll, pinned);
        assert_eq!(app.effective_scroll(), pinned);
    }

    #[tokio::test]
    async fn test_open_detail_uses_cache() {
        let mut app = loaded_app(&[8]).await;
        app.details.get(&8).await;

        app.open_detail();

        assert!(!app.detail_loading);
        assert_eq!(
            app.detail_view().and_then(|b| b.message.as_deref()),
            Some("Full message")
        );
    }
}
