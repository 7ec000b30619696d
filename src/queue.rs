//! Message review queue: status tabs, the message list, the detail pane and
//! the actions taken on the selected message.
//!
//! [`QueueState`] is a synchronous state machine. Every backend call is split
//! into a `begin_*` step that issues a [`RequestToken`] and a `finish_*` step
//! that applies the result only if that token is still current.
//! [`MessageQueue`] drives it against an [`ApiClient`], holding the state
//! behind a mutex only between await points so several calls can be in
//! flight at once.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::api_client::ApiClient;
use crate::detail::{self, MessageSummary, StatusAction};
use crate::error::{DashboardError, Result};
use crate::models::{ConfidenceRange, DateRange, Message, MessageFilterOptions, MessageStatus, RefinementInput};
use crate::refinement::RefinementForm;
use crate::request::{RequestToken, RequestTracker};

/// Tabs in display order
pub const TABS: [MessageStatus; 4] =
    [MessageStatus::Pending, MessageStatus::Later, MessageStatus::Approved, MessageStatus::Rejected];

/// Inline error for a failed list fetch
pub const LOAD_MESSAGES_FAILED: &str = "Failed to load messages. Please try again.";
/// Inline error for a failed detail fetch
pub const LOAD_DETAIL_FAILED: &str = "Failed to load message details. Please try again.";

/// Inline error for a failed status change
#[must_use]
pub fn status_update_failed(target: MessageStatus) -> String {
    format!("Failed to update status to {target}")
}

/// A status change that passed the local checks and awaits the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Status slot token
    pub token: RequestToken,
    /// Message being moved
    pub message_id: String,
    /// Requested status
    pub target: MessageStatus,
}

/// A regeneration that passed validation and awaits the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regeneration {
    /// Regeneration slot token
    pub token: RequestToken,
    /// Guidance sent to the backend
    pub request: RefinementInput,
}

/// List, detail and action state of the review queue
#[derive(Debug)]
pub struct QueueState {
    auditor_id: String,
    active_tab: MessageStatus,
    messages: Vec<Message>,
    list_loading: bool,
    list_error: Option<String>,
    search: String,
    confidence_range: Option<ConfidenceRange>,
    date_range: Option<DateRange>,
    selected_id: Option<String>,
    detail: Option<Message>,
    detail_loading: bool,
    detail_error: Option<String>,
    action_error: Option<String>,
    refinement: RefinementForm,
    list_requests: RequestTracker,
    detail_requests: RequestTracker,
    status_requests: RequestTracker,
    regenerate_requests: RequestTracker,
}

impl QueueState {
    /// Empty queue on the Pending tab
    pub fn new(auditor_id: impl Into<String>) -> Self {
        Self {
            auditor_id: auditor_id.into(),
            active_tab: MessageStatus::Pending,
            messages: Vec::new(),
            list_loading: false,
            list_error: None,
            search: String::new(),
            confidence_range: None,
            date_range: None,
            selected_id: None,
            detail: None,
            detail_loading: false,
            detail_error: None,
            action_error: None,
            refinement: RefinementForm::new(),
            list_requests: RequestTracker::new(),
            detail_requests: RequestTracker::new(),
            status_requests: RequestTracker::new(),
            regenerate_requests: RequestTracker::new(),
        }
    }

    /// Auditor the page belongs to
    #[must_use]
    pub fn auditor_id(&self) -> &str {
        &self.auditor_id
    }

    /// Status tab being shown
    #[must_use]
    pub const fn active_tab(&self) -> MessageStatus {
        self.active_tab
    }

    /// Everything fetched for the active tab, in backend order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether the tab is being fetched
    #[must_use]
    pub const fn is_list_loading(&self) -> bool {
        self.list_loading
    }

    /// Inline error of the last tab fetch
    #[must_use]
    pub fn list_error(&self) -> Option<&str> {
        self.list_error.as_deref()
    }

    /// Current search text
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Change the search text. Filtering is local; nothing is fetched.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Keep only messages whose confidence lies in `range`; `None` lifts it.
    /// Unlike the search text this survives tab switches.
    pub fn set_confidence_range(&mut self, range: Option<ConfidenceRange>) {
        self.confidence_range = range;
    }

    /// Keep only messages created inside `range`; `None` lifts it
    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.date_range = range;
    }

    /// Client-side filter over the fetched tab
    #[must_use]
    pub fn filter(&self) -> MessageFilterOptions {
        MessageFilterOptions {
            status: None,
            date_range: self.date_range,
            confidence_range: self.confidence_range,
            search_query: Some(self.search.clone()),
        }
    }

    /// Messages of the active tab that pass the filter
    #[must_use]
    pub fn visible_messages(&self) -> Vec<&Message> {
        self.filter().apply(&self.messages)
    }

    /// List cards for the visible messages
    #[must_use]
    pub fn summaries(&self, now: DateTime<Utc>) -> Vec<MessageSummary> {
        self.visible_messages()
            .into_iter()
            .map(|m| MessageSummary::new(m, self.selected_id.as_deref() == Some(m.id.as_str()), now))
            .collect()
    }

    /// Placeholder shown when nothing is visible
    #[must_use]
    pub fn empty_text(&self) -> Option<String> {
        if self.list_loading || self.list_error.is_some() || !self.visible_messages().is_empty() {
            return None;
        }
        Some(detail::empty_list_text(self.active_tab, &self.search))
    }

    /// Message picked in the list
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Message shown in the detail pane
    #[must_use]
    pub const fn detail(&self) -> Option<&Message> {
        self.detail.as_ref()
    }

    /// Whether the detail fetch is in flight
    #[must_use]
    pub const fn is_detail_loading(&self) -> bool {
        self.detail_loading
    }

    /// Inline error of the last detail fetch
    #[must_use]
    pub fn detail_error(&self) -> Option<&str> {
        self.detail_error.as_deref()
    }

    /// Inline error of the last status change
    #[must_use]
    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    /// Guidance form of the detail pane
    #[must_use]
    pub const fn refinement(&self) -> &RefinementForm {
        &self.refinement
    }

    /// Mutable access to the guidance form
    pub fn refinement_mut(&mut self) -> &mut RefinementForm {
        &mut self.refinement
    }

    /// Whether a status update is running
    #[must_use]
    pub const fn is_updating_status(&self) -> bool {
        self.status_requests.in_flight()
    }

    /// Status buttons for the detail pane
    #[must_use]
    pub fn status_actions(&self) -> Vec<StatusAction> {
        self.detail
            .as_ref()
            .map(|message| detail::status_actions(message, self.is_updating_status()))
            .unwrap_or_default()
    }

    /// Switch tab and start fetching it. Clears the selection, the search
    /// text and any detail or action error; a detail fetch still in flight
    /// is dropped.
    pub fn begin_tab(&mut self, tab: MessageStatus) -> RequestToken {
        self.active_tab = tab;
        self.search.clear();
        self.selected_id = None;
        self.detail = None;
        self.detail_loading = false;
        self.detail_error = None;
        self.action_error = None;
        self.refinement = RefinementForm::new();
        self.detail_requests.invalidate();
        self.regenerate_requests.invalidate();

        self.list_loading = true;
        self.list_error = None;
        self.list_requests.issue()
    }

    /// Apply a tab fetch. Returns whether the result was used.
    pub fn finish_tab(&mut self, token: RequestToken, result: Result<Vec<Message>>) -> bool {
        if !self.list_requests.complete(token) {
            debug!(sequence = token.sequence(), "Dropping stale message list");
            return false;
        }
        self.list_loading = false;
        match result {
            Ok(messages) => {
                self.messages = messages;
                self.list_error = None;
            }
            Err(_) => {
                self.messages.clear();
                self.list_error = Some(LOAD_MESSAGES_FAILED.to_string());
            }
        }
        true
    }

    /// Select a message and start fetching its details
    pub fn begin_select(&mut self, message_id: impl Into<String>) -> RequestToken {
        self.selected_id = Some(message_id.into());
        self.detail_loading = true;
        self.detail_error = None;
        self.action_error = None;
        self.refinement = RefinementForm::new();
        self.regenerate_requests.invalidate();
        self.detail_requests.issue()
    }

    /// Apply a detail fetch. The list is never touched.
    pub fn finish_select(&mut self, token: RequestToken, result: Result<Message>) -> bool {
        if !self.detail_requests.complete(token) {
            debug!(sequence = token.sequence(), "Dropping stale message detail");
            return false;
        }
        self.detail_loading = false;
        match result {
            Ok(message) => {
                self.detail = Some(message);
                self.detail_error = None;
            }
            Err(_) => {
                self.detail = None;
                self.detail_error = Some(LOAD_DETAIL_FAILED.to_string());
            }
        }
        true
    }

    /// Check and start a status change of the message in the detail pane.
    ///
    /// Refused with a validation error when nothing is shown, when the
    /// message already has `target`, or while another update is running.
    pub fn begin_status_update(&mut self, target: MessageStatus) -> Result<StatusUpdate> {
        let message = self
            .detail
            .as_ref()
            .ok_or_else(|| DashboardError::Validation("No message selected".to_string()))?;
        if !detail::can_transition(message, target) {
            return Err(DashboardError::Validation(format!("Message is already {target}")));
        }
        if self.status_requests.in_flight() {
            return Err(DashboardError::Validation("A status update is already in progress".to_string()));
        }

        let message_id = message.id.clone();
        self.action_error = None;
        Ok(StatusUpdate { token: self.status_requests.issue(), message_id, target })
    }

    /// Apply a status change.
    ///
    /// On success the detail pane shows the returned message (if it is still
    /// the one displayed) and the list drops it when its new status is not
    /// the active tab, otherwise replaces it in place. On failure only the
    /// action error changes.
    pub fn finish_status_update(&mut self, update: &StatusUpdate, result: Result<Message>) -> bool {
        if !self.status_requests.complete(update.token) {
            debug!(message_id = %update.message_id, "Dropping stale status update");
            return false;
        }
        match result {
            Ok(updated) => {
                self.apply_updated_message(updated);
                self.action_error = None;
            }
            Err(_) => self.action_error = Some(status_update_failed(update.target)),
        }
        true
    }

    /// Validate the refinement form and start a regeneration
    pub fn begin_regenerate(&mut self) -> Option<Regeneration> {
        if self.regenerate_requests.in_flight() {
            return None;
        }
        let message_id = self.detail.as_ref()?.id.clone();
        let request = self.refinement.begin_submit(&message_id)?;
        Some(Regeneration { token: self.regenerate_requests.issue(), request })
    }

    /// Apply a regeneration. Failure keeps the form's guidance and sets its
    /// inline error; nothing else changes. A stale result leaves the current
    /// form alone.
    pub fn finish_regenerate(&mut self, regeneration: &Regeneration, result: Result<Message>) -> bool {
        if !self.regenerate_requests.complete(regeneration.token) {
            debug!(message_id = %regeneration.request.message_id, "Dropping stale regeneration");
            return false;
        }
        match result {
            Ok(updated) => {
                self.refinement.finish_submit(true);
                self.apply_updated_message(updated);
            }
            Err(_) => self.refinement.finish_submit(false),
        }
        true
    }

    fn apply_updated_message(&mut self, updated: Message) {
        if updated.status == self.active_tab {
            if let Some(slot) = self.messages.iter_mut().find(|m| m.id == updated.id) {
                *slot = updated.clone();
            }
        } else {
            self.messages.retain(|m| m.id != updated.id);
        }

        if self.detail.as_ref().is_some_and(|shown| shown.id == updated.id) {
            self.detail = Some(updated);
        }
    }

    /// Stop applying any result; the page went away
    pub fn close(&mut self) {
        self.list_requests.close();
        self.detail_requests.close();
        self.status_requests.close();
        self.regenerate_requests.close();
        self.list_loading = false;
        self.detail_loading = false;
        self.refinement.abandon();
    }

    /// Whether [`QueueState::close`] has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.list_requests.is_closed()
    }
}

/// Async driver for a [`QueueState`]
#[derive(Debug, Clone)]
pub struct MessageQueue {
    api: ApiClient,
    state: Arc<Mutex<QueueState>>,
}

impl MessageQueue {
    /// Queue for `auditor_id`; nothing is fetched yet
    pub fn new(api: ApiClient, auditor_id: impl Into<String>) -> Self {
        Self { api, state: Arc::new(Mutex::new(QueueState::new(auditor_id))) }
    }

    /// Queue with the Pending tab loaded
    pub async fn open(api: ApiClient, auditor_id: impl Into<String>) -> Self {
        let queue = Self::new(api, auditor_id);
        queue.select_tab(MessageStatus::Pending).await;
        queue
    }

    /// Lock the state for reading or local edits (search text, guidance)
    pub async fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().await
    }

    /// Switch to `tab` and fetch it
    pub async fn select_tab(&self, tab: MessageStatus) -> bool {
        let (token, auditor_id) = {
            let mut state = self.state.lock().await;
            (state.begin_tab(tab), state.auditor_id().to_string())
        };
        let result = self.api.get_messages(&auditor_id, Some(tab)).await;
        if let Ok(messages) = &result {
            debug!(tab = %tab, count = messages.len(), "Loaded messages");
        }
        self.state.lock().await.finish_tab(token, result)
    }

    /// Select a message and fetch its details
    pub async fn select_message(&self, message_id: &str) -> bool {
        let token = self.state.lock().await.begin_select(message_id);
        let result = self.api.get_message(message_id).await;
        self.state.lock().await.finish_select(token, result)
    }

    /// Move the selected message to `target`.
    ///
    /// Returns an error without calling the backend when the change is
    /// refused locally; otherwise whether the result was applied.
    pub async fn update_status(&self, target: MessageStatus) -> Result<bool> {
        let update = self.state.lock().await.begin_status_update(target)?;
        info!(message_id = %update.message_id, status = %target, "Updating message status");
        let result = self.api.update_message_status(&update.message_id, target).await;
        Ok(self.state.lock().await.finish_status_update(&update, result))
    }

    /// Regenerate the selected message's response with `guidance`.
    ///
    /// Blank guidance only sets the form's inline error. Returns whether a
    /// result was applied.
    pub async fn regenerate(&self, guidance: &str) -> bool {
        let regeneration = {
            let mut state = self.state.lock().await;
            state.refinement_mut().set_guidance(guidance);
            state.begin_regenerate()
        };
        let Some(regeneration) = regeneration else {
            return false;
        };
        info!(message_id = %regeneration.request.message_id, "Regenerating response");
        let result = self.api.regenerate_response(&regeneration.request).await;
        self.state.lock().await.finish_regenerate(&regeneration, result)
    }

    /// Tear down: results still in flight are dropped
    pub async fn close(&self) {
        self.state.lock().await.close();
    }
}
