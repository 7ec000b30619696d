//! Knowledge base page: listing with type/search filters, file upload, free
//! text entry, the edit dialog and deletion.
//!
//! Same split as the review queue: [`KnowledgeBaseState`] is synchronous
//! and token-checked, [`KnowledgeBase`] drives it against the API.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::api_client::ApiClient;
use crate::config::KnowledgeConfig;
use crate::error::{DashboardError, Result};
use crate::models::{
    is_plain_text_filename, KnowledgeContent, KnowledgeFilterOptions, KnowledgeItem, KnowledgeItemUpdate,
    KnowledgeTypeFilter, NewKnowledgeItem,
};
use crate::request::{RequestToken, RequestTracker};
use crate::validation::InputValidator;

/// Inline error when the item list cannot be fetched
pub const LOAD_ITEMS_FAILED: &str = "Failed to load knowledge items. Please try again.";
/// Inline error when an upload is rejected by the backend
pub const UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";
/// Inline error when a text entry cannot be added
pub const ADD_TEXT_FAILED: &str = "Failed to add text entry. Please try again.";
/// Inline error in the edit dialog
pub const SAVE_FAILED: &str = "Failed to save changes. Please try again.";
/// Inline error when a delete fails
pub const DELETE_FAILED: &str = "Failed to delete item. Please try again.";

/// Which file extensions may be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    accepted_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self { accepted_types: vec![".txt".to_string()] }
    }
}

impl UploadPolicy {
    /// Policy accepting `accepted_types` (e.g. `".pdf"`), compared case-insensitively
    pub fn new<I, S>(accepted_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { accepted_types: accepted_types.into_iter().map(|t| t.into().to_lowercase()).collect() }
    }

    /// Policy from the `knowledge` config section
    #[must_use]
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        Self::new(config.accepted_types.iter().cloned())
    }

    /// Accepted extensions, lower-cased
    #[must_use]
    pub fn accepted_types(&self) -> &[String] {
        &self.accepted_types
    }

    /// Reject filenames whose extension is not accepted
    pub fn check(&self, filename: &str) -> Result<()> {
        InputValidator::validate_upload(filename, &self.accepted_types)
    }

    /// Turn an accepted upload into a new file item. Plain-text files that
    /// decode as UTF-8 keep readable content; everything else stays binary.
    pub fn prepare(&self, auditor_id: &str, filename: &str, bytes: Vec<u8>) -> Result<NewKnowledgeItem> {
        self.check(filename)?;
        let content = if is_plain_text_filename(filename) {
            match String::from_utf8(bytes) {
                Ok(text) => KnowledgeContent::Text(text),
                Err(e) => KnowledgeContent::Binary(e.into_bytes()),
            }
        } else {
            KnowledgeContent::Binary(bytes)
        };
        Ok(NewKnowledgeItem::file(auditor_id, filename, content))
    }
}

/// The free-text entry box
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEntry {
    text: String,
    submitting: bool,
}

impl TextEntry {
    /// Replace the entry text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Current entry text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether a submission is in flight
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Submit button state: non-blank text and nothing in flight
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.submitting && InputValidator::validate_text_entry(&self.text).is_ok()
    }

    /// Lock the entry and build the item. The text is sent untrimmed.
    pub fn begin_submit(&mut self, auditor_id: &str) -> Option<NewKnowledgeItem> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        Some(NewKnowledgeItem::text(auditor_id, self.text.clone()))
    }

    /// Success clears the box; failure keeps the text
    pub fn finish_submit(&mut self, succeeded: bool) {
        self.submitting = false;
        if succeeded {
            self.text.clear();
        }
    }
}

/// Edit dialog for a text item or a plain-text file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeItemDialog {
    item_id: String,
    title: String,
    original: String,
    content: String,
    saving: bool,
    error: Option<String>,
}

impl KnowledgeItemDialog {
    /// Dialog for `item`, or `None` when the item is read-only
    #[must_use]
    pub fn open(item: &KnowledgeItem) -> Option<Self> {
        if !item.is_editable() {
            return None;
        }
        let text = match &item.content {
            KnowledgeContent::Text(text) => text.clone(),
            KnowledgeContent::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        Some(Self {
            item_id: item.id.clone(),
            title: item.title().to_string(),
            original: text.clone(),
            content: text,
            saving: false,
            error: None,
        })
    }

    /// Item being edited
    #[must_use]
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Dialog heading
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current text in the editor
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the editor text
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Whether the content differs from what was loaded
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.content != self.original
    }

    /// Whether a save is in flight
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    /// Inline error, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn begin_save(&mut self) -> Option<KnowledgeItemUpdate> {
        if self.saving {
            return None;
        }
        self.saving = true;
        self.error = None;
        Some(KnowledgeItemUpdate::content(self.content.clone()).edited_at(Utc::now()))
    }

    fn fail_save(&mut self) {
        self.saving = false;
        self.error = Some(SAVE_FAILED.to_string());
    }
}

/// A knowledge call that passed local checks and awaits the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeCall<T> {
    /// Slot token checked when the result arrives
    pub token: RequestToken,
    /// Payload to send
    pub request: T,
}

/// Items, filters, forms and dialog of the knowledge base page
#[derive(Debug)]
pub struct KnowledgeBaseState {
    auditor_id: String,
    policy: UploadPolicy,
    items: Vec<KnowledgeItem>,
    loading: bool,
    load_error: Option<String>,
    filter: KnowledgeFilterOptions,
    upload_error: Option<String>,
    text_entry: TextEntry,
    text_error: Option<String>,
    dialog: Option<KnowledgeItemDialog>,
    delete_error: Option<String>,
    load_requests: RequestTracker,
    upload_requests: RequestTracker,
    text_requests: RequestTracker,
    save_requests: RequestTracker,
    delete_requests: RequestTracker,
}

impl KnowledgeBaseState {
    /// Empty state for `auditor_id`
    pub fn new(auditor_id: impl Into<String>, policy: UploadPolicy) -> Self {
        Self {
            auditor_id: auditor_id.into(),
            policy,
            items: Vec::new(),
            loading: false,
            load_error: None,
            filter: KnowledgeFilterOptions::default(),
            upload_error: None,
            text_entry: TextEntry::default(),
            text_error: None,
            dialog: None,
            delete_error: None,
            load_requests: RequestTracker::new(),
            upload_requests: RequestTracker::new(),
            text_requests: RequestTracker::new(),
            save_requests: RequestTracker::new(),
            delete_requests: RequestTracker::new(),
        }
    }

    /// Auditor the page belongs to
    #[must_use]
    pub fn auditor_id(&self) -> &str {
        &self.auditor_id
    }

    /// Upload rules
    #[must_use]
    pub const fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Every fetched item, in backend order
    #[must_use]
    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    /// Whether the item list is being fetched
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Inline error of the last fetch
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Type selector and search text
    #[must_use]
    pub const fn filter(&self) -> &KnowledgeFilterOptions {
        &self.filter
    }

    /// Pick the item type to show
    pub fn set_type_filter(&mut self, item_type: KnowledgeTypeFilter) {
        self.filter.item_type = item_type;
    }

    /// Replace the search text; filtering is local
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.filter.search_query = query.into();
    }

    /// Items passing the type selector and the search text
    #[must_use]
    pub fn visible_items(&self) -> Vec<&KnowledgeItem> {
        self.filter.apply(&self.items)
    }

    /// Inline error of the last upload
    #[must_use]
    pub fn upload_error(&self) -> Option<&str> {
        self.upload_error.as_deref()
    }

    /// Whether an upload is in flight
    #[must_use]
    pub const fn is_uploading(&self) -> bool {
        self.upload_requests.in_flight()
    }

    /// Free-text entry form
    #[must_use]
    pub const fn text_entry(&self) -> &TextEntry {
        &self.text_entry
    }

    /// Mutable access to the entry form
    pub fn text_entry_mut(&mut self) -> &mut TextEntry {
        &mut self.text_entry
    }

    /// Inline error of the last text entry
    #[must_use]
    pub fn text_error(&self) -> Option<&str> {
        self.text_error.as_deref()
    }

    /// Open edit dialog, if any
    #[must_use]
    pub const fn dialog(&self) -> Option<&KnowledgeItemDialog> {
        self.dialog.as_ref()
    }

    /// Mutable access to the open dialog
    pub fn dialog_mut(&mut self) -> Option<&mut KnowledgeItemDialog> {
        self.dialog.as_mut()
    }

    /// Inline error of the last delete
    #[must_use]
    pub fn delete_error(&self) -> Option<&str> {
        self.delete_error.as_deref()
    }

    /// Start (re)fetching the items
    pub fn begin_load(&mut self) -> RequestToken {
        self.loading = true;
        self.load_error = None;
        self.load_requests.issue()
    }

    /// Apply a fetch. Returns whether the result was used.
    pub fn finish_load(&mut self, token: RequestToken, result: Result<Vec<KnowledgeItem>>) -> bool {
        if !self.load_requests.complete(token) {
            debug!(sequence = token.sequence(), "Dropping stale knowledge list");
            return false;
        }
        self.loading = false;
        match result {
            Ok(items) => self.items = items,
            Err(_) => self.load_error = Some(LOAD_ITEMS_FAILED.to_string()),
        }
        true
    }

    /// Check an upload against the policy. A rejected file sets the inline
    /// error and yields nothing to send.
    pub fn begin_upload(&mut self, filename: &str, bytes: Vec<u8>) -> Option<KnowledgeCall<NewKnowledgeItem>> {
        if self.upload_requests.in_flight() {
            return None;
        }
        match self.policy.prepare(&self.auditor_id, filename, bytes) {
            Ok(request) => {
                self.upload_error = None;
                Some(KnowledgeCall { token: self.upload_requests.issue(), request })
            }
            Err(e) => {
                self.upload_error = Some(e.inline_message());
                None
            }
        }
    }

    /// Apply an upload: append the stored item or set the upload error
    pub fn finish_upload(&mut self, token: RequestToken, result: Result<KnowledgeItem>) -> bool {
        if !self.upload_requests.complete(token) {
            return false;
        }
        match result {
            Ok(item) => self.items.push(item),
            Err(_) => self.upload_error = Some(UPLOAD_FAILED.to_string()),
        }
        true
    }

    /// Validate the text entry and start adding it
    pub fn begin_add_text(&mut self) -> Option<KnowledgeCall<NewKnowledgeItem>> {
        let request = self.text_entry.begin_submit(&self.auditor_id)?;
        self.text_error = None;
        Some(KnowledgeCall { token: self.text_requests.issue(), request })
    }

    /// Apply a text add: append and clear the entry, or set the error
    pub fn finish_add_text(&mut self, token: RequestToken, result: Result<KnowledgeItem>) -> bool {
        if !self.text_requests.complete(token) {
            self.text_entry.finish_submit(false);
            return false;
        }
        match result {
            Ok(item) => {
                self.items.push(item);
                self.text_entry.finish_submit(true);
            }
            Err(_) => {
                self.text_entry.finish_submit(false);
                self.text_error = Some(ADD_TEXT_FAILED.to_string());
            }
        }
        true
    }

    /// Click on an item. Only editable items open the dialog; returns
    /// whether one was opened.
    pub fn open_item(&mut self, item_id: &str) -> bool {
        let Some(dialog) = self.items.iter().find(|item| item.id == item_id).and_then(KnowledgeItemDialog::open)
        else {
            return false;
        };
        self.save_requests.invalidate();
        self.dialog = Some(dialog);
        true
    }

    /// Dismiss the dialog; a save still in flight is dropped
    pub fn close_dialog(&mut self) {
        self.save_requests.invalidate();
        self.dialog = None;
    }

    /// Start saving the open dialog; `None` if no dialog or a save is running
    pub fn begin_save(&mut self) -> Option<KnowledgeCall<(String, KnowledgeItemUpdate)>> {
        let dialog = self.dialog.as_mut()?;
        let update = dialog.begin_save()?;
        let item_id = dialog.item_id().to_string();
        Some(KnowledgeCall { token: self.save_requests.issue(), request: (item_id, update) })
    }

    /// Success closes the dialog and replaces the item in place; failure
    /// keeps the dialog open with an inline error and the list untouched.
    pub fn finish_save(&mut self, token: RequestToken, result: Result<KnowledgeItem>) -> bool {
        if !self.save_requests.complete(token) {
            return false;
        }
        match result {
            Ok(updated) => {
                if let Some(slot) = self.items.iter_mut().find(|item| item.id == updated.id) {
                    *slot = updated;
                }
                self.dialog = None;
            }
            Err(_) => {
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.fail_save();
                }
            }
        }
        true
    }

    /// Start deleting `item_id`
    pub fn begin_delete(&mut self, item_id: &str) -> KnowledgeCall<String> {
        self.delete_error = None;
        KnowledgeCall { token: self.delete_requests.issue(), request: item_id.to_string() }
    }

    /// Apply a delete: drop the item or set the delete error
    pub fn finish_delete(&mut self, call: &KnowledgeCall<String>, result: Result<()>) -> bool {
        if !self.delete_requests.complete(call.token) {
            return false;
        }
        match result {
            Ok(()) => {
                self.items.retain(|item| item.id != call.request);
                if self.dialog.as_ref().is_some_and(|d| d.item_id() == call.request) {
                    self.close_dialog();
                }
            }
            Err(_) => self.delete_error = Some(DELETE_FAILED.to_string()),
        }
        true
    }

    /// Stop applying any result; the page went away
    pub fn close(&mut self) {
        self.load_requests.close();
        self.upload_requests.close();
        self.text_requests.close();
        self.save_requests.close();
        self.delete_requests.close();
        self.loading = false;
    }
}

/// Async driver for a [`KnowledgeBaseState`]
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    api: ApiClient,
    state: Arc<Mutex<KnowledgeBaseState>>,
}

impl KnowledgeBase {
    /// Page over `api` with nothing loaded
    pub fn new(api: ApiClient, auditor_id: impl Into<String>, policy: UploadPolicy) -> Self {
        Self { api, state: Arc::new(Mutex::new(KnowledgeBaseState::new(auditor_id, policy))) }
    }

    /// Page with the auditor's items loaded
    pub async fn open(api: ApiClient, auditor_id: impl Into<String>, policy: UploadPolicy) -> Self {
        let page = Self::new(api, auditor_id, policy);
        page.load().await;
        page
    }

    /// Lock the state for reading or local edits
    pub async fn state(&self) -> MutexGuard<'_, KnowledgeBaseState> {
        self.state.lock().await
    }

    /// Fetch the auditor's items
    pub async fn load(&self) -> bool {
        let (token, auditor_id) = {
            let mut state = self.state.lock().await;
            (state.begin_load(), state.auditor_id().to_string())
        };
        let result = self.api.get_knowledge_items(&auditor_id).await;
        self.state.lock().await.finish_load(token, result)
    }

    /// Upload file bytes. Returns whether a new item was applied.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> bool {
        let Some(call) = self.state.lock().await.begin_upload(filename, bytes) else {
            return false;
        };
        info!(filename, "Uploading knowledge file");
        let result = self.api.add_knowledge_item(&call.request).await;
        let mut state = self.state.lock().await;
        state.finish_upload(call.token, result) && state.upload_error().is_none()
    }

    /// Upload a file from disk, named after its final path component
    pub async fn upload_path(&self, path: &Path) -> Result<bool> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DashboardError::Validation(format!("Not a file path: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(self.upload(filename, bytes).await)
    }

    /// Submit a free-text entry
    pub async fn add_text(&self, text: &str) -> bool {
        let call = {
            let mut state = self.state.lock().await;
            state.text_entry_mut().set_text(text);
            state.begin_add_text()
        };
        let Some(call) = call else {
            return false;
        };
        let result = self.api.add_knowledge_item(&call.request).await;
        let mut state = self.state.lock().await;
        state.finish_add_text(call.token, result) && state.text_error().is_none()
    }

    /// Click an item; see [`KnowledgeBaseState::open_item`]
    pub async fn open_item(&self, item_id: &str) -> bool {
        self.state.lock().await.open_item(item_id)
    }

    /// Save the open dialog with `content`. Returns whether the save succeeded.
    pub async fn save_dialog(&self, content: &str) -> bool {
        let call = {
            let mut state = self.state.lock().await;
            match state.dialog_mut() {
                Some(dialog) => dialog.set_content(content),
                None => return false,
            }
            state.begin_save()
        };
        let Some(call) = call else {
            return false;
        };
        let (item_id, update) = &call.request;
        info!(item_id = %item_id, "Saving knowledge item");
        let result = self.api.update_knowledge_item(item_id, update).await;
        let mut state = self.state.lock().await;
        state.finish_save(call.token, result) && state.dialog().is_none()
    }

    /// Delete an item. Returns whether it was removed.
    pub async fn delete(&self, item_id: &str) -> bool {
        let call = self.state.lock().await.begin_delete(item_id);
        let result = self.api.delete_knowledge_item(item_id).await;
        let mut state = self.state.lock().await;
        state.finish_delete(&call, result) && state.delete_error().is_none()
    }

    /// Tear down: results still in flight are dropped
    pub async fn close(&self) {
        self.state.lock().await.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{seed_knowledge_items, DEFAULT_AUDITOR_ID};
    use crate::models::KnowledgeItemType;

    fn loaded(policy: UploadPolicy) -> KnowledgeBaseState {
        let mut state = KnowledgeBaseState::new(DEFAULT_AUDITOR_ID, policy);
        let token = state.begin_load();
        let items = seed_knowledge_items().into_iter().filter(|i| i.auditor_id == DEFAULT_AUDITOR_ID).collect();
        assert!(state.finish_load(token, Ok(items)));
        state
    }

    #[test]
    fn test_rejected_upload_sets_inline_error() {
        let mut state = loaded(UploadPolicy::new([".pdf", ".docx"]));
        assert!(state.begin_upload("report.exe", vec![0]).is_none());
        assert_eq!(state.upload_error(), Some("Unsupported file type. Please upload a PDF or DOCX file."));
    }

    #[test]
    fn test_plain_text_upload_keeps_text() {
        let policy = UploadPolicy::default();
        let item = policy.prepare(DEFAULT_AUDITOR_ID, "Notes.TXT", b"hello".to_vec()).unwrap();
        assert_eq!(item.item_type, KnowledgeItemType::File);
        assert_eq!(item.content, KnowledgeContent::Text("hello".into()));

        let raw = policy.prepare(DEFAULT_AUDITOR_ID, "bad.txt", vec![0xff, 0xfe]).unwrap();
        assert_eq!(raw.content, KnowledgeContent::Binary(vec![0xff, 0xfe]));

        let pdf = UploadPolicy::new([".pdf"]).prepare(DEFAULT_AUDITOR_ID, "a.pdf", b"%PDF".to_vec()).unwrap();
        assert!(matches!(pdf.content, KnowledgeContent::Binary(_)));
    }

    #[test]
    fn test_text_entry_is_sent_untrimmed_and_cleared() {
        let mut entry = TextEntry::default();
        entry.set_text("   ");
        assert!(!entry.can_submit());
        entry.set_text("  keep spacing ");
        let item = entry.begin_submit(DEFAULT_AUDITOR_ID).unwrap();
        assert_eq!(item.content.as_text(), Some("  keep spacing "));
        assert!(entry.begin_submit(DEFAULT_AUDITOR_ID).is_none());
        entry.finish_submit(true);
        assert_eq!(entry.text(), "");
    }

    #[test]
    fn test_only_editable_items_open() {
        let mut state = loaded(UploadPolicy::default());
        assert!(!state.open_item("1"));
        assert!(state.dialog().is_none());
        assert!(state.open_item("2"));
        assert_eq!(state.dialog().map(KnowledgeItemDialog::title), Some("Text Entry"));
    }

    #[test]
    fn test_failed_save_keeps_dialog() {
        let mut state = loaded(UploadPolicy::default());
        state.open_item("2");
        state.dialog_mut().unwrap().set_content("revised");
        let call = state.begin_save().unwrap();
        assert!(state.begin_save().is_none());
        state.finish_save(call.token, Err(DashboardError::Network("down".into())));

        let dialog = state.dialog().unwrap();
        assert_eq!(dialog.error(), Some(SAVE_FAILED));
        assert_eq!(dialog.content(), "revised");
        assert!(!dialog.is_saving());
        let original = state.items().iter().find(|i| i.id == "2").unwrap();
        assert_ne!(original.content.as_text(), Some("revised"));
    }

    #[test]
    fn test_filters_combine() {
        let mut state = loaded(UploadPolicy::default());
        state.set_type_filter(KnowledgeTypeFilter::File);
        assert_eq!(state.visible_items().len(), 2);
        state.set_search("INVEST");
        let visible = state.visible_items();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "3");
    }
}
