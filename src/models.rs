//! Data models for review messages and knowledge items
//!
//! These are the shapes exchanged with the backend. Field names serialize in
//! camelCase and statuses in upper case to match the REST contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::validation::InputValidator;

/// Filename suffixes treated as plain text (editable, searchable content)
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &[".txt"];

/// Disposition of a message under review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    /// Awaiting review
    Pending,
    /// Response accepted
    Approved,
    /// Response refused
    Rejected,
    /// Deferred for a later look
    Later,
}

impl MessageStatus {
    /// All statuses in declaration order
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Later];

    /// Wire representation (`PENDING`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Later => "LATER",
        }
    }

    /// Human label used on tabs and buttons
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Later => "Later",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "LATER" => Ok(Self::Later),
            other => Err(DashboardError::Validation(format!("Unknown message status: {other}"))),
        }
    }
}

/// Snapshot of a response that was replaced by a regeneration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHistoryItem {
    /// Unique identifier of the snapshot
    pub id: String,
    /// Message this snapshot belongs to
    pub message_id: String,
    /// The response text before regeneration
    pub response: String,
    /// The confidence before regeneration
    pub confidence: f64,
    /// When the captured response was last written
    pub created_at: DateTime<Utc>,
}

/// A customer question with its AI-generated response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Customer who asked the question
    pub customer_id: String,
    /// Auditor responsible for the review
    pub auditor_id: String,
    /// The customer's question
    pub question: String,
    /// The current generated response
    pub response: String,
    /// Estimated correctness of the response (0.0 to 1.0)
    pub confidence: f64,
    /// Review disposition
    pub status: MessageStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Earlier responses, oldest first
    #[serde(default)]
    pub history: Vec<MessageHistoryItem>,
}

impl Message {
    /// Case-insensitive substring match over question and response.
    /// A blank query matches everything; otherwise surrounding whitespace is
    /// part of the term.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        if query.trim().is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.question.to_lowercase().contains(&query) || self.response.to_lowercase().contains(&query)
    }
}

/// Regeneration request for a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementInput {
    /// Message to regenerate
    pub message_id: String,
    /// Auditor guidance for the new response
    pub guidance: String,
}

/// Inclusive confidence bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRange {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
}

impl ConfidenceRange {
    /// Range with both bounds inside `0.0..=1.0` and `min <= max`
    pub fn new(min: f64, max: f64) -> Result<Self, DashboardError> {
        InputValidator::validate_confidence(min)?;
        InputValidator::validate_confidence(max)?;
        if min > max {
            return Err(DashboardError::Validation(format!("Confidence range is empty: {min} > {max}")));
        }
        Ok(Self { min, max })
    }

    /// Whether `confidence` lies inside the range
    #[must_use]
    pub fn contains(&self, confidence: f64) -> bool {
        (self.min..=self.max).contains(&confidence)
    }
}

/// Date range for filtering messages by creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive, optional)
    pub start: Option<DateTime<Utc>>,
    /// End date (inclusive, optional)
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Whether `ts` falls inside the range
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| ts >= start) && self.end.map_or(true, |end| ts <= end)
    }
}

/// Client-side message filter. `status: None` means all statuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFilterOptions {
    /// Status to keep
    pub status: Option<MessageStatus>,
    /// Creation date bounds
    pub date_range: Option<DateRange>,
    /// Confidence bounds
    pub confidence_range: Option<ConfidenceRange>,
    /// Free-text search over question and response
    pub search_query: Option<String>,
}

impl MessageFilterOptions {
    /// Whether a message passes every configured criterion
    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        if self.status.is_some_and(|status| status != message.status) {
            return false;
        }
        if self.date_range.is_some_and(|range| !range.contains(message.created_at)) {
            return false;
        }
        if self.confidence_range.is_some_and(|range| !range.contains(message.confidence)) {
            return false;
        }
        self.search_query.as_deref().map_or(true, |query| message.matches_search(query))
    }

    /// Apply the filter, preserving order
    #[must_use]
    pub fn apply<'a>(&self, messages: &'a [Message]) -> Vec<&'a Message> {
        messages.iter().filter(|m| self.matches(m)).collect()
    }
}

/// Knowledge item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeItemType {
    /// Uploaded document
    File,
    /// Free-text entry
    Text,
}

impl fmt::Display for KnowledgeItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Payload of a knowledge item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KnowledgeContent {
    /// Readable text
    Text(String),
    /// Opaque file bytes
    Binary(Vec<u8>),
}

impl KnowledgeContent {
    /// Text view of the payload, if it is text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }
}

impl From<&str> for KnowledgeContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for KnowledgeContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Whether a filename carries a plain-text extension
#[must_use]
pub fn is_plain_text_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    PLAIN_TEXT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// A reference document or snippet kept by an auditor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItem {
    /// Unique identifier
    pub id: String,
    /// Owning auditor
    pub auditor_id: String,
    /// File or text
    #[serde(rename = "type")]
    pub item_type: KnowledgeItemType,
    /// Text or file payload
    pub content: KnowledgeContent,
    /// Original filename (file items only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeItem {
    /// Text entries and plain-text files can be opened for editing;
    /// every other file is read-only.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        match self.item_type {
            KnowledgeItemType::Text => true,
            KnowledgeItemType::File => self.filename.as_deref().is_some_and(is_plain_text_filename),
        }
    }

    /// Title shown in lists and dialogs
    #[must_use]
    pub fn title(&self) -> &str {
        self.filename.as_deref().unwrap_or("Text Entry")
    }

    /// Case-insensitive match against text content and filename.
    /// A blank query matches everything.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        let content_match = self.content.as_text().is_some_and(|text| text.to_lowercase().contains(&query));
        let filename_match = self.filename.as_deref().is_some_and(|name| name.to_lowercase().contains(&query));
        content_match || filename_match
    }
}

/// A knowledge item before the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKnowledgeItem {
    /// Owning auditor
    pub auditor_id: String,
    /// File or text
    #[serde(rename = "type")]
    pub item_type: KnowledgeItemType,
    /// Text or file payload
    pub content: KnowledgeContent,
    /// Original filename (file items only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl NewKnowledgeItem {
    /// A free-text entry
    pub fn text(auditor_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            auditor_id: auditor_id.into(),
            item_type: KnowledgeItemType::Text,
            content: KnowledgeContent::Text(text.into()),
            filename: None,
        }
    }

    /// An uploaded file
    pub fn file(auditor_id: impl Into<String>, filename: impl Into<String>, content: KnowledgeContent) -> Self {
        Self {
            auditor_id: auditor_id.into(),
            item_type: KnowledgeItemType::File,
            content,
            filename: Some(filename.into()),
        }
    }
}

/// Partial update of a knowledge item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItemUpdate {
    /// Replacement content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<KnowledgeContent>,
    /// Replacement filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Modification time set by the editor; the store stamps its own when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl KnowledgeItemUpdate {
    /// Update that only replaces the content with text
    pub fn content(text: impl Into<String>) -> Self {
        Self { content: Some(KnowledgeContent::Text(text.into())), filename: None, updated_at: None }
    }

    /// The same update stamped with the time of the edit
    #[must_use]
    pub const fn edited_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }
}

/// Type selector for the knowledge list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeTypeFilter {
    /// Every item
    #[default]
    All,
    /// Files only
    File,
    /// Text entries only
    Text,
}

impl KnowledgeTypeFilter {
    /// Whether an item type passes the selector
    #[must_use]
    pub fn accepts(self, item_type: KnowledgeItemType) -> bool {
        match self {
            Self::All => true,
            Self::File => item_type == KnowledgeItemType::File,
            Self::Text => item_type == KnowledgeItemType::Text,
        }
    }
}

impl FromStr for KnowledgeTypeFilter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "file" | "files" => Ok(Self::File),
            "text" => Ok(Self::Text),
            other => Err(DashboardError::Validation(format!("Unknown knowledge type: {other}"))),
        }
    }
}

/// Knowledge list filter: type selector AND search query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeFilterOptions {
    /// Type selector
    #[serde(rename = "type")]
    pub item_type: KnowledgeTypeFilter,
    /// Free-text search over content and filename
    pub search_query: String,
}

impl KnowledgeFilterOptions {
    /// Whether an item passes both criteria
    #[must_use]
    pub fn matches(&self, item: &KnowledgeItem) -> bool {
        self.item_type.accepts(item.item_type) && item.matches_search(&self.search_query)
    }

    /// Apply the filter, preserving order
    #[must_use]
    pub fn apply<'a>(&self, items: &'a [KnowledgeItem]) -> Vec<&'a KnowledgeItem> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}
