//! Presentation of messages: list cards, the detail pane's status actions
//! and the response history.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::relative_time;
use crate::models::{Message, MessageStatus};

/// Questions longer than this are cut in list cards
pub const QUESTION_PREVIEW_CHARS: usize = 100;

/// Confidence as a rounded percentage, e.g. `0.92` → `"92%"`
#[must_use]
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", (confidence * 100.0).round())
}

/// Absolute timestamp as shown in the detail pane, e.g. `Apr 24, 2025 9:30 AM`
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y %-I:%M %p").to_string()
}

/// Cut `text` to `max_chars` characters, appending `...` when shortened
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Colour band for a confidence chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    /// 0.9 and above
    High,
    /// 0.7 up to 0.9
    Medium,
    /// below 0.7
    Low,
}

impl ConfidenceBand {
    /// Band for a confidence score
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            Self::High
        } else if confidence >= 0.7 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One status button in the detail pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusAction {
    /// Status the button moves the message to
    pub target: MessageStatus,
    /// Button caption
    pub label: &'static str,
    /// False when the message already has `target` or an action is running
    pub enabled: bool,
}

/// Status buttons of the detail pane with their captions, in display order
pub const STATUS_BUTTONS: [(MessageStatus, &str); 3] =
    [(MessageStatus::Later, "Later"), (MessageStatus::Rejected, "Reject"), (MessageStatus::Approved, "Approve")];

/// Status buttons offered for `message`, in display order
#[must_use]
pub fn status_actions(message: &Message, busy: bool) -> Vec<StatusAction> {
    STATUS_BUTTONS
        .into_iter()
        .map(|(target, label)| StatusAction { target, label, enabled: !busy && message.status != target })
        .collect()
}

/// Whether moving `message` to `target` is allowed at all
#[must_use]
pub fn can_transition(message: &Message, target: MessageStatus) -> bool {
    message.status != target
}

/// A message as rendered in the queue list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSummary {
    /// Message id
    pub id: String,
    /// Question, truncated for the card
    pub question: String,
    /// Current status
    pub status: MessageStatus,
    /// Confidence as a percentage
    pub confidence: String,
    /// Colour band of the confidence
    pub band: ConfidenceBand,
    /// Relative last-update time
    pub updated: String,
    /// Whether the card is the selected message
    pub selected: bool,
}

impl MessageSummary {
    /// Card for `message` as of `now`
    #[must_use]
    pub fn new(message: &Message, selected: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: message.id.clone(),
            question: truncate(&message.question, QUESTION_PREVIEW_CHARS),
            status: message.status,
            confidence: format_confidence(message.confidence),
            band: ConfidenceBand::from_confidence(message.confidence),
            updated: relative_time(message.updated_at, now),
            selected,
        }
    }
}

/// One archived response in the history section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryVersion {
    /// 1-based, oldest first
    pub version: usize,
    /// Archived response text
    pub response: String,
    /// Confidence as a percentage
    pub confidence: String,
    /// When the version was archived
    pub created_at: String,
}

/// Archived responses as numbered versions, oldest first
#[must_use]
pub fn history_versions(message: &Message) -> Vec<HistoryVersion> {
    message
        .history
        .iter()
        .enumerate()
        .map(|(index, item)| HistoryVersion {
            version: index + 1,
            response: item.response.clone(),
            confidence: format_confidence(item.confidence),
            created_at: format_timestamp(item.created_at),
        })
        .collect()
}

/// Text shown when the visible list is empty
#[must_use]
pub fn empty_list_text(status: MessageStatus, search: &str) -> String {
    if search.is_empty() {
        format!("No {} messages found", status.as_str().to_lowercase())
    } else {
        "No messages match your search".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::seed_messages;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.92), "92%");
        assert_eq!(format_confidence(0.784), "78%");
        assert_eq!(format_confidence(1.0), "100%");
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_confidence(0.95), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.9), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.78), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(0.5), ConfidenceBand::Low);
    }

    #[test]
    fn test_truncate_question() {
        let long = "x".repeat(120);
        let cut = truncate(&long, QUESTION_PREVIEW_CHARS);
        assert_eq!(cut.len(), 103);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn test_current_status_action_disabled() {
        let approved = seed_messages().remove(1);
        let actions = status_actions(&approved, false);
        let approve = actions.iter().find(|a| a.target == MessageStatus::Approved).unwrap();
        assert!(!approve.enabled);
        assert!(actions.iter().filter(|a| a.target != MessageStatus::Approved).all(|a| a.enabled));

        assert!(status_actions(&approved, true).iter().all(|a| !a.enabled));
    }

    #[test]
    fn test_history_versions_are_numbered() {
        let roth = seed_messages().remove(1);
        let versions = history_versions(&roth);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].confidence, "65%");
        assert_eq!(versions[0].created_at, "Apr 23, 2025 2:15 PM");
    }

    #[test]
    fn test_empty_list_text() {
        assert_eq!(empty_list_text(MessageStatus::Later, ""), "No later messages found");
        assert_eq!(empty_list_text(MessageStatus::Later, "roth"), "No messages match your search");
    }
}
