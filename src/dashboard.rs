//! Dashboard aggregation: counts by status, a recent-activity feed and the
//! quick access shortcuts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api_client::ApiClient;
use crate::app::Route;
use crate::detail::truncate;
use crate::error::Result;
use crate::models::{KnowledgeItem, Message, MessageStatus};

const ACTIVITY_SUBJECT_CHARS: usize = 40;

/// Phrase for how long ago `ts` was, relative to `now`, e.g. "2 hours ago".
///
/// Buckets follow the usual humanised thresholds: up to 44 seconds is "a few
/// seconds", up to 89 seconds "a minute", up to 44 minutes "N minutes", up to
/// 89 minutes "an hour", up to 21 hours "N hours", up to 35 hours "a day", up
/// to 25 days "N days", up to 45 days "a month", up to 10 months "N months",
/// up to 17 months "a year", then "N years". Future times read "in ...".
#[must_use]
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(ts);
    let future = delta.num_milliseconds() < 0;
    #[allow(clippy::cast_precision_loss)]
    let secs = delta.num_milliseconds().unsigned_abs() as f64 / 1000.0;

    let phrase = humanize(secs);
    if future {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

fn humanize(secs: f64) -> String {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 3600.0;
    const DAY: f64 = 86_400.0;
    const MONTH_DAYS: f64 = 30.4375;
    const YEAR_DAYS: f64 = 365.25;

    if secs.round() <= 44.0 {
        return "a few seconds".to_string();
    }
    if secs.round() <= 89.0 {
        return "a minute".to_string();
    }
    let minutes = (secs / MINUTE).round();
    if minutes <= 44.0 {
        return format!("{minutes} minutes");
    }
    if minutes <= 89.0 {
        return "an hour".to_string();
    }
    let hours = (secs / HOUR).round();
    if hours <= 21.0 {
        return format!("{hours} hours");
    }
    if hours <= 35.0 {
        return "a day".to_string();
    }
    let days_exact = secs / DAY;
    let days = days_exact.round();
    if days <= 25.0 {
        return format!("{days} days");
    }
    if days <= 45.0 {
        return "a month".to_string();
    }
    let months = (days_exact / MONTH_DAYS).round();
    if months <= 10.0 {
        return format!("{months} months");
    }
    if months <= 17.0 {
        return "a year".to_string();
    }
    let years = (days_exact / YEAR_DAYS).round().max(2.0);
    format!("{years} years")
}

/// Number of messages per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Awaiting review
    pub pending: usize,
    /// Approved
    pub approved: usize,
    /// Rejected
    pub rejected: usize,
    /// Parked for later
    pub later: usize,
}

impl StatusCounts {
    /// Tally `messages` by status
    #[must_use]
    pub fn from_messages(messages: &[Message]) -> Self {
        messages.iter().fold(Self::default(), |mut counts, message| {
            match message.status {
                MessageStatus::Pending => counts.pending += 1,
                MessageStatus::Approved => counts.approved += 1,
                MessageStatus::Rejected => counts.rejected += 1,
                MessageStatus::Later => counts.later += 1,
            }
            counts
        })
    }

    /// Count for one status
    #[must_use]
    pub const fn get(&self, status: MessageStatus) -> usize {
        match status {
            MessageStatus::Pending => self.pending,
            MessageStatus::Approved => self.approved,
            MessageStatus::Rejected => self.rejected,
            MessageStatus::Later => self.later,
        }
    }

    /// Messages across all statuses
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.later
    }
}

/// What an activity entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A message under review
    Message,
    /// A knowledge base item
    Knowledge,
}

/// One line of the recent-activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    /// Stable key for the feed entry
    pub id: String,
    /// Sentence describing what happened
    pub action: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
    /// What the entry points at
    pub kind: ActivityKind,
    /// Id of the message or item
    pub target_id: String,
}

impl ActivityItem {
    /// Page opened when the entry is clicked
    #[must_use]
    pub const fn route(&self) -> Route {
        match self.kind {
            ActivityKind::Message => Route::Messages { tab: MessageStatus::Pending },
            ActivityKind::Knowledge => Route::Knowledge,
        }
    }
}

fn message_activity(message: &Message) -> ActivityItem {
    let subject = truncate(&message.question, ACTIVITY_SUBJECT_CHARS);
    let action = match message.status {
        MessageStatus::Approved => format!("Approved response to \"{subject}\""),
        MessageStatus::Rejected => format!("Rejected response to \"{subject}\""),
        MessageStatus::Later => format!("Marked \"{subject}\" for later"),
        MessageStatus::Pending if !message.history.is_empty() => format!("Regenerated response to \"{subject}\""),
        MessageStatus::Pending => format!("Received \"{subject}\""),
    };
    ActivityItem {
        id: format!("message-{}", message.id),
        action,
        timestamp: message.updated_at,
        kind: ActivityKind::Message,
        target_id: message.id.clone(),
    }
}

fn knowledge_activity(item: &KnowledgeItem) -> ActivityItem {
    let action = if item.updated_at > item.created_at {
        format!("Updated \"{}\" in knowledge base", truncate(item.title(), ACTIVITY_SUBJECT_CHARS))
    } else {
        format!("Added \"{}\" to knowledge base", truncate(item.title(), ACTIVITY_SUBJECT_CHARS))
    };
    ActivityItem {
        id: format!("knowledge-{}", item.id),
        action,
        timestamp: item.updated_at,
        kind: ActivityKind::Knowledge,
        target_id: item.id.clone(),
    }
}

/// The `limit` most recent events across messages and knowledge items,
/// newest first
#[must_use]
pub fn recent_activity(messages: &[Message], items: &[KnowledgeItem], limit: usize) -> Vec<ActivityItem> {
    let mut feed: Vec<ActivityItem> =
        messages.iter().map(message_activity).chain(items.iter().map(knowledge_activity)).collect();
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(limit);
    feed
}

/// Shortcut tile on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    /// Stable key
    pub id: &'static str,
    /// Caption
    pub label: &'static str,
    /// `None` for features that are not available yet
    pub route: Option<Route>,
}

/// The fixed set of quick access tiles
#[must_use]
pub fn quick_actions() -> Vec<QuickAction> {
    vec![
        QuickAction {
            id: "review-pending",
            label: "Review Pending",
            route: Some(Route::Messages { tab: MessageStatus::Pending }),
        },
        QuickAction { id: "upload-document", label: "Upload Document", route: Some(Route::Knowledge) },
        QuickAction { id: "add-knowledge", label: "Add Knowledge", route: Some(Route::Knowledge) },
        QuickAction { id: "view-reports", label: "View Reports", route: None },
    ]
}

/// Route opened by clicking the count for `status`
#[must_use]
pub const fn stat_route(status: MessageStatus) -> Route {
    Route::Messages { tab: status }
}

/// Everything the dashboard page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Messages per status
    pub counts: StatusCounts,
    /// Newest events first
    pub activity: Vec<ActivityItem>,
    /// Shortcut tiles
    pub actions: Vec<QuickAction>,
}

impl DashboardSummary {
    /// Aggregate already-fetched data
    #[must_use]
    pub fn build(messages: &[Message], items: &[KnowledgeItem], activity_limit: usize) -> Self {
        Self {
            counts: StatusCounts::from_messages(messages),
            activity: recent_activity(messages, items, activity_limit),
            actions: quick_actions(),
        }
    }

    /// Fetch an auditor's messages and knowledge items and aggregate them
    pub async fn load(api: &ApiClient, auditor_id: &str, activity_limit: usize) -> Result<Self> {
        let messages = api.get_messages(auditor_id, None).await?;
        let items = api.get_knowledge_items(auditor_id).await?;
        Ok(Self::build(&messages, &items, activity_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{seed_knowledge_items, seed_messages};
    use chrono::Duration;

    fn ago(now: DateTime<Utc>, delta: Duration) -> String {
        relative_time(now - delta, now)
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(ago(now, Duration::seconds(10)), "a few seconds ago");
        assert_eq!(ago(now, Duration::seconds(60)), "a minute ago");
        assert_eq!(ago(now, Duration::minutes(5)), "5 minutes ago");
        assert_eq!(ago(now, Duration::minutes(60)), "an hour ago");
        assert_eq!(ago(now, Duration::hours(2)), "2 hours ago");
        assert_eq!(ago(now, Duration::hours(24)), "a day ago");
        assert_eq!(ago(now, Duration::days(3)), "3 days ago");
        assert_eq!(ago(now, Duration::days(31)), "a month ago");
        assert_eq!(ago(now, Duration::days(120)), "4 months ago");
        assert_eq!(ago(now, Duration::days(400)), "a year ago");
        assert_eq!(ago(now, Duration::days(365 * 3)), "3 years ago");
        assert_eq!(relative_time(now + Duration::hours(3), now), "in 3 hours");
    }

    #[test]
    fn test_status_counts() {
        let counts = StatusCounts::from_messages(&seed_messages());
        assert_eq!(counts, StatusCounts { pending: 2, approved: 1, rejected: 1, later: 1 });
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.get(MessageStatus::Pending), 2);
    }

    #[test]
    fn test_recent_activity_is_newest_first_and_bounded() {
        let feed = recent_activity(&seed_messages(), &seed_knowledge_items(), 4);
        assert_eq!(feed.len(), 4);
        assert!(feed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(feed[0].target_id, "4");
        assert_eq!(feed[0].kind, ActivityKind::Knowledge);
        assert_eq!(feed[1].action, "Approved response to \"Should I convert my traditional IRA to a...\"");
    }

    #[test]
    fn test_activity_routes() {
        let feed = recent_activity(&seed_messages(), &seed_knowledge_items(), 10);
        let knowledge = feed.iter().find(|a| a.kind == ActivityKind::Knowledge).unwrap();
        assert_eq!(knowledge.route(), Route::Knowledge);
        let message = feed.iter().find(|a| a.kind == ActivityKind::Message).unwrap();
        assert!(matches!(message.route(), Route::Messages { .. }));
    }

    #[test]
    fn test_quick_actions() {
        let actions = quick_actions();
        assert_eq!(actions.len(), 4);
        assert!(actions.iter().find(|a| a.label == "View Reports").unwrap().route.is_none());
    }
}
