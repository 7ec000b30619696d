//! In-memory mock backend with simulated latency.
//!
//! Stores are plain objects owned by whoever builds them (normally
//! [`crate::api_client::ApiClient`]); each test gets a fresh store instead of
//! resetting shared state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DashboardError, Result};
use crate::fixtures::{seed_knowledge_items, seed_messages};
use crate::models::{
    KnowledgeItem, KnowledgeItemUpdate, Message, MessageHistoryItem, MessageStatus, NewKnowledgeItem, RefinementInput,
};
use crate::repository::{KnowledgeRepository, MessageRepository};

/// Highest confidence the mock regeneration will reach
pub const MAX_REGENERATED_CONFIDENCE: f64 = 0.99;
/// Confidence gained per mock regeneration
pub const REGENERATION_CONFIDENCE_STEP: f64 = 0.05;

/// Artificial delays and failure injection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockBehavior {
    /// Delay for every ordinary call
    pub latency: Duration,
    /// Delay for regeneration calls
    pub regenerate_latency: Duration,
    /// Probability (0.0 to 1.0) that a call fails with a network error
    pub failure_rate: f64,
}

impl MockBehavior {
    /// No delay and no failures, for tests
    #[must_use]
    pub const fn instant() -> Self {
        Self { latency: Duration::ZERO, regenerate_latency: Duration::ZERO, failure_rate: 0.0 }
    }

    async fn simulate(&self, delay: Duration, operation: &str) -> Result<()> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate.min(1.0)) {
            debug!(operation, "Simulated network failure");
            return Err(DashboardError::Network(format!("simulated failure during {operation}")));
        }
        Ok(())
    }
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self { latency: Duration::from_millis(300), regenerate_latency: Duration::from_millis(500), failure_rate: 0.0 }
    }
}

/// Produce the regenerated version of `message`: the current response is
/// archived to history and the guidance is appended to the response.
#[must_use]
pub fn regenerate(message: &Message, guidance: &str, now: DateTime<Utc>) -> Message {
    let snapshot = MessageHistoryItem {
        id: Uuid::new_v4().to_string(),
        message_id: message.id.clone(),
        response: message.response.clone(),
        confidence: message.confidence,
        created_at: message.updated_at,
    };

    let mut updated = message.clone();
    updated.response = format!("{} [Refined based on: {guidance}]", message.response);
    updated.confidence = (message.confidence + REGENERATION_CONFIDENCE_STEP).min(MAX_REGENERATED_CONFIDENCE);
    updated.updated_at = now;
    updated.history.push(snapshot);
    updated
}

/// Mock message backend
#[derive(Debug)]
pub struct MockMessageStore {
    messages: RwLock<Vec<Message>>,
    behavior: MockBehavior,
}

impl MockMessageStore {
    /// Store holding `messages`
    #[must_use]
    pub fn new(messages: Vec<Message>, behavior: MockBehavior) -> Self {
        Self { messages: RwLock::new(messages), behavior }
    }

    /// Store holding the fixture messages
    #[must_use]
    pub fn seeded(behavior: MockBehavior) -> Self {
        Self::new(seed_messages(), behavior)
    }
}

#[async_trait]
impl MessageRepository for MockMessageStore {
    async fn get_messages(&self, auditor_id: &str, status: Option<MessageStatus>) -> Result<Vec<Message>> {
        self.behavior.simulate(self.behavior.latency, "get_messages").await?;

        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.auditor_id == auditor_id)
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect())
    }

    async fn get_message(&self, id: &str) -> Result<Message> {
        self.behavior.simulate(self.behavior.latency, "get_message").await?;

        let messages = self.messages.read().await;
        messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| DashboardError::message_not_found(id))
    }

    async fn update_message_status(&self, id: &str, status: MessageStatus) -> Result<Message> {
        self.behavior.simulate(self.behavior.latency, "update_message_status").await?;

        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DashboardError::message_not_found(id))?;

        message.status = status;
        message.updated_at = Utc::now();
        Ok(message.clone())
    }

    async fn regenerate_response(&self, refinement: &RefinementInput) -> Result<Message> {
        self.behavior.simulate(self.behavior.regenerate_latency, "regenerate_response").await?;

        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == refinement.message_id)
            .ok_or_else(|| DashboardError::message_not_found(&refinement.message_id))?;

        *message = regenerate(message, &refinement.guidance, Utc::now());
        Ok(message.clone())
    }
}

/// Mock knowledge backend
#[derive(Debug)]
pub struct MockKnowledgeStore {
    items: RwLock<Vec<KnowledgeItem>>,
    behavior: MockBehavior,
}

impl MockKnowledgeStore {
    /// Store holding `items`
    #[must_use]
    pub fn new(items: Vec<KnowledgeItem>, behavior: MockBehavior) -> Self {
        Self { items: RwLock::new(items), behavior }
    }

    /// Store holding the fixture items
    #[must_use]
    pub fn seeded(behavior: MockBehavior) -> Self {
        Self::new(seed_knowledge_items(), behavior)
    }
}

#[async_trait]
impl KnowledgeRepository for MockKnowledgeStore {
    async fn get_knowledge_items(&self, auditor_id: &str) -> Result<Vec<KnowledgeItem>> {
        self.behavior.simulate(self.behavior.latency, "get_knowledge_items").await?;

        let items = self.items.read().await;
        Ok(items.iter().filter(|item| item.auditor_id == auditor_id).cloned().collect())
    }

    async fn add_knowledge_item(&self, item: &NewKnowledgeItem) -> Result<KnowledgeItem> {
        self.behavior.simulate(self.behavior.latency, "add_knowledge_item").await?;

        let now = Utc::now();
        let stored = KnowledgeItem {
            id: Uuid::new_v4().to_string(),
            auditor_id: item.auditor_id.clone(),
            item_type: item.item_type,
            content: item.content.clone(),
            filename: item.filename.clone(),
            created_at: now,
            updated_at: now,
        };

        self.items.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn update_knowledge_item(&self, id: &str, update: &KnowledgeItemUpdate) -> Result<KnowledgeItem> {
        self.behavior.simulate(self.behavior.latency, "update_knowledge_item").await?;

        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| DashboardError::knowledge_item_not_found(id))?;

        if let Some(content) = &update.content {
            item.content = content.clone();
        }
        if let Some(filename) = &update.filename {
            item.filename = Some(filename.clone());
        }
        item.updated_at = update.updated_at.unwrap_or_else(Utc::now);
        Ok(item.clone())
    }

    async fn delete_knowledge_item(&self, id: &str) -> Result<()> {
        self.behavior.simulate(self.behavior.latency, "delete_knowledge_item").await?;

        // Deleting an unknown id is a no-op.
        self.items.write().await.retain(|item| item.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DEFAULT_AUDITOR_ID;

    #[tokio::test]
    async fn test_get_messages_filters_by_status() {
        let store = MockMessageStore::seeded(MockBehavior::instant());
        let pending = store.get_messages(DEFAULT_AUDITOR_ID, Some(MessageStatus::Pending)).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1", "5"]);

        let all = store.get_messages(DEFAULT_AUDITOR_ID, None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(store.get_messages("auditor-9", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_message_is_not_found() {
        let store = MockMessageStore::seeded(MockBehavior::instant());
        let err = store.get_message("nope").await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));
        let err = store.update_message_status("nope", MessageStatus::Approved).await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_status_refreshes_timestamp() {
        let store = MockMessageStore::seeded(MockBehavior::instant());
        let before = store.get_message("1").await.unwrap();
        let after = store.update_message_status("1", MessageStatus::Approved).await.unwrap();
        assert_eq!(after.status, MessageStatus::Approved);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(store.get_message("1").await.unwrap().status, MessageStatus::Approved);
    }

    #[test]
    fn test_regenerate_caps_confidence() {
        let mut message = seed_messages().remove(0);
        message.confidence = 0.97;
        let updated = regenerate(&message, "be brief", Utc::now());
        assert!((updated.confidence - 0.99).abs() < f64::EPSILON);
        assert!(updated.response.ends_with("[Refined based on: be brief]"));
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].response, message.response);
        assert_eq!(updated.history[0].created_at, message.updated_at);
    }

    proptest::proptest! {
        #[test]
        fn prop_regenerations_step_confidence_and_grow_history(start in 0.0f64..=1.0, rounds in 1usize..8) {
            let mut message = seed_messages().remove(0);
            message.confidence = start;
            for _ in 0..rounds {
                let previous = message.confidence;
                message = regenerate(&message, "more detail", Utc::now());
                proptest::prop_assert!((message.confidence - (previous + 0.05).min(0.99)).abs() < 1e-9);
                proptest::prop_assert!((message.history.last().map_or(-1.0, |h| h.confidence) - previous).abs() < 1e-9);
            }
            proptest::prop_assert_eq!(message.history.len(), rounds);
            proptest::prop_assert!((message.history[0].confidence - start).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_knowledge_crud() {
        let store = MockKnowledgeStore::seeded(MockBehavior::instant());
        let added = store.add_knowledge_item(&NewKnowledgeItem::text(DEFAULT_AUDITOR_ID, "note")).await.unwrap();
        assert_eq!(added.created_at, added.updated_at);
        assert_eq!(store.get_knowledge_items(DEFAULT_AUDITOR_ID).await.unwrap().len(), 4);

        let updated = store.update_knowledge_item(&added.id, &KnowledgeItemUpdate::content("edited")).await.unwrap();
        assert_eq!(updated.content.as_text(), Some("edited"));
        assert!(updated.updated_at >= added.updated_at);

        let at = added.created_at + chrono::Duration::minutes(5);
        let update = KnowledgeItemUpdate::content("again").edited_at(at);
        assert_eq!(store.update_knowledge_item(&added.id, &update).await.unwrap().updated_at, at);

        store.delete_knowledge_item(&added.id).await.unwrap();
        assert_eq!(store.get_knowledge_items(DEFAULT_AUDITOR_ID).await.unwrap().len(), 3);

        let err = store.update_knowledge_item(&added.id, &KnowledgeItemUpdate::content("x")).await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failure_rate_one_always_fails() {
        let behavior = MockBehavior { failure_rate: 1.0, ..MockBehavior::instant() };
        let store = MockMessageStore::seeded(behavior);
        let err = store.get_messages(DEFAULT_AUDITOR_ID, None).await.unwrap_err();
        assert!(matches!(err, DashboardError::Network(_)));
    }
}
