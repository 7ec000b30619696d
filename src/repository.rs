//! Repository seams between the page models and a backend.
//!
//! Two implementations exist: the in-memory mock stores in
//! [`crate::mock_store`] and the REST client in [`crate::http_backend`].
//! Every method is asynchronous and fallible; lists always return the full
//! matching set.
//!
//! Writes are last-writer-wins. A backend shared between auditors would need
//! to compare `updated_at` before applying an update.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{KnowledgeItem, KnowledgeItemUpdate, Message, MessageStatus, NewKnowledgeItem, RefinementInput};

/// Access to messages under review
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Messages owned by `auditor_id`, optionally restricted to one status
    async fn get_messages(&self, auditor_id: &str, status: Option<MessageStatus>) -> Result<Vec<Message>>;

    /// Single message by id. Fails with `NotFound` when absent.
    async fn get_message(&self, id: &str) -> Result<Message>;

    /// Set a message's status and refresh its `updated_at`
    async fn update_message_status(&self, id: &str, status: MessageStatus) -> Result<Message>;

    /// Replace the response using auditor guidance, archiving the old one
    async fn regenerate_response(&self, refinement: &RefinementInput) -> Result<Message>;
}

/// Access to an auditor's knowledge base
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Every item owned by `auditor_id`
    async fn get_knowledge_items(&self, auditor_id: &str) -> Result<Vec<KnowledgeItem>>;

    /// Store a new item; the backend assigns id and timestamps
    async fn add_knowledge_item(&self, item: &NewKnowledgeItem) -> Result<KnowledgeItem>;

    /// Apply a partial update. Fails with `NotFound` when absent.
    async fn update_knowledge_item(&self, id: &str, update: &KnowledgeItemUpdate) -> Result<KnowledgeItem>;

    /// Remove an item
    async fn delete_knowledge_item(&self, id: &str) -> Result<()>;
}
