//! API client facade used by every page model.
//!
//! The backend (mock stores or REST) is chosen once, when the client is
//! composed; individual calls never branch on it.

use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{DashboardError, Result};
use crate::http_backend::HttpBackend;
use crate::logging::OperationTimer;
use crate::metrics::{ApiMetrics, MetricsTimer};
use crate::mock_store::{MockBehavior, MockKnowledgeStore, MockMessageStore};
use crate::models::{KnowledgeItem, KnowledgeItemUpdate, Message, MessageStatus, NewKnowledgeItem, RefinementInput};
use crate::repository::{KnowledgeRepository, MessageRepository};
use crate::validation::InputValidator;

/// Which backend a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-memory mock stores
    Mock,
    /// REST service
    Http,
}

/// Cheaply cloneable handle to the message and knowledge backends
#[derive(Clone)]
pub struct ApiClient {
    messages: Arc<dyn MessageRepository>,
    knowledge: Arc<dyn KnowledgeRepository>,
    metrics: Arc<ApiMetrics>,
    backend: BackendKind,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("backend", &self.backend).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client over arbitrary repositories
    pub fn new(messages: Arc<dyn MessageRepository>, knowledge: Arc<dyn KnowledgeRepository>) -> Self {
        Self { messages, knowledge, metrics: Arc::new(ApiMetrics::new()), backend: BackendKind::Mock }
    }

    /// Client over freshly seeded mock stores
    #[must_use]
    pub fn mock(behavior: MockBehavior) -> Self {
        Self::new(
            Arc::new(MockMessageStore::seeded(behavior)),
            Arc::new(MockKnowledgeStore::seeded(behavior)),
        )
    }

    /// Compose the client the configuration asks for
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.api.use_mock {
            info!(latency_ms = config.mock.latency_ms, "Using mock backend");
            return Ok(Self::mock(config.mock_behavior()));
        }

        info!(base_url = %config.api.base_url, "Using HTTP backend");
        let backend = Arc::new(HttpBackend::new(&config.api.base_url, config.request_timeout())?);
        let mut client = Self::new(backend.clone(), backend);
        client.backend = BackendKind::Http;
        Ok(client)
    }

    /// Backend in use
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Call statistics
    #[must_use]
    pub fn metrics(&self) -> &ApiMetrics {
        &self.metrics
    }

    /// Run a backend call with timing, metrics and failure logging
    async fn observe<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let metrics_timer = MetricsTimer::new(&self.metrics, operation);
        let timer = OperationTimer::new(operation);
        let result = call.await;

        if let Err(e) = &result {
            warn!(operation, kind = e.kind().as_str(), error = %e, "API call failed");
        }
        metrics_timer.finish(result.as_ref().err().map(DashboardError::kind));
        timer.finish();
        result
    }

    fn reject<T>(&self, operation: &'static str, err: DashboardError) -> Result<T> {
        self.metrics.record_rejection(operation);
        Err(err)
    }

    /// Messages for an auditor, optionally one status only
    pub async fn get_messages(&self, auditor_id: &str, status: Option<MessageStatus>) -> Result<Vec<Message>> {
        if let Err(e) = InputValidator::validate_id(auditor_id) {
            return self.reject("get_messages", e);
        }
        self.observe("get_messages", self.messages.get_messages(auditor_id, status)).await
    }

    /// One message with its history
    pub async fn get_message(&self, id: &str) -> Result<Message> {
        if let Err(e) = InputValidator::validate_id(id) {
            return self.reject("get_message", e);
        }
        self.observe("get_message", self.messages.get_message(id)).await
    }

    /// Change a message's status
    pub async fn update_message_status(&self, id: &str, status: MessageStatus) -> Result<Message> {
        if let Err(e) = InputValidator::validate_id(id) {
            return self.reject("update_message_status", e);
        }
        self.observe("update_message_status", self.messages.update_message_status(id, status)).await
    }

    /// Regenerate a response. Guidance is trimmed; blank guidance is
    /// rejected without calling the backend.
    pub async fn regenerate_response(&self, refinement: &RefinementInput) -> Result<Message> {
        let checked = InputValidator::validate_id(&refinement.message_id)
            .and_then(|()| InputValidator::validate_guidance(&refinement.guidance));
        let guidance = match checked {
            Ok(guidance) => guidance,
            Err(e) => return self.reject("regenerate_response", e),
        };

        let request = RefinementInput { message_id: refinement.message_id.clone(), guidance };
        self.observe("regenerate_response", self.messages.regenerate_response(&request)).await
    }

    /// Knowledge items for an auditor
    pub async fn get_knowledge_items(&self, auditor_id: &str) -> Result<Vec<KnowledgeItem>> {
        if let Err(e) = InputValidator::validate_id(auditor_id) {
            return self.reject("get_knowledge_items", e);
        }
        self.observe("get_knowledge_items", self.knowledge.get_knowledge_items(auditor_id)).await
    }

    /// Store a new knowledge item
    pub async fn add_knowledge_item(&self, item: &NewKnowledgeItem) -> Result<KnowledgeItem> {
        if let Err(e) = InputValidator::validate_id(&item.auditor_id) {
            return self.reject("add_knowledge_item", e);
        }
        self.observe("add_knowledge_item", self.knowledge.add_knowledge_item(item)).await
    }

    /// Update fields of a knowledge item
    pub async fn update_knowledge_item(&self, id: &str, update: &KnowledgeItemUpdate) -> Result<KnowledgeItem> {
        if let Err(e) = InputValidator::validate_id(id) {
            return self.reject("update_knowledge_item", e);
        }
        self.observe("update_knowledge_item", self.knowledge.update_knowledge_item(id, update)).await
    }

    /// Remove a knowledge item
    pub async fn delete_knowledge_item(&self, id: &str) -> Result<()> {
        if let Err(e) = InputValidator::validate_id(id) {
            return self.reject("delete_knowledge_item", e);
        }
        self.observe("delete_knowledge_item", self.knowledge.delete_knowledge_item(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_guidance_never_reaches_backend() {
        let client = ApiClient::mock(MockBehavior::instant());
        let refinement = RefinementInput { message_id: "1".into(), guidance: "   ".into() };
        let err = client.regenerate_response(&refinement).await.unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        assert_eq!(client.metrics().calls_total(), 0);
        assert_eq!(client.metrics().rejections_total(), 1);
    }

    #[tokio::test]
    async fn test_guidance_is_trimmed_before_sending() {
        let client = ApiClient::mock(MockBehavior::instant());
        let refinement = RefinementInput { message_id: "1".into(), guidance: "  add sources \n".into() };
        let updated = client.regenerate_response(&refinement).await.unwrap();
        assert!(updated.response.ends_with("[Refined based on: add sources]"));
        assert_eq!(client.metrics().calls_total(), 1);
    }

    #[test]
    fn test_from_config_selects_backend() {
        let mut config = AppConfig::default();
        assert_eq!(ApiClient::from_config(&config).unwrap().backend(), BackendKind::Mock);
        config.api.use_mock = false;
        assert_eq!(ApiClient::from_config(&config).unwrap().backend(), BackendKind::Http);
    }
}
