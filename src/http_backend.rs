//! REST backend for deployments with a real review service.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::models::{KnowledgeItem, KnowledgeItemUpdate, Message, MessageStatus, NewKnowledgeItem, RefinementInput};
use crate::repository::{KnowledgeRepository, MessageRepository};

#[derive(Serialize)]
struct StatusUpdateBody {
    status: MessageStatus,
}

/// JSON-over-HTTP implementation of both repositories
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).pool_max_idle_per_host(8).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, url = %url, "Backend request");
        self.client.request(method, url)
    }

    /// Send and map the status code into the error taxonomy
    async fn send(&self, builder: RequestBuilder, entity: &'static str, id: Option<&str>) -> Result<Response> {
        let resp = builder.send().await.map_err(|e| DashboardError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(DashboardError::NotFound { entity, id: id.to_string() });
            }
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, body = %text, "Backend returned an error");
            return Err(DashboardError::Network(format!("API error: {status} {text}")));
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(
        &self, builder: RequestBuilder, entity: &'static str, id: Option<&str>,
    ) -> Result<T> {
        let resp = self.send(builder, entity, id).await?;
        resp.json::<T>().await.map_err(|e| DashboardError::Network(format!("Invalid response body: {e}")))
    }
}

#[async_trait]
impl MessageRepository for HttpBackend {
    async fn get_messages(&self, auditor_id: &str, status: Option<MessageStatus>) -> Result<Vec<Message>> {
        let mut query = vec![("auditorId", auditor_id.to_string())];
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        let builder = self.request(Method::GET, "/messages").query(&query);
        self.json(builder, "Message", None).await
    }

    async fn get_message(&self, id: &str) -> Result<Message> {
        let builder = self.request(Method::GET, &format!("/messages/{id}"));
        self.json(builder, "Message", Some(id)).await
    }

    async fn update_message_status(&self, id: &str, status: MessageStatus) -> Result<Message> {
        let builder = self.request(Method::PATCH, &format!("/messages/{id}/status")).json(&StatusUpdateBody { status });
        self.json(builder, "Message", Some(id)).await
    }

    async fn regenerate_response(&self, refinement: &RefinementInput) -> Result<Message> {
        let id = refinement.message_id.as_str();
        let builder = self.request(Method::POST, &format!("/messages/{id}/regenerate")).json(refinement);
        self.json(builder, "Message", Some(id)).await
    }
}

#[async_trait]
impl KnowledgeRepository for HttpBackend {
    async fn get_knowledge_items(&self, auditor_id: &str) -> Result<Vec<KnowledgeItem>> {
        let builder = self.request(Method::GET, "/knowledge-items").query(&[("auditorId", auditor_id)]);
        self.json(builder, "Knowledge item", None).await
    }

    async fn add_knowledge_item(&self, item: &NewKnowledgeItem) -> Result<KnowledgeItem> {
        let builder = self.request(Method::POST, "/knowledge-items").json(item);
        self.json(builder, "Knowledge item", None).await
    }

    async fn update_knowledge_item(&self, id: &str, update: &KnowledgeItemUpdate) -> Result<KnowledgeItem> {
        let builder = self.request(Method::PATCH, &format!("/knowledge-items/{id}")).json(update);
        self.json(builder, "Knowledge item", Some(id)).await
    }

    async fn delete_knowledge_item(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/knowledge-items/{id}"));
        self.send(builder, "Knowledge item", Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let backend = HttpBackend::new("https://api.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.endpoint("/messages/1"), "https://api.example.com/messages/1");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_failure() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = backend.get_messages("auditor-1", None).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NetworkFailure);
    }
}
