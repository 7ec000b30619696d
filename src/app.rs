//! Application shell: owns the API client for the life of the process and
//! builds a page model for each route.

use serde::Serialize;
use tracing::info;

use crate::api_client::ApiClient;
use crate::config::AppConfig;
use crate::dashboard::DashboardSummary;
use crate::error::Result;
use crate::knowledge::{KnowledgeBase, UploadPolicy};
use crate::models::MessageStatus;
use crate::queue::MessageQueue;

/// Top-level pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum Route {
    /// Counts, activity and shortcuts
    #[default]
    Dashboard,
    /// Knowledge base
    Knowledge,
    /// Review queue opened on `tab`
    Messages { tab: MessageStatus },
}

impl Route {
    /// URL path of the page
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Knowledge => "/knowledge",
            Self::Messages { .. } => "/messages",
        }
    }
}

/// A page model built for a route
#[derive(Debug)]
pub enum Page {
    /// Loaded dashboard summary
    Dashboard(DashboardSummary),
    /// Knowledge base with items fetched
    Knowledge(KnowledgeBase),
    /// Review queue on the requested tab
    Messages(MessageQueue),
}

/// The application root
#[derive(Debug, Clone)]
pub struct App {
    client: ApiClient,
    config: AppConfig,
    route: Route,
}

impl App {
    /// Compose the app from configuration; the backend is picked here once
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let client = ApiClient::from_config(&config)?;
        Ok(Self::new(client, config))
    }

    /// App over an existing client
    #[must_use]
    pub fn new(client: ApiClient, config: AppConfig) -> Self {
        Self { client, config, route: Route::default() }
    }

    /// Shared API client
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Auditor the pages are built for
    #[must_use]
    pub fn auditor_id(&self) -> &str {
        &self.config.auditor.id
    }

    /// Current page
    #[must_use]
    pub const fn route(&self) -> Route {
        self.route
    }

    /// Dashboard data for the configured auditor
    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        DashboardSummary::load(&self.client, self.auditor_id(), self.config.dashboard.recent_activity_limit).await
    }

    /// Review queue opened on `tab`
    pub async fn messages(&self, tab: MessageStatus) -> MessageQueue {
        let queue = MessageQueue::new(self.client.clone(), self.auditor_id());
        queue.select_tab(tab).await;
        queue
    }

    /// Knowledge base page with items loaded
    pub async fn knowledge(&self) -> KnowledgeBase {
        let policy = UploadPolicy::from_config(&self.config.knowledge);
        KnowledgeBase::open(self.client.clone(), self.auditor_id(), policy).await
    }

    /// Switch to `route` and build its page
    pub async fn navigate(&mut self, route: Route) -> Result<Page> {
        info!(path = route.path(), "Navigating");
        self.route = route;
        Ok(match route {
            Route::Dashboard => Page::Dashboard(self.dashboard().await?),
            Route::Knowledge => Page::Knowledge(self.knowledge().await),
            Route::Messages { tab } => Page::Messages(self.messages(tab).await),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_store::MockBehavior;

    fn app() -> App {
        App::new(ApiClient::mock(MockBehavior::instant()), AppConfig::default())
    }

    #[tokio::test]
    async fn test_navigate_to_messages_tab() {
        let mut app = app();
        let page = app.navigate(Route::Messages { tab: MessageStatus::Later }).await.unwrap();
        let Page::Messages(queue) = page else { panic!("expected messages page") };
        let state = queue.state().await;
        assert_eq!(state.active_tab(), MessageStatus::Later);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(app.route().path(), "/messages");
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let summary = app().dashboard().await.unwrap();
        assert_eq!(summary.counts.total(), 5);
        assert_eq!(summary.activity.len(), 4);
    }
}
