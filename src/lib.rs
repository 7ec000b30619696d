//! Auditor Dashboard - Review Workflow and Knowledge Base Management
//!
//! A Rust library for auditors who review AI-generated customer responses
//! and curate the reference material those responses draw on.
//!
//! # Features
//!
//! - Tabbed review queue with approve / reject / defer / regenerate actions
//! - Response history kept across regenerations
//! - Knowledge base with file upload, free text entries and inline editing
//! - Dashboard counts, recent activity and quick actions
//! - Mock backend with simulated latency, or a REST backend chosen by config

/// API client facade over the configured backend
pub mod api_client;
/// Application shell and routing
pub mod app;
/// Configuration management
pub mod config;
/// Dashboard aggregation and relative time formatting
pub mod dashboard;
/// Message presentation helpers
pub mod detail;
/// Error types
pub mod error;
/// Seed data for the mock backend
pub mod fixtures;
/// REST backend
pub mod http_backend;
/// Knowledge base page model
pub mod knowledge;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// In-memory mock backend
pub mod mock_store;
/// Data models and structures
pub mod models;
/// Review queue page model
pub mod queue;
/// Regeneration guidance form
pub mod refinement;
/// Repository traits for data access
pub mod repository;
/// Request generation tokens
pub mod request;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use api_client::ApiClient;
pub use app::{App, Route};
pub use config::AppConfig;
pub use error::{DashboardError, Result};
pub use knowledge::KnowledgeBase;
pub use models::{KnowledgeItem, Message, MessageStatus};
pub use queue::MessageQueue;
