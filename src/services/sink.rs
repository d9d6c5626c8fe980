// src/services/sink.rs

//! Notification sinks.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Course, Item, Messages, SinkConfig};
use crate::services::format::{Embed, EventKind, WebhookMessage, markdown_description};
use crate::utils::http;

/// Consumer of change events. Delivery is best effort.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Report items new since the previous poll.
    async fn notify_new_items(&self, course: &Course, items: &[Item]) -> Result<()>;

    /// Report items whose deadline has just entered the look-ahead window.
    async fn notify_deadlines(&self, course: &Course, items: &[Item]) -> Result<()>;
}

/// Sink posting embed messages to a chat webhook.
pub struct WebhookSink {
    client: Client,
    webhook_url: String,
    config: SinkConfig,
    messages: Messages,
}

impl WebhookSink {
    pub fn new(webhook_url: impl Into<String>, config: &SinkConfig, messages: &Messages) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config.timeout())?,
            webhook_url: webhook_url.into(),
            config: config.clone(),
            messages: messages.clone(),
        })
    }

    async fn post(&self, kind: EventKind, course: &Course, items: &[Item]) -> Result<()> {
        let embed = Embed::build(
            kind,
            course,
            items,
            &self.messages,
            self.config.max_items,
            self.config.color,
        );
        let message = WebhookMessage {
            content: self.config.mention.clone(),
            embeds: vec![embed],
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::sink(course.id, format!("status {status}: {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Sink for WebhookSink {
    async fn notify_new_items(&self, course: &Course, items: &[Item]) -> Result<()> {
        self.post(EventKind::NewItems, course, items).await
    }

    async fn notify_deadlines(&self, course: &Course, items: &[Item]) -> Result<()> {
        self.post(EventKind::Deadlines, course, items).await
    }
}

/// Sink that only writes events to the log.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    messages: Messages,
}

impl LogSink {
    pub fn new(messages: &Messages) -> Self {
        Self {
            messages: messages.clone(),
        }
    }

    fn log_event(&self, kind: EventKind, course: &Course, items: &[Item]) {
        log::info!(
            "[{}] {} ({})",
            course.name,
            kind.heading(&self.messages, items.len()),
            items.len()
        );
        for item in items {
            log::info!("    {}: {}", item.name, markdown_description(item).trim_end());
        }
    }
}

#[async_trait]
impl Sink for LogSink {
    async fn notify_new_items(&self, course: &Course, items: &[Item]) -> Result<()> {
        self.log_event(EventKind::NewItems, course, items);
        Ok(())
    }

    async fn notify_deadlines(&self, course: &Course, items: &[Item]) -> Result<()> {
        self.log_event(EventKind::Deadlines, course, items);
        Ok(())
    }
}

/// Build the sink described by the configuration.
pub fn sink_from_config(config: &SinkConfig, messages: &Messages) -> Result<Arc<dyn Sink>> {
    match &config.webhook_url {
        Some(url) => Ok(Arc::new(WebhookSink::new(url, config, messages)?)),
        None => {
            log::info!("No webhook configured, notifications are logged only");
            Ok(Arc::new(LogSink::new(messages)))
        }
    }
}
