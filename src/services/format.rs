// src/services/format.rs

//! Notification rendering.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use crate::models::{Course, Deadline, Item, Messages};

/// Zero-width space used as a spacer line between embed fields.
const SPACER: &str = "\u{200b}";

/// Kind of change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NewItems,
    Deadlines,
}

impl EventKind {
    /// Heading for `count` items.
    pub fn heading<'a>(&self, messages: &'a Messages, count: usize) -> &'a str {
        match (self, count == 1) {
            (EventKind::NewItems, true) => &messages.new_item,
            (EventKind::NewItems, false) => &messages.new_items,
            (EventKind::Deadlines, true) => &messages.deadline_item,
            (EventKind::Deadlines, false) => &messages.deadline_items,
        }
    }
}

/// Simple display name for an item kind.
pub fn display_kind(kind: &str) -> &'static str {
    match kind {
        "pdf" | "sourcecode" | "archive" => "File",
        "page" | "url" => "Page",
        "folder" => "Folder",
        "task" => "Assignment",
        "test" => "Test",
        _ => "File",
    }
}

/// Render a deadline as `Weekday, D. M. HH:MM` in the given time zone.
pub fn format_deadline_in<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%A, %-d. %-m. %H:%M").to_string()
}

/// Render a deadline in local time.
pub fn format_deadline(at: DateTime<Utc>) -> String {
    format_deadline_in(at, &Local)
}

/// Markdown body describing one item.
pub fn markdown_description(item: &Item) -> String {
    let mut lines = Vec::new();
    if let Some(url) = &item.location {
        lines.push(format!("[Open {}]({})", display_kind(&item.kind), url));
    }
    if let Some(description) = &item.description {
        lines.push(description.clone());
    }
    if let Some(Deadline::At(at)) = item.deadline {
        lines.push(format!("Due {}", format_deadline(at)));
    }
    lines.push(SPACER.to_string());
    lines.join("\n")
}

/// One listed item of a notification.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Footer {
    pub text: String,
}

/// Rich message describing one event for one course.
#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
    pub footer: Footer,
    pub timestamp: DateTime<Utc>,
    pub fields: Vec<Field>,
}

impl Embed {
    /// Build the embed for `items`, listing at most `max_items` of them.
    pub fn build(
        kind: EventKind,
        course: &Course,
        items: &[Item],
        messages: &Messages,
        max_items: usize,
        color: u32,
    ) -> Self {
        let listed = &items[..items.len().min(max_items)];
        Self {
            title: course.name.clone(),
            url: course.url.clone(),
            description: format!("{}\n{}", kind.heading(messages, listed.len()), SPACER),
            color,
            footer: Footer {
                text: messages.footer.clone(),
            },
            timestamp: Utc::now(),
            fields: listed
                .iter()
                .map(|item| Field {
                    name: item.name.clone(),
                    value: markdown_description(item),
                    inline: false,
                })
                .collect(),
        }
    }
}

/// Webhook message body.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}
