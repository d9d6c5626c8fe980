//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Upper bound for `watch.interval_secs` and `watch.deadline_window_secs`.
pub const MAX_PERIOD_SECS: u64 = 366 * 24 * 60 * 60;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Courses and polling cadence
    #[serde(default)]
    pub watch: WatchConfig,

    /// Snapshot store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Where snapshots are fetched from
    #[serde(default)]
    pub source: SourceConfig,

    /// Where notifications are delivered
    #[serde(default)]
    pub sink: SinkConfig,

    /// Notification wording
    #[serde(default)]
    pub messages: Messages,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watch.courses.is_empty() {
            return Err(AppError::validation("No courses configured"));
        }
        if self.watch.interval_secs == 0 {
            return Err(AppError::validation("watch.interval_secs must be > 0"));
        }
        if self.watch.interval_secs > MAX_PERIOD_SECS {
            return Err(AppError::validation(format!(
                "watch.interval_secs must be <= {MAX_PERIOD_SECS}"
            )));
        }
        if self.watch.deadline_window_secs == 0 {
            return Err(AppError::validation(
                "watch.deadline_window_secs must be > 0",
            ));
        }
        if self.watch.deadline_window_secs > MAX_PERIOD_SECS {
            return Err(AppError::validation(format!(
                "watch.deadline_window_secs must be <= {MAX_PERIOD_SECS}"
            )));
        }
        if !self.watch.course_url_template.contains("{id}") {
            return Err(AppError::validation(
                "watch.course_url_template must contain {id}",
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        check_http_url("source.base_url", &self.source.base_url)?;
        if self.sink.timeout_secs == 0 {
            return Err(AppError::validation("sink.timeout_secs must be > 0"));
        }
        if self.sink.max_items == 0 {
            return Err(AppError::validation("sink.max_items must be > 0"));
        }
        if let Some(webhook) = &self.sink.webhook_url {
            check_http_url("sink.webhook_url", webhook)?;
        }
        if self.storage.file.trim().is_empty() {
            return Err(AppError::validation("storage.file is empty"));
        }
        Ok(())
    }
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| AppError::validation(format!("{field} is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::validation(format!(
            "{field} must use http or https, got {other}"
        ))),
    }
}

/// Watched courses and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Course ids to poll
    #[serde(default)]
    pub courses: Vec<u64>,

    /// Seconds between two checks of the same course
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Look-ahead window for upcoming deadlines, in seconds
    #[serde(default = "defaults::deadline_window")]
    pub deadline_window_secs: u64,

    /// Course page URL, `{id}` is replaced by the course id
    #[serde(default = "defaults::course_url_template")]
    pub course_url_template: String,
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Look-ahead window, saturating at the largest representable duration.
    pub fn deadline_window(&self) -> chrono::Duration {
        i64::try_from(self.deadline_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            courses: Vec::new(),
            interval_secs: defaults::interval(),
            deadline_window_secs: defaults::deadline_window(),
            course_url_template: defaults::course_url_template(),
        }
    }
}

/// Snapshot store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the snapshot file
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,

    /// Snapshot file name inside `dir`
    #[serde(default = "defaults::storage_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
            file: defaults::storage_file(),
        }
    }
}

/// Snapshot source endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the snapshot service
    #[serde(default = "defaults::source_base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Session cookie sent verbatim with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::source_base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            session_cookie: None,
        }
    }
}

/// Notification sink endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Chat webhook; notifications are only logged when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Delivery timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Mention prepended to every message, e.g. `<@&1234>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention: Option<String>,

    /// Maximum number of items listed in one message
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,

    /// Embed accent color
    #[serde(default = "defaults::color")]
    pub color: u32,
}

impl SinkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: defaults::timeout(),
            mention: None,
            max_items: defaults::max_items(),
            color: defaults::color(),
        }
    }
}

/// Notification message strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default = "defaults::msg_new_item")]
    pub new_item: String,
    #[serde(default = "defaults::msg_new_items")]
    pub new_items: String,
    #[serde(default = "defaults::msg_deadline_item")]
    pub deadline_item: String,
    #[serde(default = "defaults::msg_deadline_items")]
    pub deadline_items: String,
    #[serde(default = "defaults::msg_footer")]
    pub footer: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            new_item: defaults::msg_new_item(),
            new_items: defaults::msg_new_items(),
            deadline_item: defaults::msg_deadline_item(),
            deadline_items: defaults::msg_deadline_items(),
            footer: defaults::msg_footer(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Watch defaults
    pub fn interval() -> u64 {
        300
    }
    pub fn deadline_window() -> u64 {
        16 * 60 * 60
    }
    pub fn course_url_template() -> String {
        "https://moodle.rwth-aachen.de/course/view.php?id={id}".into()
    }

    // Storage defaults
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn storage_file() -> String {
        "snapshots.json".into()
    }

    // HTTP defaults
    pub fn source_base_url() -> String {
        "http://localhost:8080".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; coursewatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Sink defaults
    pub fn max_items() -> usize {
        25
    }
    pub fn color() -> u32 {
        0xf47f22
    }

    // Message defaults
    pub fn msg_new_item() -> String {
        "A new item was uploaded:".into()
    }
    pub fn msg_new_items() -> String {
        "New items were uploaded:".into()
    }
    pub fn msg_deadline_item() -> String {
        "Submission closes soon:".into()
    }
    pub fn msg_deadline_items() -> String {
        "Submissions close soon:".into()
    }
    pub fn msg_footer() -> String {
        "Course updates".into()
    }
}
