// src/services/source.rs

//! Snapshot sources.
//!
//! A source produces the current item tree of a course on demand. The HTTP
//! source talks to a snapshot service exposing:
//!
//! - `GET {base}/courses/{id}` → `{ "title": "..." }`
//! - `GET {base}/courses/{id}/snapshot` → item tree (its children are used)

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Course, Item, SourceConfig, clean_course_title};
use crate::utils::{endpoint, http};

/// Maximum concurrent name lookups during registration.
const REGISTRATION_CONCURRENCY: usize = 4;

/// Producer of course snapshots.
#[async_trait]
pub trait Source: Send + Sync {
    /// Resolve the display name of a course.
    async fn course_name(&self, course_id: u64) -> Result<String>;

    /// Fetch the current tree of a course, rooted at [`Course::root_folder`].
    ///
    /// Items carrying a deadline have their observation time set to the fetch
    /// time.
    async fn fetch(&self, course: &Course) -> Result<Item>;
}

#[derive(Debug, Deserialize)]
struct CourseInfo {
    title: String,
}

/// Source backed by an HTTP snapshot service.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    /// Create a source from its endpoint configuration.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_source_client(config)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn course_name(&self, course_id: u64) -> Result<String> {
        let url = endpoint(&self.base_url, &format!("courses/{course_id}"))?;
        log::debug!("Fetching {}", url);

        let info: CourseInfo = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let name = clean_course_title(&info.title);
        if name.is_empty() {
            return Err(AppError::source(course_id, "course title is empty"));
        }
        Ok(name)
    }

    async fn fetch(&self, course: &Course) -> Result<Item> {
        let url = endpoint(&self.base_url, &format!("courses/{}/snapshot", course.id))?;
        log::debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::source(course.id, format!("status {status}")));
        }
        let remote: Item = response.json().await?;
        if !remote.is_well_formed() {
            return Err(AppError::source(
                course.id,
                "snapshot has children below a non-folder item",
            ));
        }

        let mut tree = course.root_folder().with_children(remote.children);
        tree.stamp_observed(Utc::now());
        Ok(tree)
    }
}

/// Resolve course names once and build the watched course list.
///
/// A course whose name cannot be resolved is still registered as `Course <id>`.
pub async fn register_courses(
    ids: &[u64],
    source: &dyn Source,
    url_template: &str,
    timeout: Duration,
) -> Vec<Course> {
    stream::iter(ids.iter().copied())
        .map(|id| async move {
            let name = match tokio::time::timeout(timeout, source.course_name(id)).await {
                Ok(Ok(name)) => name,
                Ok(Err(e)) => {
                    log::warn!("Failed to resolve name of course {}: {}", id, e);
                    format!("Course {id}")
                }
                Err(_) => {
                    log::warn!(
                        "Resolving name of course {} timed out after {}s",
                        id,
                        timeout.as_secs()
                    );
                    format!("Course {id}")
                }
            };
            Course::new(id, name, url_template)
        })
        .buffered(REGISTRATION_CONCURRENCY)
        .collect()
        .await
}
