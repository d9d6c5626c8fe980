// src/pipeline/poll.rs

//! One check cycle of a course.
//!
//! load stored tree → fetch current tree → diff → deadline scan → save → notify.
//!
//! Failures stay inside the cycle: a failed fetch skips the cycle and keeps the
//! stored snapshot, a failed save or delivery is logged and the cycle goes on.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Course, Item};
use crate::pipeline::{DeadlineWindow, TreeDiff};
use crate::services::{Sink, Source};
use crate::storage::SnapshotStore;

/// Summary of one cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// False when the fetch failed and the cycle was skipped
    pub fetched: bool,
    /// Whether the merged snapshot was written
    pub saved: bool,
    /// Number of new leaves reported
    pub new_items: usize,
    /// Number of deadline items reported
    pub deadline_items: usize,
    /// Number of sink deliveries that failed
    pub delivery_failures: usize,
}

/// Drives check cycles for courses.
pub struct PollCoordinator {
    source: Arc<dyn Source>,
    sink: Arc<dyn Sink>,
    store: Arc<dyn SnapshotStore>,
    deadlines: DeadlineWindow,
    diff: TreeDiff,
    fetch_timeout: Duration,
    deliver_timeout: Duration,
}

impl PollCoordinator {
    pub fn new(
        source: Arc<dyn Source>,
        sink: Arc<dyn Sink>,
        store: Arc<dyn SnapshotStore>,
        deadlines: DeadlineWindow,
    ) -> Self {
        Self {
            source,
            sink,
            store,
            deadlines,
            diff: TreeDiff::additions_only(),
            fetch_timeout: Duration::from_secs(30),
            deliver_timeout: Duration::from_secs(30),
        }
    }

    /// Override the bounds for remote calls.
    pub fn with_timeouts(mut self, fetch: Duration, deliver: Duration) -> Self {
        self.fetch_timeout = fetch;
        self.deliver_timeout = deliver;
        self
    }

    /// Run one cycle at the current time.
    pub async fn run_cycle(&self, course: &Course) -> Result<CycleOutcome> {
        self.run_cycle_at(course, Utc::now()).await
    }

    /// Run one cycle, using `now` for the deadline window.
    pub async fn run_cycle_at(&self, course: &Course, now: DateTime<Utc>) -> Result<CycleOutcome> {
        log::info!("Checking {}...", course.name);
        let mut outcome = CycleOutcome::default();

        let previous = self.store.load(course).await?;

        let current = match bounded("fetch", self.fetch_timeout, self.source.fetch(course)).await {
            Ok(tree) => tree,
            Err(e) if e.is_transient() => {
                log::warn!(
                    "Skipping cycle for {}, previous snapshot kept: {}",
                    course.name,
                    e
                );
                return Ok(outcome);
            }
            Err(e) => {
                log::error!("Fetch for {} failed, previous snapshot kept: {}", course.name, e);
                return Ok(outcome);
            }
        };
        outcome.fetched = true;

        let new_items = self.diff.calculate(&current, Some(&previous));
        let due_items = self.deadlines.due_soon(&previous, now);

        match self.store.save(course, current).await {
            Ok(_) => outcome.saved = true,
            Err(e) => log::error!("Failed to save snapshot for {}: {}", course.name, e),
        }

        match new_items {
            Some(tree) => {
                let leaves: Vec<Item> = tree.leaves().into_iter().cloned().collect();
                outcome.new_items = leaves.len();
                let delivery = self.sink.notify_new_items(course, &leaves);
                if let Err(e) = bounded("new items delivery", self.deliver_timeout, delivery).await {
                    log::error!("Failed to deliver new items for {}: {}", course.name, e);
                    outcome.delivery_failures += 1;
                }
            }
            None => log::debug!("No diff for {}", course.name),
        }

        if due_items.is_empty() {
            log::debug!("No new critical deadlines for {}", course.name);
        } else {
            outcome.deadline_items = due_items.len();
            let delivery = self.sink.notify_deadlines(course, &due_items);
            if let Err(e) = bounded("deadline delivery", self.deliver_timeout, delivery).await {
                log::error!("Failed to deliver deadlines for {}: {}", course.name, e);
                outcome.delivery_failures += 1;
            }
        }

        log::info!(
            "Done: {} new items, {} deadline items",
            outcome.new_items,
            outcome.deadline_items
        );
        Ok(outcome)
    }
}

/// Await a remote call, failing with [`AppError::Timeout`] after `limit`.
async fn bounded<T>(
    operation: &str,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(operation, limit.as_secs())),
    }
}
