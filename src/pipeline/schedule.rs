// src/pipeline/schedule.rs

//! Staggered fixed-rate scheduling of course cycles.
//!
//! A single worker drives every course, so cycles never overlap and storage
//! needs no locking. Course `i` of `N` first fires at `(interval / N) * i`
//! and then every `interval`. A trigger of another course that passes while
//! a cycle is running fires late, as soon as that cycle ends. Triggers the
//! running course itself missed are skipped; it resumes at its next trigger
//! that is still ahead.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::models::Course;
use crate::pipeline::PollCoordinator;

/// Smallest accepted interval.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct Scheduler {
    coordinator: PollCoordinator,
    courses: Vec<Course>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(coordinator: PollCoordinator, courses: Vec<Course>, interval: Duration) -> Self {
        Self {
            coordinator,
            courses,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// First-trigger offset of every course, in course order.
    pub fn timetable(&self) -> Vec<Duration> {
        if self.courses.is_empty() {
            return Vec::new();
        }
        let step = self.interval / self.courses.len() as u32;
        (0..self.courses.len()).map(|i| step * i as u32).collect()
    }

    /// Drive cycles until `shutdown` completes.
    ///
    /// A running cycle is finished before shutdown is observed.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        if self.courses.is_empty() {
            log::warn!("No courses to watch, waiting for shutdown");
            shutdown.await;
            return;
        }

        let start = Instant::now();
        let mut next: Vec<Instant> = self.timetable().into_iter().map(|o| start + o).collect();

        for (course, offset) in self.courses.iter().zip(self.timetable()) {
            log::info!(
                "Watching {} every {}s (first check in {}s)",
                course.name,
                self.interval.as_secs(),
                offset.as_secs()
            );
        }

        loop {
            let Some((idx, &due)) = next.iter().enumerate().min_by_key(|(_, at)| **at) else {
                return;
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Shutting down scheduler");
                    return;
                }
                _ = sleep_until(due) => {}
            }

            let course = &self.courses[idx];
            log::debug!("Triggering check of {}", course.name);
            match self.coordinator.run_cycle(course).await {
                Ok(outcome) => log::debug!("Cycle of {} finished: {:?}", course.name, outcome),
                Err(e) => log::error!("Cycle of {} failed: {}", course.name, e),
            }

            next[idx] = self.advance(due, Instant::now(), course);
        }
    }

    /// Next trigger after `due`, skipping every trigger already behind `now`.
    fn advance(&self, due: Instant, now: Instant, course: &Course) -> Instant {
        let next = due + self.interval;
        if next >= now {
            return next;
        }
        let missed = ((now - next).as_nanos() / self.interval.as_nanos()) as u32 + 1;
        log::warn!(
            "Cycle ran long, skipping {} missed check(s) of {}",
            missed,
            course.name
        );
        next + self.interval * missed
    }
}
