//! Pipeline stages of a check cycle.
//!
//! - `TreeDiff`: items present now that were not present before
//! - `DeadlineWindow`: items whose deadline just entered the look-ahead window
//! - `overlay`: merge a fresh tree over a stored one
//! - `PollCoordinator`: one load, fetch, compare, save and notify cycle
//! - `Scheduler`: staggered fixed-rate cycles for every course

pub mod deadline;
pub mod diff;
pub mod merge;
pub mod poll;
pub mod schedule;

pub use deadline::DeadlineWindow;
pub use diff::{TreeDiff, diff};
pub use merge::overlay;
pub use poll::{CycleOutcome, PollCoordinator};
pub use schedule::Scheduler;
