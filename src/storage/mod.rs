//! Snapshot persistence.
//!
//! One keyed JSON document holds the last known item tree of every course:
//!
//! ```text
//! {root}/
//! └── snapshots.json        # { "<course id>": <item tree>, ... }
//! ```
//!
//! The store is accessed from a single worker only. Implementations need no
//! internal locking, and concurrent external mutation of the file is not
//! supported.

pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Course, Item};

// Re-export for convenience
pub use local::LocalStorage;

/// Stored trees keyed by course id.
pub type Snapshots = BTreeMap<String, Item>;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored tree of a course.
    ///
    /// A course seen for the first time gets an empty placeholder folder,
    /// which is persisted before it is returned. Unreadable storage counts
    /// as "no prior snapshot".
    async fn load(&self, course: &Course) -> Result<Item>;

    /// Persist a newly observed tree, merged over the stored one.
    ///
    /// Returns the merged tree that was written. Other courses are untouched.
    async fn save(&self, course: &Course, tree: Item) -> Result<Item>;

    /// All stored trees.
    async fn snapshots(&self) -> Result<Snapshots>;
}
