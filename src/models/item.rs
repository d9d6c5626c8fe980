// src/models/item.rs

//! Item tree: a file, assignment, test or folder on a course page.
//!
//! Serialized as nested JSON records:
//!
//! ```json
//! { "name": "Week 1", "type": "folder", "children": [
//!     { "name": "Sheet 1", "type": "task", "url": "https://...",
//!       "deadline": 1760000000000, "lastCheck": 1759990000000 }
//! ] }
//! ```
//!
//! Absent optional fields are omitted. Timestamps are epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind of a folder node.
pub const FOLDER: &str = "folder";

/// Serialized form of [`Deadline::Open`].
const NO_DEADLINE_MILLIS: i64 = -1;

/// Deadline of an item that has a deadline column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// The source lists the item but shows no due date ("-")
    Open,
    /// Absolute due time
    At(DateTime<Utc>),
}

impl Deadline {
    /// The due time, if there is one.
    pub fn due(&self) -> Option<DateTime<Utc>> {
        match self {
            Deadline::Open => None,
            Deadline::At(at) => Some(*at),
        }
    }

    /// Decode from epoch milliseconds. Negative values mean "no deadline".
    pub fn from_millis(millis: i64) -> Option<Self> {
        if millis < 0 {
            return Some(Deadline::Open);
        }
        DateTime::from_timestamp_millis(millis).map(Deadline::At)
    }

    /// Encode as epoch milliseconds.
    pub fn to_millis(&self) -> i64 {
        match self {
            Deadline::Open => NO_DEADLINE_MILLIS,
            Deadline::At(at) => at.timestamp_millis(),
        }
    }
}

impl Serialize for Deadline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_millis())
    }
}

impl<'de> Deserialize<'de> for Deadline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Deadline::from_millis(millis)
            .ok_or_else(|| serde::de::Error::custom(format!("deadline out of range: {millis}")))
    }
}

/// A node of the item tree.
///
/// Equality (`==`) is full equality: local fields plus an order-independent
/// comparison of the children. `last_checked_at` never takes part in equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    /// Display name
    pub name: String,

    /// Item kind, e.g. `folder`, `pdf`, `task`, `test`, `page`
    #[serde(rename = "type")]
    pub kind: String,

    /// Address where the item's content can be retrieved
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Contained items; only meaningful for folders
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Item>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Deadline>,

    /// When the deadline was last observed by a poll
    #[serde(
        rename = "lastCheck",
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Create an empty folder.
    pub fn folder(name: impl Into<String>) -> Self {
        Self::leaf(name, FOLDER)
    }

    /// Create a childless item of the given kind.
    pub fn leaf(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn checked_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_checked_at = Some(at);
        self
    }

    pub fn with_children(mut self, children: Vec<Item>) -> Self {
        self.children = children;
        self
    }

    /// Append a child.
    pub fn push(&mut self, child: Item) {
        self.children.push(child);
    }

    pub fn is_folder(&self) -> bool {
        self.kind == FOLDER
    }

    /// Copy of this node's own fields without children or observation time.
    pub fn identity(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            deadline: self.deadline,
            children: Vec::new(),
            last_checked_at: None,
        }
    }

    /// Equality of the node's own fields, ignoring children and `last_checked_at`.
    ///
    /// This is the matching key of the tree diff.
    pub fn local_eq(&self, other: &Item) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.location == other.location
            && self.description == other.description
            && self.deadline == other.deadline
    }

    /// Local equality plus multiset equality of the children, recursively.
    pub fn full_eq(&self, other: &Item) -> bool {
        if !self.local_eq(other) || self.children.len() != other.children.len() {
            return false;
        }

        let mut unmatched: Vec<&Item> = other.children.iter().collect();
        for child in &self.children {
            match unmatched.iter().position(|o| child.full_eq(o)) {
                Some(pos) => {
                    unmatched.swap_remove(pos);
                }
                None => return false,
            }
        }
        true
    }

    /// Every childless item in depth-first order.
    ///
    /// An empty folder counts as a leaf.
    pub fn leaves(&self) -> Vec<&Item> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Item>) {
        if self.children.is_empty() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }

    /// Total number of nodes, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Item::node_count).sum::<usize>()
    }

    /// Whether only folders carry children, recursively.
    pub fn is_well_formed(&self) -> bool {
        (self.is_folder() || self.children.is_empty())
            && self.children.iter().all(Item::is_well_formed)
    }

    /// Record `now` as the observation time of every item carrying a deadline.
    pub fn stamp_observed(&mut self, now: DateTime<Utc>) {
        if self.deadline.is_some() {
            self.last_checked_at = Some(now);
        }
        for child in &mut self.children {
            child.stamp_observed(now);
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.full_eq(other)
    }
}

impl Eq for Item {}
