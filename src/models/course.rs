// src/models/course.rs

//! Course identity.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Item;

/// Leading term tag on page titles, e.g. `(WS)`.
static TERM_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\([A-Z]+\)").expect("static regex"));

/// A watched course.
///
/// Created once at registration; the name is resolved at first contact and
/// kept for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
    /// Course page address derived from the id
    pub url: String,
}

impl Course {
    /// Create a course, deriving its URL from a template containing `{id}`.
    pub fn new(id: u64, name: impl Into<String>, url_template: &str) -> Self {
        Self {
            id,
            name: name.into(),
            url: url_template.replace("{id}", &id.to_string()),
        }
    }

    /// Store key of this course's snapshot.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Root folder carrying the course identity.
    ///
    /// Both the stored placeholder and every fetched tree are rooted here, so
    /// the roots always match locally.
    pub fn root_folder(&self) -> Item {
        Item::folder(&self.name)
            .with_location(&self.url)
            .with_description(self.key())
    }
}

/// Clean a page title into a course name.
///
/// Strips a leading term tag, cuts at the first `:` and decodes `&amp;`.
pub fn clean_course_title(title: &str) -> String {
    let untagged = TERM_TAG.replace(title.trim(), "");
    let title: &str = untagged.as_ref();
    let title = match title.find(':') {
        Some(pos) => &title[..pos],
        None => title,
    };
    title.replace("&amp;", "&").trim().to_string()
}
