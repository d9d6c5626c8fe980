//! Structural diff of two item trees.
//!
//! Children are paired by local equality (name, kind, location, description,
//! deadline). A node whose own fields changed is reported as a whole new
//! subtree; there is no finer diff below it.

use crate::models::Item;

/// Calculator for tree diffs between two snapshots.
#[derive(Debug, Clone, Default)]
pub struct TreeDiff {
    /// Whether items missing from the current tree are reported too
    symmetric: bool,
}

impl TreeDiff {
    /// Diff that reports additions and removals.
    pub fn symmetric() -> Self {
        Self { symmetric: true }
    }

    /// Diff that only reports items new in the current tree.
    pub fn additions_only() -> Self {
        Self { symmetric: false }
    }

    /// Calculate the changed subtree of `current` relative to `previous`.
    ///
    /// Returns `None` when nothing changed. The result is rooted at a copy of
    /// `current` without deadline and holds only the changed children.
    pub fn calculate(&self, current: &Item, previous: Option<&Item>) -> Option<Item> {
        let Some(previous) = previous else {
            return Some(current.clone());
        };
        if !current.local_eq(previous) {
            return Some(current.clone());
        }

        // The result root carries name, kind, location and description only.
        let mut result = current.identity();
        result.deadline = None;
        let mut unmatched: Vec<&Item> = previous.children.iter().collect();

        for child in &current.children {
            // First match wins; each previous child is consumed at most once.
            match unmatched.iter().position(|o| child.local_eq(o)) {
                Some(pos) => {
                    let matched = unmatched.remove(pos);
                    if let Some(inner) = self.calculate(child, Some(matched)) {
                        result.push(inner);
                    }
                }
                None => result.push(child.clone()),
            }
        }

        if self.symmetric {
            result.children.extend(unmatched.into_iter().cloned());
        }

        if result.children.is_empty() {
            None
        } else {
            Some(result)
        }
    }
}

/// Convenience function to calculate a tree diff.
pub fn diff(current: &Item, previous: Option<&Item>, symmetric: bool) -> Option<Item> {
    TreeDiff { symmetric }.calculate(current, previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Deadline;
    use chrono::{TimeZone, Utc};

    fn pdf(name: &str) -> Item {
        Item::leaf(name, "pdf").with_location(format!("https://example.com/{name}"))
    }

    fn sample_tree() -> Item {
        Item::folder("A").with_children(vec![
            Item::folder("resources").with_children(vec![pdf("x.pdf"), pdf("z.pdf")]),
            Item::folder("tasks").with_children(vec![
                Item::leaf("Sheet 1", "task").with_deadline(Deadline::Open),
            ]),
        ])
    }

    fn names(item: &Item) -> Vec<&str> {
        item.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_self_diff_is_empty() {
        let tree = sample_tree();
        assert!(diff(&tree, Some(&tree), false).is_none());
        assert!(diff(&tree, Some(&tree), true).is_none());
    }

    #[test]
    fn test_no_previous_returns_current() {
        let tree = sample_tree();
        assert_eq!(diff(&tree, None, false), Some(tree));
    }

    #[test]
    fn test_new_file_in_folder() {
        let previous = Item::folder("A").with_children(vec![pdf("x.pdf")]);
        let current = Item::folder("A").with_children(vec![pdf("x.pdf"), pdf("y.pdf")]);

        let result = diff(&current, Some(&previous), false).unwrap();
        assert_eq!(result, Item::folder("A").with_children(vec![pdf("y.pdf")]));

        let leaves: Vec<&str> = result.leaves().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(leaves, vec!["y.pdf"]);
    }

    #[test]
    fn test_root_mismatch_returns_current_whole() {
        let previous = sample_tree();
        let mut current = sample_tree();
        current.description = Some("renamed".into());

        let result = diff(&current, Some(&previous), false).unwrap();
        assert!(result.full_eq(&current));
    }

    #[test]
    fn test_changed_child_is_whole_subtree() {
        let previous = sample_tree();
        let mut current = sample_tree();
        current.children[0].name = "Resources".into();

        let result = diff(&current, Some(&previous), false).unwrap();
        assert_eq!(names(&result), vec!["Resources"]);
        assert_eq!(result.children[0].children.len(), 2);
    }

    #[test]
    fn test_nested_diff_keeps_path() {
        let previous = sample_tree();
        let mut current = sample_tree();
        current.children[1].push(Item::leaf("Sheet 2", "task").with_deadline(Deadline::At(
            Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap(),
        )));

        let result = diff(&current, Some(&previous), false).unwrap();
        assert_eq!(names(&result), vec!["tasks"]);
        assert_eq!(names(&result.children[0]), vec!["Sheet 2"]);
        assert!(result.local_eq(&current));
    }

    #[test]
    fn test_result_root_has_no_deadline() {
        let due = Deadline::At(Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap());
        let previous = Item::folder("A")
            .with_location("https://example.com/a")
            .with_deadline(due)
            .with_children(vec![pdf("x.pdf")]);
        let mut current = previous.clone();
        current.push(pdf("y.pdf"));

        let result = diff(&current, Some(&previous), false).unwrap();
        assert_eq!(result.deadline, None);
        assert_eq!(result.location.as_deref(), Some("https://example.com/a"));
        assert_eq!(names(&result), vec!["y.pdf"]);
    }

    #[test]
    fn test_removals_ignored_unless_symmetric() {
        let previous = Item::folder("A").with_children(vec![pdf("x.pdf"), pdf("gone.pdf")]);
        let current = Item::folder("A").with_children(vec![pdf("x.pdf")]);

        assert!(diff(&current, Some(&previous), false).is_none());

        let result = diff(&current, Some(&previous), true).unwrap();
        assert_eq!(names(&result), vec!["gone.pdf"]);
    }

    #[test]
    fn test_duplicates_matched_by_consumption() {
        let previous = Item::folder("A").with_children(vec![pdf("x.pdf")]);
        let current = Item::folder("A").with_children(vec![pdf("x.pdf"), pdf("x.pdf")]);

        let result = diff(&current, Some(&previous), false).unwrap();
        assert_eq!(names(&result), vec!["x.pdf"]);
    }

    #[test]
    fn test_child_order_does_not_matter() {
        let previous = Item::folder("A").with_children(vec![pdf("x.pdf"), pdf("y.pdf")]);
        let current = Item::folder("A").with_children(vec![pdf("y.pdf"), pdf("x.pdf")]);
        assert!(diff(&current, Some(&previous), true).is_none());
    }

    #[test]
    fn test_last_check_change_is_not_a_diff() {
        let at = |h| Utc.with_ymd_and_hms(2026, 10, 14, h, 0, 0).unwrap();
        let task = Item::leaf("Sheet 1", "task").with_deadline(Deadline::At(at(20)));
        let previous = Item::folder("A").with_children(vec![task.clone().checked_at(at(1))]);
        let current = Item::folder("A").with_children(vec![task.checked_at(at(2))]);
        assert!(diff(&current, Some(&previous), false).is_none());
    }

    #[test]
    fn test_inputs_untouched() {
        let previous = Item::folder("A").with_children(vec![pdf("x.pdf")]);
        let current = Item::folder("A").with_children(vec![pdf("y.pdf")]);
        let (prev_copy, curr_copy) = (previous.clone(), current.clone());

        let _ = TreeDiff::symmetric().calculate(&current, Some(&previous));
        assert_eq!(previous, prev_copy);
        assert_eq!(current, curr_copy);
    }
}
