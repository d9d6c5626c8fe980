//! Non-destructive snapshot merge.
//!
//! The newly observed tree always wins. The old tree only fills gaps:
//! optional fields the new tree lacks, and the children of nodes that came
//! back empty. Children that are present in the new tree are authoritative
//! for their level. Each is paired with an old child and the pair is merged
//! recursively: a locally equal old child is preferred, otherwise the first
//! old child with the same name and kind. Paired old children are consumed.

use crate::models::Item;

/// Overlay `old` into the gaps of `new`.
pub fn overlay(mut new: Item, old: &Item) -> Item {
    if new.location.is_none() {
        new.location = old.location.clone();
    }
    if new.description.is_none() {
        new.description = old.description.clone();
    }
    if new.deadline.is_none() {
        new.deadline = old.deadline;
    }
    if new.last_checked_at.is_none() {
        new.last_checked_at = old.last_checked_at;
    }

    if new.children.is_empty() {
        new.children = old.children.clone();
        return new;
    }

    let mut unmatched: Vec<&Item> = old.children.iter().collect();
    new.children = new
        .children
        .into_iter()
        .map(|child| match pair_position(&child, &unmatched) {
            Some(pos) => {
                let matched = unmatched.remove(pos);
                overlay(child, matched)
            }
            None => child,
        })
        .collect();

    new
}

/// Position of the old child to merge `child` with.
fn pair_position(child: &Item, candidates: &[&Item]) -> Option<usize> {
    candidates
        .iter()
        .position(|o| child.local_eq(o))
        .or_else(|| {
            candidates
                .iter()
                .position(|o| o.name == child.name && o.kind == child.kind)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Deadline;
    use chrono::{TimeZone, Utc};

    fn pdf(name: &str) -> Item {
        Item::leaf(name, "pdf")
    }

    #[test]
    fn test_new_fields_win() {
        let old = Item::folder("A").with_description("old");
        let new = Item::folder("A").with_description("new");
        assert_eq!(overlay(new, &old).description.as_deref(), Some("new"));
    }

    #[test]
    fn test_missing_fields_filled_from_old() {
        let at = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
        let old = Item::leaf("Sheet 1", "task")
            .with_location("https://example.com/1")
            .with_deadline(Deadline::Open)
            .checked_at(at);
        let new = Item::leaf("Sheet 1", "task");

        let merged = overlay(new, &old);
        assert_eq!(merged.location.as_deref(), Some("https://example.com/1"));
        assert_eq!(merged.deadline, Some(Deadline::Open));
        assert_eq!(merged.last_checked_at, Some(at));
    }

    #[test]
    fn test_nested_fields_filled_from_old() {
        let due = Utc.with_ymd_and_hms(2026, 10, 20, 23, 59, 0).unwrap();
        let old = Item::folder("A").with_children(vec![Item::folder("tasks").with_children(vec![
            Item::leaf("Sheet 1", "task")
                .with_location("https://example.com/1")
                .with_deadline(Deadline::At(due)),
        ])]);
        // Partial response: the task came back without url and deadline.
        let new = Item::folder("A").with_children(vec![
            Item::folder("tasks").with_children(vec![Item::leaf("Sheet 1", "task")]),
        ]);

        let merged = overlay(new, &old);
        let sheet = &merged.children[0].children[0];
        assert_eq!(sheet.location.as_deref(), Some("https://example.com/1"));
        assert_eq!(sheet.deadline, Some(Deadline::At(due)));
    }

    #[test]
    fn test_exact_match_preferred_over_name_match() {
        let t1 = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();
        let old = Item::folder("A").with_children(vec![
            pdf("x.pdf").with_description("first").checked_at(t1),
            pdf("x.pdf").with_description("second").checked_at(t2),
        ]);
        let new = Item::folder("A").with_children(vec![
            pdf("x.pdf").with_description("second"),
            pdf("x.pdf"),
        ]);

        let merged = overlay(new, &old);
        assert_eq!(merged.children[0].last_checked_at, Some(t2));
        assert_eq!(merged.children[1].description.as_deref(), Some("first"));
        assert_eq!(merged.children[1].last_checked_at, Some(t1));
    }

    #[test]
    fn test_kind_change_is_not_paired() {
        let old = Item::folder("A")
            .with_children(vec![pdf("notes").with_location("https://example.com/notes")]);
        let new = Item::folder("A").with_children(vec![Item::leaf("notes", "page")]);

        let merged = overlay(new, &old);
        assert!(merged.children[0].location.is_none());
    }

    #[test]
    fn test_empty_folder_keeps_old_children() {
        let old = Item::folder("A").with_children(vec![
            Item::folder("resources").with_children(vec![pdf("x.pdf"), pdf("y.pdf")]),
            Item::folder("tasks"),
        ]);
        // Resources page was unavailable this time.
        let new = Item::folder("A").with_children(vec![
            Item::folder("resources"),
            Item::folder("tasks").with_children(vec![Item::leaf("Sheet 1", "task")]),
        ]);

        let merged = overlay(new, &old);
        assert_eq!(merged.children[0].children.len(), 2);
        assert_eq!(merged.children[1].children[0].name, "Sheet 1");
    }

    #[test]
    fn test_whole_tree_kept_when_new_is_empty() {
        let old = Item::folder("A").with_children(vec![pdf("x.pdf")]);
        let merged = overlay(Item::folder("A"), &old);
        assert_eq!(merged, old);
    }

    #[test]
    fn test_present_children_are_authoritative() {
        let old = Item::folder("A").with_children(vec![pdf("x.pdf"), pdf("gone.pdf")]);
        let new = Item::folder("A").with_children(vec![pdf("x.pdf"), pdf("y.pdf")]);

        let merged = overlay(new.clone(), &old);
        assert_eq!(merged, new);
    }

    #[test]
    fn test_old_never_overrides_children() {
        let old = Item::folder("A").with_children(vec![pdf("x.pdf")]);
        let new = Item::folder("A").with_children(vec![pdf("y.pdf")]);
        let merged = overlay(new, &old);
        assert_eq!(merged.children.len(), 1);
        assert_eq!(merged.children[0].name, "y.pdf");
    }
}
