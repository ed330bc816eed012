//! Read-only diagnostics over rows and built trees.
//!
//! Nothing here alters a tree or fails a build; findings are advisory.

use std::collections::{BTreeSet, HashMap, HashSet};

use itertools::Itertools;

use crate::domain::entities::{BuildWarning, Node, Row};
use crate::domain::normalize::{lookup_key, Normalizer};

pub const PLACEHOLDER_NAME: &str = "unknown";

/// Child and subchild values that never pair with a valid level above them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DanglingReferences {
    pub dangling_children: BTreeSet<String>,
    pub dangling_subchildren: BTreeSet<String>,
}

impl DanglingReferences {
    pub fn is_empty(&self) -> bool {
        self.dangling_children.is_empty() && self.dangling_subchildren.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = BuildWarning> + '_ {
        let children = self
            .dangling_children
            .iter()
            .map(|name| BuildWarning::DanglingChild { name: name.clone() });
        let subchildren = self
            .dangling_subchildren
            .iter()
            .map(|name| BuildWarning::DanglingSubchild { name: name.clone() });
        children.chain(subchildren)
    }
}

/// Tracks, per lookup key, the first-seen display text and whether any row
/// paired the value with a known upper level.
#[derive(Default)]
struct Pairing {
    seen: HashMap<String, (String, bool)>,
}

impl Pairing {
    fn record(&mut self, value: &str, paired: bool) {
        let entry = self
            .seen
            .entry(lookup_key(value))
            .or_insert_with(|| (value.to_string(), false));
        entry.1 |= paired;
    }

    fn keys(&self) -> HashSet<String> {
        self.seen.keys().cloned().collect()
    }

    fn unpaired(&self) -> BTreeSet<String> {
        self.seen
            .values()
            .filter(|(_, paired)| !paired)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Find child values never paired with a present, known parent and subchild
/// values never paired with a present, known child.
pub fn find_dangling_references(rows: &[Row], normalizer: &Normalizer) -> DanglingReferences {
    let rows = normalizer.normalize_hierarchy_fields(rows);

    let parents: HashSet<String> = rows
        .iter()
        .filter_map(|r| r.parent.as_deref().map(lookup_key))
        .collect();

    let mut children = Pairing::default();
    for row in &rows {
        if let Some(child) = row.child.as_deref() {
            let paired = row
                .parent
                .as_deref()
                .is_some_and(|p| parents.contains(&lookup_key(p)));
            children.record(child, paired);
        }
    }

    let child_keys = children.keys();
    let mut subchildren = Pairing::default();
    for row in &rows {
        if let Some(subchild) = row.subchild.as_deref() {
            let paired = row
                .child
                .as_deref()
                .is_some_and(|c| child_keys.contains(&lookup_key(c)));
            subchildren.record(subchild, paired);
        }
    }

    DanglingReferences {
        dangling_children: children.unpaired(),
        dangling_subchildren: subchildren.unpaired(),
    }
}

/// True if any node is still named like the placeholder.
pub fn contains_placeholder(node: &Node) -> bool {
    node.name.trim().eq_ignore_ascii_case(PLACEHOLDER_NAME)
        || node.children.iter().any(contains_placeholder)
}

/// Category and resource sharing a lookup key under one parent.
///
/// Categories merge by name and resources are always fresh leaves, so a row
/// that files a resource directly under a parent and another row that uses
/// the same name as a child level leave both siblings in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    /// Slash-joined names from the first level below the root to the parent
    pub path: String,
    /// Display name of the category
    pub name: String,
}

impl From<&NameCollision> for BuildWarning {
    fn from(c: &NameCollision) -> Self {
        BuildWarning::NameCollision {
            path: c.path.clone(),
            name: c.name.clone(),
        }
    }
}

/// Every parent whose categories collide with a resource sibling, in tree order.
pub fn find_name_collisions(root: &Node) -> Vec<NameCollision> {
    fn walk(node: &Node, path: &mut Vec<String>, found: &mut Vec<NameCollision>) {
        let resources: HashSet<String> = node
            .children
            .iter()
            .filter(|c| c.is_resource())
            .map(|c| lookup_key(&c.name))
            .collect();
        for child in node.children.iter().filter(|c| !c.is_resource()) {
            if resources.contains(&lookup_key(&child.name)) {
                found.push(NameCollision {
                    path: path.join("/"),
                    name: child.name.clone(),
                });
            }
        }
        for child in node.children.iter().filter(|c| !c.is_resource()) {
            path.push(child.name.clone());
            walk(child, path, found);
            path.pop();
        }
    }

    let mut found = Vec::new();
    walk(root, &mut Vec::new(), &mut found);
    found
}

/// Distinct values per hierarchy level with their row counts, most frequent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelSummary {
    pub parents: Vec<(String, usize)>,
    pub children: Vec<(String, usize)>,
    pub subchildren: Vec<(String, usize)>,
}

pub fn summarize_levels(rows: &[Row], normalizer: &Normalizer) -> LevelSummary {
    let rows = normalizer.normalize_hierarchy_fields(rows);

    fn count<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
        let mut first_seen: HashMap<String, String> = HashMap::new();
        let counts = values
            .map(|v| {
                let key = lookup_key(v);
                first_seen.entry(key.clone()).or_insert_with(|| v.to_string());
                key
            })
            .counts();
        counts
            .into_iter()
            .map(|(key, n)| (first_seen.get(&key).cloned().unwrap_or(key), n))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .collect()
    }

    LevelSummary {
        parents: count(rows.iter().filter_map(|r| r.parent.as_deref())),
        children: count(rows.iter().filter_map(|r| r.child.as_deref())),
        subchildren: count(rows.iter().filter_map(|r| r.subchild.as_deref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ResourceUrl;

    #[test]
    fn given_resource_and_category_sharing_name_when_checked_then_collision_reported() {
        let mut b = Node::category("B");
        b.children.push(Node::resource("R", None, ResourceUrl::Unavailable));
        let mut a = Node::category("A");
        a.children.push(Node::resource("b", None, ResourceUrl::Unavailable));
        a.children.push(b);
        let mut root = Node::category("root");
        root.children.push(a);

        let found = find_name_collisions(&root);

        assert_eq!(
            found,
            vec![NameCollision {
                path: "A".into(),
                name: "B".into()
            }]
        );
        assert_eq!(
            BuildWarning::from(&found[0]).to_string(),
            "'A' has both a category and a resource named 'B'"
        );
    }

    #[test]
    fn given_duplicate_resources_when_checked_then_no_collision() {
        let mut a = Node::category("A");
        a.children.push(Node::resource("R", None, ResourceUrl::Unavailable));
        a.children.push(Node::resource("R", None, ResourceUrl::Unavailable));
        let mut root = Node::category("root");
        root.children.push(a);

        assert!(find_name_collisions(&root).is_empty());
    }

    #[test]
    fn given_child_without_parent_when_checked_then_flagged() {
        let mut orphan = Row::new("x", "R2").with_child("Orphan");
        orphan.parent = Some("unknown".into());
        let rows = vec![Row::new("A", "R1").with_child("B"), orphan];

        let found = find_dangling_references(&rows, &Normalizer::default());

        assert_eq!(
            found.dangling_children.into_iter().collect::<Vec<_>>(),
            vec!["Orphan".to_string()]
        );
        assert!(found.dangling_subchildren.is_empty());
    }

    #[test]
    fn given_child_paired_once_when_checked_then_not_flagged() {
        let mut orphan = Row::new("x", "R2").with_child("b");
        orphan.parent = None;
        let rows = vec![orphan, Row::new("A", "R1").with_child("B")];

        let found = find_dangling_references(&rows, &Normalizer::default());

        assert!(found.is_empty());
    }

    #[test]
    fn given_subchild_without_child_when_checked_then_flagged() {
        let rows = vec![Row::new("A", "R1").with_subchild("Loose")];

        let found = find_dangling_references(&rows, &Normalizer::default());

        assert!(found.dangling_subchildren.contains("Loose"));
        assert_eq!(found.warnings().count(), 1);
    }

    #[test]
    fn given_nested_unknown_name_when_checked_then_detects_placeholder() {
        let mut root = Node::category("root");
        let mut a = Node::category("A");
        a.children.push(Node::category(" Unknown"));
        root.children.push(a);

        assert!(contains_placeholder(&root));
        assert!(!contains_placeholder(&Node::category("root")));
    }

    #[test]
    fn given_rows_when_summarized_then_counts_by_level() {
        let rows = vec![
            Row::new("A", "1").with_child("x"),
            Row::new("a", "2").with_child("X"),
            Row::new("B", "3"),
        ];

        let summary = summarize_levels(&rows, &Normalizer::default());

        assert_eq!(summary.parents, vec![("A".to_string(), 2), ("B".to_string(), 1)]);
        assert_eq!(summary.children, vec![("x".to_string(), 2)]);
        assert!(summary.subchildren.is_empty());
    }
}
