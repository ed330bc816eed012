//! Hierarchy builder: rows -> validated, deduplicated, pruned tree.

use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::{NameCase, Node, Row};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::normalize::{lookup_key, Normalizer, SentinelSet};

pub const DEFAULT_ROOT_NAME: &str = "Start Here";

/// Knobs for a [`HierarchyBuilder`].
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    pub root_name: String,
    pub sentinels: SentinelSet,
    pub name_case: NameCase,
    /// Do not create a subchild level whose name equals the resource name.
    pub skip_redundant_subchild: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            sentinels: SentinelSet::default(),
            name_case: NameCase::default(),
            skip_redundant_subchild: true,
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTree {
    pub root: Node,
    /// 1-based numbers of rows dropped for lack of a parent value
    pub skipped_rows: Vec<usize>,
}

/// Constructs a single rooted tree from an ordered row sequence.
///
/// Holds configuration only; every build works on its own arena, so one
/// builder can serve independent inputs concurrently.
#[derive(Debug, Clone)]
pub struct HierarchyBuilder {
    normalizer: Normalizer,
    root_name: String,
    skip_redundant_subchild: bool,
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new(BuilderOptions::default())
    }
}

impl HierarchyBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            normalizer: Normalizer::new(options.sentinels, options.name_case),
            root_name: options.root_name,
            skip_redundant_subchild: options.skip_redundant_subchild,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Build the tree.
    ///
    /// Fails with [`DomainError::MissingResourceName`] on the first row whose
    /// resource name is absent or blank; no partial tree is returned. Rows
    /// without a parent are skipped and reported in
    /// [`BuiltTree::skipped_rows`].
    #[instrument(level = "debug", skip(self, rows), fields(rows = rows.len()))]
    pub fn build(&self, rows: &[Row]) -> DomainResult<BuiltTree> {
        let rows = self.normalizer.normalize_hierarchy_fields(rows);
        let mut tree = TreeArena::new(&self.root_name);
        let root = tree.root();
        let mut skipped_rows = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            let row_no = i + 1;
            let resource_name = row
                .resource_name
                .as_deref()
                .filter(|r| !r.is_empty())
                .ok_or(DomainError::MissingResourceName { row: row_no })?;

            let Some(parent) = row.parent.as_deref() else {
                debug!(row = row_no, "skipping row without parent");
                skipped_rows.push(row_no);
                continue;
            };

            let mut attach_to = tree.category(root, &lookup_key(parent), parent);

            if let Some(child) = row.child.as_deref() {
                attach_to = tree.category(attach_to, &lookup_key(child), child);

                if let Some(subchild) = row.subchild.as_deref() {
                    let key = lookup_key(subchild);
                    let redundant = key == lookup_key(resource_name);
                    if !(redundant && self.skip_redundant_subchild) {
                        attach_to = tree.category(attach_to, &key, subchild);
                    }
                }
            }

            tree.insert_node(
                NodeData::Resource {
                    name: resource_name.to_string(),
                    tooltip: row.tooltip.clone(),
                    url: self.normalizer.sanitize_url(row.url.as_deref()),
                },
                attach_to,
            );
        }

        let pruned = tree.prune();
        debug!(
            nodes = tree.len(),
            pruned,
            skipped = skipped_rows.len(),
            "tree built"
        );

        Ok(BuiltTree {
            root: tree.freeze()?,
            skipped_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ResourceUrl;

    #[test]
    fn given_mixed_case_parent_when_building_then_merges_under_first_casing() {
        let rows = vec![
            Row::new("Finance", "R1"),
            Row::new(" finance ", "R2"),
            Row::new("FINANCE", "R3"),
        ];

        let built = HierarchyBuilder::default().build(&rows).unwrap();

        assert_eq!(built.root.children.len(), 1);
        assert_eq!(built.root.children[0].name, "Finance");
        assert_eq!(built.root.children[0].children.len(), 3);
    }

    #[test]
    fn given_redundant_subchild_when_skip_disabled_then_keeps_level() {
        let rows = vec![Row::new("A", "Tool").with_child("B").with_subchild("tool")];
        let builder = HierarchyBuilder::new(BuilderOptions {
            skip_redundant_subchild: false,
            ..BuilderOptions::default()
        });

        let built = builder.build(&rows).unwrap();

        let sub = built.root.find_path(&["A", "B", "tool"]).unwrap();
        assert_eq!(sub.children[0].name, "Tool");
    }

    #[test]
    fn given_blank_resource_name_when_building_then_fails() {
        let mut row = Row::new("A", "x");
        row.resource_name = Some("   ".into());

        let err = HierarchyBuilder::default()
            .build(&[Row::new("A", "ok"), row])
            .unwrap_err();

        assert_eq!(err, DomainError::MissingResourceName { row: 2 });
    }

    #[test]
    fn given_url_when_building_then_leaf_carries_domain() {
        let rows = vec![Row::new("A", "R").with_url("https://docs.x.org/a?b=1")];

        let built = HierarchyBuilder::default().build(&rows).unwrap();

        assert_eq!(
            built.root.children[0].children[0].url,
            Some(ResourceUrl::Domain("docs.x.org".into()))
        );
    }
}
