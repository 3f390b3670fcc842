use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::node::{CatalogNode, ItemNode};

/// Reserved name of the tree root. Never produced by feeds.
pub const ROOT_NAME: &str = "Root";

/// The full catalog: a root sentinel node owning every category.
///
/// A tree is exclusively owned by the build that constructs it; consumers
/// only ever see one through [`Catalog::current`] after a successful publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTree {
    pub root: CatalogNode,
}

impl CatalogTree {
    pub fn new() -> Self {
        Self {
            root: CatalogNode::new(ROOT_NAME),
        }
    }

    /// Remove every node that finished the run with zero children and zero
    /// items. Running prune twice yields the same tree as running it once.
    pub fn prune_empty(&mut self) {
        self.root.prune_empty();
    }

    pub fn find_category(&self, name: &str) -> Option<&CatalogNode> {
        self.root.find_category(name)
    }

    pub fn find_item(&self, id: u64) -> Option<&ItemNode> {
        self.root.find_item(id)
    }

    /// Number of categories in the tree, root excluded.
    pub fn category_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&CatalogNode> = self.root.children.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Total number of items across all categories.
    pub fn item_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            count += node.items.len();
            stack.extend(node.children.iter());
        }
        count
    }
}

impl Default for CatalogTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to the single published tree.
///
/// The orchestrator owns a tree while building it; `publish` is the one
/// mutation visible to readers, and it is an atomic reference swap — readers
/// either see the previous complete tree or the new complete tree, never a
/// partial one. A failed or cancelled run performs no swap.
#[derive(Clone, Default)]
pub struct Catalog {
    current: Arc<RwLock<Option<Arc<CatalogTree>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully published tree, if any run has completed.
    pub fn current(&self) -> Option<Arc<CatalogTree>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn publish(&self, tree: Arc<CatalogTree>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(tree);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::node::ItemNode;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn tree_with(categories: &[(&str, usize)]) -> CatalogTree {
        let mut tree = CatalogTree::new();
        for (name, items) in categories {
            let mut node = CatalogNode::new(*name);
            for id in 0..*items {
                node.add_item(ItemNode::new(id as u64, format!("{name}-{id}")));
            }
            tree.root.merge_child(node);
        }
        tree
    }

    #[test]
    fn test_new_tree_has_root_sentinel() {
        let tree = CatalogTree::new();
        assert_eq!(tree.root.name, ROOT_NAME);
        assert_eq!(tree.category_count(), 0);
    }

    #[test]
    fn test_counts() {
        let tree = tree_with(&[("Movies", 2), ("Shows", 3)]);
        assert_eq!(tree.category_count(), 2);
        assert_eq!(tree.item_count(), 5);
    }

    #[test]
    fn test_prune_drops_only_empty_categories() {
        let mut tree = tree_with(&[("Movies", 2), ("Shows", 0)]);
        tree.prune_empty();
        assert!(tree.find_category("Movies").is_some());
        assert!(tree.find_category("Shows").is_none());
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut tree = tree_with(&[("Movies", 1), ("Shows", 0)]);
        tree.prune_empty();
        let once = tree.clone();
        tree.prune_empty();
        assert_eq!(once, tree);
    }

    #[test]
    fn test_catalog_publish_swaps_reference() {
        let catalog = Catalog::new();
        assert!(catalog.current().is_none());

        catalog.publish(Arc::new(tree_with(&[("Movies", 1)])));
        let first = catalog.current().unwrap();
        assert!(first.find_category("Movies").is_some());

        catalog.publish(Arc::new(tree_with(&[("Shows", 1)])));
        let second = catalog.current().unwrap();
        assert!(second.find_category("Shows").is_some());
        // The handle we took before the swap still reads the old tree.
        assert!(first.find_category("Movies").is_some());
    }

    // Random trees up to three levels deep, some branches empty.
    fn arb_node(depth: u32) -> impl Strategy<Value = CatalogNode> {
        let leaf = (0usize..3).prop_map(|items| {
            let mut node = CatalogNode::new("n");
            for id in 0..items {
                node.add_item(ItemNode::new(id as u64, "item"));
            }
            node
        });
        leaf.prop_recursive(depth, 24, 3, |inner| {
            (prop::collection::vec(inner, 0..3), 0usize..3).prop_map(|(children, items)| {
                let mut node = CatalogNode::new("n");
                for (i, mut child) in children.into_iter().enumerate() {
                    child.name = format!("c{i}");
                    node.children.push(child);
                }
                for id in 0..items {
                    node.add_item(ItemNode::new(id as u64, "item"));
                }
                node
            })
        })
    }

    proptest! {
        #[test]
        fn prop_prune_idempotent(root in arb_node(3)) {
            let mut tree = CatalogTree::new();
            tree.root = root;
            tree.prune_empty();
            let once = tree.clone();
            tree.prune_empty();
            prop_assert_eq!(once, tree);
        }

        #[test]
        fn prop_prune_leaves_no_empty_descendants(root in arb_node(3)) {
            let mut tree = CatalogTree::new();
            tree.root = root;
            tree.prune_empty();

            let mut stack: Vec<&CatalogNode> = tree.root.children.iter().collect();
            while let Some(node) = stack.pop() {
                prop_assert!(!node.is_empty());
                stack.extend(node.children.iter());
            }
        }
    }
}
