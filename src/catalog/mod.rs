//! The in-memory catalog: category/item nodes, the tree they form, and the
//! shared handle through which the published tree reaches consumers.
//!
//! Nodes are plain data. All structural invariants (sibling-name uniqueness,
//! empty-branch pruning) are enforced by the operations on [`CatalogNode`]
//! and [`CatalogTree`], not by construction.

mod node;
mod tree;

pub use node::{attr, AttributeValue, CatalogNode, ItemNode};
pub use tree::{Catalog, CatalogTree, ROOT_NAME};
