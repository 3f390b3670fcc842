//! Item continuation: per-category pagination state and the caller-triggered
//! "load more" flow.
//!
//! This is a narrower secondary path next to the full build — it re-fetches
//! exactly one category's item feed with an advanced page parameter, appends
//! the new items, and republishes. It never touches sibling categories and
//! never re-enters the orchestrator's recipe-group sequence.

use std::sync::Arc;

use crate::catalog::{attr, CatalogNode};
use crate::recipe::RecipeGroup;

use super::orchestrator::{PipelineError, PipelineOrchestrator};

/// Sentinel stored in the next-page attribute once no pages remain.
const NO_MORE_PAGES: i64 = -1;

/// Per-category pagination state, derived from (and folded back into) the
/// category's pagination attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub has_more: bool,
    /// Page index the next fetch should request. Meaningless when
    /// `has_more` is false.
    pub next_page: u32,
}

impl PaginationCursor {
    /// Read the cursor off a category node. A missing or negative next-page
    /// attribute means the category has no further pages.
    pub fn from_node(node: &CatalogNode) -> Self {
        match node.attr_int(attr::NEXT_PAGE) {
            Some(page) if page > 0 => Self {
                has_more: true,
                next_page: page as u32,
            },
            _ => Self {
                has_more: false,
                next_page: 0,
            },
        }
    }

    /// Decide whether more pages remain after a fetch: the count of items
    /// now loaded, compared against the total the feed reported. An unknown
    /// total folds the cursor.
    pub fn advance(&mut self, loaded: usize, total: Option<i64>) {
        match total {
            Some(total) if (loaded as i64) < total => self.next_page += 1,
            _ => self.has_more = false,
        }
    }

    /// Fold the cursor back into the node's attributes.
    pub fn store(&self, node: &mut CatalogNode) {
        let value = if self.has_more {
            self.next_page as i64
        } else {
            NO_MORE_PAGES
        };
        node.set_attribute(attr::NEXT_PAGE, value);
    }
}

/// Stamp the initial cursor on a category that just had its first item page
/// resolved. Created only when the feed reports a total item count larger
/// than what one page returned.
pub(crate) fn initialize_cursor(node: &mut CatalogNode) {
    let Some(total) = node.attr_int(attr::ITEM_COUNT) else {
        return;
    };
    let loaded = node.items.len() as i64;
    let next = if loaded > 0 && loaded < total {
        2
    } else {
        NO_MORE_PAGES
    };
    node.set_attribute(attr::NEXT_PAGE, next);
}

/// Result of a continuation call: the category's updated item count and
/// whether another page can still be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub item_count: usize,
    pub has_more: bool,
}

impl PipelineOrchestrator {
    /// Fetch and append the next page of items for one category.
    ///
    /// Appends to the existing category in a clone of the published tree and
    /// swaps the updated tree in; a category with no pages left returns its
    /// current state without fetching.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`] when no catalog is published, the
    /// category does not exist in it, or the category has lost its
    /// originating recipe-group; fetch/parse errors surface unchanged and
    /// leave the published tree untouched.
    pub async fn load_more(&self, category_name: &str) -> Result<Continuation, PipelineError> {
        let current = self
            .catalog
            .current()
            .ok_or_else(|| PipelineError::NotFound("no published catalog".into()))?;

        let mut tree = (*current).clone();
        let continuation = {
            let node = tree
                .root
                .find_category_mut(category_name)
                .ok_or_else(|| PipelineError::NotFound(format!("category '{category_name}'")))?;

            let mut cursor = PaginationCursor::from_node(node);
            if !cursor.has_more {
                return Ok(Continuation {
                    item_count: node.items.len(),
                    has_more: false,
                });
            }

            let group = self
                .source_group(node)
                .ok_or_else(|| {
                    PipelineError::NotFound(format!(
                        "recipe group for category '{category_name}'"
                    ))
                })?
                .clone();

            let page = cursor.next_page;
            let added = self.resolve_items(&group, node, Some(page)).await?;
            tracing::debug!(
                category = category_name,
                page = page,
                added = added,
                "continuation page appended"
            );

            cursor.advance(node.items.len(), node.attr_int(attr::ITEM_COUNT));
            cursor.store(node);

            Continuation {
                item_count: node.items.len(),
                has_more: cursor.has_more,
            }
        };

        self.catalog.publish(Arc::new(tree));
        Ok(continuation)
    }

    /// The recipe-group that contributed a category during the build.
    fn source_group(&self, node: &CatalogNode) -> Option<&RecipeGroup> {
        let index = usize::try_from(node.attr_int(attr::SOURCE_GROUP)?).ok()?;
        self.registry.group(index)
    }
}
