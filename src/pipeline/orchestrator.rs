use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::catalog::{attr, Catalog, CatalogNode, CatalogTree, ROOT_NAME};
use crate::feed::{FeedFetcher, FeedParser, FetchError, ParseContext, ParsedNode, ParseError};
use crate::recipe::{FetchParams, RecipeGroup, RecipeRegistry};

/// Terminal and transient states of a pipeline run.
///
/// Every run moves `Idle → Running` and then exactly once into one of the
/// three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// How a run ended when it did not fail.
///
/// Cancellation is not an error: the initiating screen is assumed gone, so
/// the only correct reaction is to do nothing further.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// The finished tree, also reachable through [`Catalog::current`].
    Published(Arc<CatalogTree>),
    /// Cancellation was observed at a checkpoint; nothing was published.
    Cancelled,
}

/// Errors surfaced by pipeline entry points.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A category or item referenced by a continuation or resume call does
    /// not exist in the current tree. Returned synchronously from the
    /// offending lookup, never as a full run's terminal failure.
    #[error("not found: {0}")]
    NotFound(String),
    /// A full-tree build was triggered while another one is running.
    /// Concurrent builds are rejected, not interleaved.
    #[error("a catalog build is already running")]
    Busy,
}

/// Drives the recipe-group list against the feed fetcher/parser and merges
/// the results into one tree, published atomically on success.
///
/// One orchestrator owns one [`Catalog`] handle. A single run executes as a
/// sequential chain of awaited fetch/parse calls — recipe-groups are
/// deliberately processed one at a time so that later groups observe (and
/// order after) earlier groups' contributions to same-named categories. At
/// most one fetch-or-parse operation is in flight per run.
pub struct PipelineOrchestrator {
    pub(crate) registry: RecipeRegistry,
    pub(crate) fetcher: FeedFetcher,
    pub(crate) parser: FeedParser,
    pub(crate) catalog: Catalog,
    building: Mutex<()>,
    state: StdMutex<RunState>,
}

impl PipelineOrchestrator {
    pub fn new(registry: RecipeRegistry, fetcher: FeedFetcher, parser: FeedParser) -> Self {
        Self {
            registry,
            fetcher,
            parser,
            catalog: Catalog::new(),
            building: Mutex::new(()),
            state: StdMutex::new(RunState::Idle),
        }
    }

    /// The published-tree handle readers should hold on to.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &RecipeRegistry {
        &self.registry
    }

    /// State of the most recent run (or `Idle` before the first one).
    pub fn run_state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Run a full catalog build over every configured recipe-group.
    ///
    /// The token must be fresh for this run — cancellation state is per-run
    /// and never reused. Cancellation is cooperative: it is checked between
    /// recipe-groups and again after the tree is built, before publishing.
    /// An in-flight fetch may still complete; its result is discarded.
    ///
    /// # Returns
    ///
    /// - `Ok(BuildOutcome::Published(tree))` — the tree was swapped in as
    ///   the current catalog.
    /// - `Ok(BuildOutcome::Cancelled)` — cancellation observed; nothing
    ///   published, any previously published tree untouched.
    ///
    /// # Errors
    ///
    /// The first fetch or parse failure aborts the run; no partial tree is
    /// ever published. [`PipelineError::Busy`] when a build is already
    /// running.
    pub async fn build(&self, token: CancellationToken) -> Result<BuildOutcome, PipelineError> {
        let _guard = self.building.try_lock().map_err(|_| PipelineError::Busy)?;
        self.set_state(RunState::Running);

        let mut tree = CatalogTree::new();
        let cancelled = match self.resolve_groups(&mut tree.root, &token).await {
            Ok(cancelled) => cancelled,
            Err(e) => {
                tracing::error!(error = %e, "recipe chain failed");
                self.set_state(RunState::Failed);
                return Err(e);
            }
        };

        tree.prune_empty();

        if cancelled {
            tracing::debug!("catalog build cancelled; discarding tree");
            self.set_state(RunState::Cancelled);
            return Ok(BuildOutcome::Cancelled);
        }

        let published = Arc::new(tree);
        self.catalog.publish(Arc::clone(&published));
        tracing::info!(
            categories = published.category_count(),
            items = published.item_count(),
            "recipe chain completed; catalog published"
        );
        self.set_state(RunState::Completed);
        Ok(BuildOutcome::Published(published))
    }

    /// Re-run the per-category resolution for one previously selected
    /// category, publishing into that node in place.
    ///
    /// Identical to [`build`](Self::build) except for the iteration root
    /// and the publish target: every recipe-group resolves against the
    /// selected category, and the updated tree (a clone of the current one
    /// with that subtree rebuilt) is swapped in.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`] when no tree is published yet or the
    /// category does not exist in it, plus everything `build` can return.
    pub async fn build_into(
        &self,
        category_name: &str,
        token: CancellationToken,
    ) -> Result<BuildOutcome, PipelineError> {
        let _guard = self.building.try_lock().map_err(|_| PipelineError::Busy)?;

        let current = self
            .catalog
            .current()
            .ok_or_else(|| PipelineError::NotFound("no published catalog".into()))?;
        if current.root.find_category(category_name).is_none() {
            return Err(PipelineError::NotFound(format!(
                "category '{category_name}'"
            )));
        }

        self.set_state(RunState::Running);
        let mut tree = (*current).clone();

        let cancelled = {
            // Checked above on the published tree; the clone has the same shape.
            let Some(target) = tree.root.find_category_mut(category_name) else {
                self.set_state(RunState::Failed);
                return Err(PipelineError::NotFound(format!(
                    "category '{category_name}'"
                )));
            };
            match self.resolve_groups(target, &token).await {
                Ok(cancelled) => {
                    target.prune_empty();
                    cancelled
                }
                Err(e) => {
                    tracing::error!(error = %e, category = category_name, "recipe chain failed");
                    self.set_state(RunState::Failed);
                    return Err(e);
                }
            }
        };

        if cancelled {
            self.set_state(RunState::Cancelled);
            return Ok(BuildOutcome::Cancelled);
        }

        let published = Arc::new(tree);
        self.catalog.publish(Arc::clone(&published));
        tracing::info!(category = category_name, "selected category republished");
        self.set_state(RunState::Completed);
        Ok(BuildOutcome::Published(published))
    }

    /// Resolve every recipe-group against `root`, strictly serially.
    ///
    /// Returns whether cancellation was observed at a checkpoint.
    async fn resolve_groups(
        &self,
        root: &mut CatalogNode,
        token: &CancellationToken,
    ) -> Result<bool, PipelineError> {
        for (index, group) in self.registry.groups().iter().enumerate() {
            if token.is_cancelled() {
                return Ok(true);
            }
            self.resolve_group(index, group, root).await?;
        }
        Ok(token.is_cancelled())
    }

    /// Resolve one recipe-group: category, then its items, then its
    /// sub-categories. The group's full subtree is merged before returning,
    /// which is what lets the next group observe it.
    async fn resolve_group(
        &self,
        index: usize,
        group: &RecipeGroup,
        root: &mut CatalogNode,
    ) -> Result<(), PipelineError> {
        tracing::debug!(group = index, "resolving recipe group");

        let mut slots: Vec<usize> = Vec::new();
        match &group.category {
            None => {
                // No category recipes: synthesize from the configured name.
                let Some(name) = group.name.as_deref() else {
                    tracing::warn!(
                        group = index,
                        "group has neither category recipes nor a literal name; skipping"
                    );
                    return Ok(());
                };
                slots.push(root.merge_child(CatalogNode::new(name)));
            }
            Some(pair) => {
                let param = if root.name == ROOT_NAME {
                    self.registry.root_parent_param().map(str::to_owned)
                } else {
                    root.attr_str(attr::DATA_TYPE).map(str::to_owned)
                };
                let payload = self
                    .fetcher
                    .fetch(
                        &pair.fetch,
                        &FetchParams {
                            param: param.clone(),
                            page: None,
                        },
                    )
                    .await?;
                let ctx = ParseContext::new(param.into_iter().collect(), group.live);
                for parsed in self.parser.parse(&pair.parse, &payload, &ctx)? {
                    match parsed {
                        ParsedNode::Category(node) => {
                            let slot = root.merge_child(node);
                            if !slots.contains(&slot) {
                                slots.push(slot);
                            }
                        }
                        ParsedNode::Item(_) => {
                            tracing::warn!(group = index, "category feed yielded an item; skipping");
                        }
                    }
                }
            }
        }

        for slot in slots {
            // Remember which group contributed the category so the
            // continuation flow can re-resolve its item recipes.
            root.children[slot]
                .attributes
                .entry(attr::SOURCE_GROUP.to_owned())
                .or_insert((index as i64).into());

            self.resolve_items(group, &mut root.children[slot], None).await?;
            super::pagination::initialize_cursor(&mut root.children[slot]);
            self.resolve_subcategories(group, &mut root.children[slot]).await?;
        }
        Ok(())
    }

    /// Fetch and parse one page of a category's item feed, appending every
    /// returned item in feed order. Returns the number of items added.
    ///
    /// Shared verbatim between the full build, the resume variant, and the
    /// continuation flow — `page` is `None` for a first-page build fetch.
    pub(crate) async fn resolve_items(
        &self,
        group: &RecipeGroup,
        category: &mut CatalogNode,
        page: Option<u32>,
    ) -> Result<usize, PipelineError> {
        let param = category.attr_str(attr::DATA_TYPE).map(str::to_owned);
        let payload = self
            .fetcher
            .fetch(
                &group.items.fetch,
                &FetchParams {
                    param: param.clone(),
                    page,
                },
            )
            .await?;
        let ctx = ParseContext::new(param.into_iter().collect(), group.live);

        let mut added = 0usize;
        for parsed in self.parser.parse(&group.items.parse, &payload, &ctx)? {
            match parsed {
                ParsedNode::Item(item) => {
                    category.add_item(item);
                    added += 1;
                }
                ParsedNode::Category(_) => {
                    tracing::warn!(category = %category.name, "item feed yielded a category; skipping");
                }
            }
        }
        tracing::debug!(category = %category.name, added = added, "items resolved");
        Ok(added)
    }

    /// Fetch and parse the sub-category feed for one category, merging each
    /// returned node under it by name. Widens the tree one level; it never
    /// recurses into the sub-categories it attaches.
    async fn resolve_subcategories(
        &self,
        group: &RecipeGroup,
        category: &mut CatalogNode,
    ) -> Result<(), PipelineError> {
        let Some(pair) = &group.category else {
            return Ok(());
        };

        // Repeated runs must not duplicate previously attached sub-categories.
        category.children.clear();

        let param = category.attr_str(attr::DATA_TYPE).map(str::to_owned);
        let payload = self
            .fetcher
            .fetch(
                &pair.fetch,
                &FetchParams {
                    param: param.clone(),
                    page: None,
                },
            )
            .await?;
        let ctx = ParseContext::new(param.into_iter().collect(), group.live);

        for parsed in self.parser.parse(&pair.parse, &payload, &ctx)? {
            if let ParsedNode::Category(sub) = parsed {
                category.merge_child(sub);
            }
        }
        Ok(())
    }
}
