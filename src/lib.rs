//! Recipe-driven content catalog aggregation.
//!
//! `lineup` builds a hierarchical catalog (categories containing
//! sub-categories and playable items) by driving an ordered list of
//! declarative recipe-groups against remote feeds: each group's feeds are
//! fetched, translated into structured nodes, and merged into one in-memory
//! tree that downstream consumers read through an atomically swapped handle.
//!
//! The pipeline is strictly sequential within a run — later recipe-groups
//! must observe earlier contributions to same-named categories — and a run
//! either publishes a complete tree or publishes nothing: the first fetch or
//! parse failure aborts it, and cooperative cancellation discards the
//! result.
//!
//! ```no_run
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//! use lineup::config::Config;
//! use lineup::feed::{FeedFetcher, FeedParser, TranslatorRegistry};
//! use lineup::pipeline::PipelineOrchestrator;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(Path::new("recipes.toml"))?;
//! let fetcher = FeedFetcher::over_http(config.request_timeout, config.max_feed_bytes);
//! let parser = FeedParser::new(TranslatorRegistry::with_builtins());
//! let pipeline = PipelineOrchestrator::new(config.registry, fetcher, parser);
//!
//! // A fresh token per run; tie it to the consumer's lifecycle.
//! pipeline.build(CancellationToken::new()).await?;
//! if let Some(tree) = pipeline.catalog().current() {
//!     println!("{} categories", tree.category_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod feed;
pub mod pipeline;
pub mod recipe;

pub use catalog::{Catalog, CatalogNode, CatalogTree, ItemNode};
pub use pipeline::{BuildOutcome, Continuation, PipelineError, PipelineOrchestrator};
