//! The aggregation pipeline: recipe-group sequencing, tree merging, and
//! item continuation.
//!
//! One [`PipelineOrchestrator`] owns the whole flow. A full build walks the
//! configured recipe-groups strictly in order — each group's category is
//! resolved, its items attached, its sub-categories merged — then prunes
//! empty branches and publishes the finished tree with an atomic reference
//! swap. The first fetch or parse failure aborts the run with nothing
//! published; cooperative cancellation discards the result instead.

mod orchestrator;
mod pagination;

pub use orchestrator::{BuildOutcome, PipelineError, PipelineOrchestrator, RunState};
pub use pagination::{Continuation, PaginationCursor};
