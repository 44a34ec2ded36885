//! Error kinds for the grid core.
//!
//! Every recovery path in the core emits an event *and* surfaces one of
//! these variants to the caller (or, for backend/renderer failures that
//! happen off the direct call stack, only as an event — see `events.rs`).

use thiserror::Error;

use crate::cell::{ColId, RowId};

#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("index out of bounds: {0}")]
    Bounds(#[from] BoundsError),

    #[error("invalid state: {0}")]
    State(#[from] StateError),

    #[error("backend request failed: {0}")]
    Backend(#[from] BackendError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("index build failed: {0}")]
    Indexing(#[from] IndexingError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("row count must be non-negative, got {0}")]
    NegativeRowCount(i64),
    #[error("cache capacity must be greater than zero")]
    CapacityZero,
    #[error("column {col:?} has minWidth {min} > maxWidth {max}")]
    InvalidWidthBounds { col: ColId, min: f64, max: f64 },
    #[error("overscan must be finite and non-negative, got {0}")]
    InvalidOverscan(i64),
    #[error("sliding window pruneThreshold ({prune}) must be >= windowSize ({window})")]
    InvalidWindowBounds { window: usize, prune: usize },
}

#[derive(Debug, Error)]
pub enum BoundsError {
    #[error("row {row:?} out of range [0, {len})")]
    Row { row: RowId, len: usize },
    #[error("column {col:?} is not known to the column model")]
    Column { col: ColId },
    #[error("visual index {index} out of range [0, {len})")]
    VisualIndex { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("method called on a destroyed grid")]
    Destroyed,
    #[error("projection pipeline used before initialization")]
    Uninitialized,
    #[error("operation not valid while a request is in flight")]
    RequestInFlight,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("sort request rejected: {0}")]
    SortRejected(String),
    #[error("filter request rejected: {0}")]
    FilterRejected(String),
    #[error("load-more-rows request rejected: {0}")]
    LoadRejected(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("value rejected for column {col:?}: {reason}")]
    Rejected { col: ColId, reason: String },
}

#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("suffix array build failed for column {col:?}: {reason}")]
    SuffixArray { col: ColId, reason: String },
    #[error("bloom filter sizing failed: {0}")]
    BloomSizing(String),
    #[error("trie build failed for column {col:?}: {reason}")]
    Trie { col: ColId, reason: String },
}

pub type GridResult<T> = Result<T, GridError>;
