//! `IndexMap`: a permutation over backing row indices.
//!
//! Identity-initialized; `permute` sorts in place with a stable
//! comparator, so that multi-column sort order is observable through
//! `sort.rs`'s toggle protocol.

use crate::cell::RowId;

/// `P[i] == backing row for visual row i`.
#[derive(Clone, Debug, Default)]
pub struct IndexMap {
    forward: Vec<RowId>,
    /// Lazily built: `inverse[backing_row] == visual index`.
    inverse: Option<Vec<u32>>,
}

impl IndexMap {
    /// Identity permutation over `[0, n)`.
    pub fn new(n: usize) -> Self {
        IndexMap {
            forward: (0..n as u32).map(RowId).collect(),
            inverse: None,
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Visual row `i` maps to backing row `lookup(i)`.
    pub fn lookup(&self, i: usize) -> Option<RowId> {
        self.forward.get(i).copied()
    }

    /// Backing row `row_id` maps to visual row `inverse_lookup(row_id)`,
    /// building the inverse index lazily on first call after invalidation.
    pub fn inverse_lookup(&mut self, row_id: RowId) -> Option<usize> {
        if self.inverse.is_none() {
            self.rebuild_inverse();
        }
        self.inverse
            .as_ref()
            .and_then(|inv| inv.get(row_id.0 as usize))
            .and_then(|&v| if v == u32::MAX { None } else { Some(v as usize) })
    }

    fn rebuild_inverse(&mut self) {
        let max_id = self.forward.iter().map(|r| r.0).max().map(|m| m + 1).unwrap_or(0);
        let mut inverse = vec![u32::MAX; max_id as usize];
        for (visual, row) in self.forward.iter().enumerate() {
            inverse[row.0 as usize] = visual as u32;
        }
        self.inverse = Some(inverse);
    }

    /// Sorts the permutation in place with a stable sort. After this call,
    /// for all `i < j`, `comparator(P[i], P[j]) != Greater`.
    pub fn permute<F>(&mut self, mut comparator: F)
    where
        F: FnMut(RowId, RowId) -> std::cmp::Ordering,
    {
        self.forward.sort_by(|a, b| comparator(*a, *b));
        self.inverse = None;
    }

    /// Replace the permutation wholesale (used when a backend sort/filter
    /// response supplies an explicit row order), invalidating the inverse.
    pub fn set(&mut self, rows: Vec<RowId>) {
        self.forward = rows;
        self.inverse = None;
    }

    pub fn as_slice(&self) -> &[RowId] {
        &self.forward
    }

    /// Grow the identity tail for newly appended backing rows (infinite
    /// scroll append), preserving existing order.
    pub fn extend_identity(&mut self, additional: usize) {
        let start = self
            .forward
            .iter()
            .map(|r| r.0)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        self.forward
            .extend((start..start + additional as u32).map(RowId));
        self.inverse = None;
    }

    /// Drop rows whose backing id satisfies `predicate`, used by the
    /// sliding-window prune (component M). Retains relative order.
    pub fn retain<F: FnMut(RowId) -> bool>(&mut self, mut predicate: F) {
        self.forward.retain(|&r| predicate(r));
        self.inverse = None;
    }
}
