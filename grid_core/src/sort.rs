//! `SortManager`: single/multi-column compile into an `IndexMap`
//! permutation.
//!
//! Multi-column: an ordered list of `(column, direction)` pairs, compared
//! lexicographically. Frontend mode sorts `IndexMap` in place with a stable
//! sort; backend mode emits the sort state to the host and tracks the
//! response with `LatestWins`, same shape as `FilterEngine`'s backend path.

use crate::cell::{ColId, RowId};
use crate::index_map::IndexMap;
use crate::request::{LatestWins, RequestToken};
use crate::row_source::RowSource;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SortKey {
    pub column: ColId,
    pub direction: SortDirection,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortMode {
    Frontend,
    Backend,
    /// Resolves to `Backend` iff a backend callback is registered.
    Auto,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortTransition {
    AppliedLocally,
}

/// A comparator that "throws": treated as
/// equal, with the caller responsible for emitting `sort:error(col,row)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SortErrorEvent {
    pub column: ColId,
    pub row: RowId,
}

pub struct SortManager {
    keys: Vec<SortKey>,
    mode: SortMode,
    has_backend: bool,
    backend_tracker: LatestWins,
    last_errors: Vec<SortErrorEvent>,
    /// Keys in effect immediately before the current backend request was
    /// issued, restored on rejection.
    pending_previous_keys: Option<Vec<SortKey>>,
    /// Snapshot taken by `toggle_column`/`set_keys` just before mutating
    /// `keys`, consumed by the next `apply()` that resolves to backend
    /// mode so the correct pre-request state can be restored later.
    pre_mutation_snapshot: Option<Vec<SortKey>>,
}

impl SortManager {
    pub fn new(mode: SortMode) -> Self {
        SortManager {
            keys: Vec::new(),
            mode,
            has_backend: false,
            backend_tracker: LatestWins::default(),
            last_errors: Vec::new(),
            pending_previous_keys: None,
            pre_mutation_snapshot: None,
        }
    }

    pub fn set_has_backend(&mut self, has_backend: bool) {
        self.has_backend = has_backend;
    }

    fn resolved_mode(&self) -> SortMode {
        match self.mode {
            SortMode::Auto => {
                if self.has_backend {
                    SortMode::Backend
                } else {
                    SortMode::Frontend
                }
            }
            other => other,
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn last_errors(&self) -> &[SortErrorEvent] {
        &self.last_errors
    }

    /// Drains the errors recorded by the most recent frontend sort pass, so
    /// a caller that turns each into a `sort:error` event doesn't re-emit
    /// the same ones again after a later recompute that never re-sorts
    /// (e.g. a backend-mode pass, which never touches `last_errors`).
    pub fn take_errors(&mut self) -> Vec<SortErrorEvent> {
        std::mem::take(&mut self.last_errors)
    }

    /// Toggle protocol on a single column: none -> asc -> desc -> none.
    /// Multi-column chains append/replace the column's slot in `keys`
    /// without disturbing the order of the others, matching the observable
    /// behavior of repeated shift-click column-header toggles.
    pub fn toggle_column(&mut self, column: ColId) {
        self.pre_mutation_snapshot = Some(self.keys.clone());
        match self.keys.iter().position(|k| k.column == column) {
            None => self.keys.push(SortKey {
                column,
                direction: SortDirection::Ascending,
            }),
            Some(idx) if self.keys[idx].direction == SortDirection::Ascending => {
                self.keys[idx].direction = SortDirection::Descending;
            }
            Some(idx) => {
                self.keys.remove(idx);
            }
        }
    }

    pub fn set_keys(&mut self, keys: Vec<SortKey>) {
        self.pre_mutation_snapshot = Some(self.keys.clone());
        self.keys = keys;
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Lexicographic comparator over the active key list. Nulls/blanks sort
    /// last in ascending order, first in descending — i.e. last overall
    /// w.r.t. each key's own direction.
    fn compare_rows<S: RowSource>(&mut self, source: &S, a: RowId, b: RowId) -> std::cmp::Ordering {
        for key in self.keys.clone() {
            let ca = source.cell(a, key.column);
            let cb = source.cell(b, key.column);
            let ordering = match (ca.is_blank(), cb.is_blank()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => match ca.compare_checked(&cb) {
                    Some(o) => o,
                    None => {
                        self.last_errors.push(SortErrorEvent { column: key.column, row: a });
                        std::cmp::Ordering::Equal
                    }
                },
            };
            let ordering = match key.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    }

    /// Frontend execution: stable-sorts `index_map` in place using the
    /// active key list. Returns `BackendRequested` instead when resolved to
    /// backend mode, leaving `index_map` untouched until the host's
    /// response is applied via `apply_backend_result`.
    pub fn apply<S: RowSource>(
        &mut self,
        source: &S,
        index_map: &mut IndexMap,
    ) -> Result<SortTransition, RequestToken> {
        match self.resolved_mode() {
            SortMode::Frontend | SortMode::Auto => {
                self.last_errors.clear();
                index_map.permute(|a, b| self.compare_rows(source, a, b));
                Ok(SortTransition::AppliedLocally)
            }
            SortMode::Backend => {
                let token = self.backend_tracker.start();
                self.pending_previous_keys = self.pre_mutation_snapshot.take().or(self.pending_previous_keys.take());
                Err(token)
            }
        }
    }

    pub fn apply_backend_result(&mut self, token: RequestToken, order: Vec<RowId>, index_map: &mut IndexMap) -> bool {
        if !self.backend_tracker.is_current(token) {
            return false;
        }
        self.backend_tracker.complete(token);
        self.pending_previous_keys = None;
        index_map.set(order);
        true
    }

    /// Discards a rejected backend response (if `token` is still current)
    /// and restores the key list in effect before the request was issued.
    pub fn reject_backend_result(&mut self, token: RequestToken) -> Option<Vec<SortKey>> {
        if !self.backend_tracker.is_current(token) {
            return None;
        }
        self.backend_tracker.complete(token);
        let restored = self.pending_previous_keys.take().unwrap_or_default();
        self.keys = restored.clone();
        Some(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    struct Rows(Vec<Vec<Cell>>);

    impl RowSource for Rows {
        fn row_count(&self) -> usize {
            self.0.len()
        }
        fn cell(&self, row: RowId, col: ColId) -> Cell {
            self.0[row.0 as usize][col.0 as usize].clone()
        }
    }

    #[test]
    fn toggle_protocol_cycles_none_asc_desc_none() {
        let mut sm = SortManager::new(SortMode::Frontend);
        sm.toggle_column(ColId(0));
        assert_eq!(sm.keys()[0].direction, SortDirection::Ascending);
        sm.toggle_column(ColId(0));
        assert_eq!(sm.keys()[0].direction, SortDirection::Descending);
        sm.toggle_column(ColId(0));
        assert!(sm.keys().is_empty());
    }

    #[test]
    fn multi_column_sort_is_lexicographic() {
        let rows = Rows(vec![
            vec![Cell::Text("b".into()), Cell::Number(2.0)],
            vec![Cell::Text("a".into()), Cell::Number(1.0)],
            vec![Cell::Text("a".into()), Cell::Number(0.0)],
        ]);
        let mut sm = SortManager::new(SortMode::Frontend);
        sm.set_keys(vec![
            SortKey { column: ColId(0), direction: SortDirection::Ascending },
            SortKey { column: ColId(1), direction: SortDirection::Ascending },
        ]);
        let mut im = IndexMap::new(3);
        sm.apply(&rows, &mut im).unwrap();
        assert_eq!(im.as_slice(), &[RowId(2), RowId(1), RowId(0)]);
    }

    #[test]
    fn blanks_sort_last_ascending_first_descending() {
        let rows = Rows(vec![
            vec![Cell::Number(5.0)],
            vec![Cell::Null],
            vec![Cell::Number(1.0)],
        ]);
        let mut sm = SortManager::new(SortMode::Frontend);
        sm.set_keys(vec![SortKey { column: ColId(0), direction: SortDirection::Ascending }]);
        let mut im = IndexMap::new(3);
        sm.apply(&rows, &mut im).unwrap();
        assert_eq!(im.lookup(2), Some(RowId(1)), "blank should sort last ascending");

        sm.set_keys(vec![SortKey { column: ColId(0), direction: SortDirection::Descending }]);
        let mut im2 = IndexMap::new(3);
        sm.apply(&rows, &mut im2).unwrap();
        assert_eq!(im2.lookup(0), Some(RowId(1)), "blank should sort first descending");
    }

    #[test]
    fn backend_mode_returns_a_request_token_without_mutating_index_map() {
        let rows = Rows(vec![vec![Cell::Number(1.0)], vec![Cell::Number(2.0)]]);
        let mut sm = SortManager::new(SortMode::Backend);
        sm.set_keys(vec![SortKey { column: ColId(0), direction: SortDirection::Ascending }]);
        let mut im = IndexMap::new(2);
        let token = sm.apply(&rows, &mut im).unwrap_err();
        assert_eq!(im.as_slice(), &[RowId(0), RowId(1)]);
        assert!(sm.apply_backend_result(token, vec![RowId(1), RowId(0)], &mut im));
        assert_eq!(im.as_slice(), &[RowId(1), RowId(0)]);
    }

    #[test]
    fn rejected_backend_sort_restores_previous_keys() {
        let rows = Rows(vec![vec![Cell::Number(1.0)], vec![Cell::Number(2.0)]]);
        let mut sm = SortManager::new(SortMode::Backend);
        sm.toggle_column(ColId(0));
        let mut im = IndexMap::new(2);
        let token = sm.apply(&rows, &mut im).unwrap_err();
        sm.toggle_column(ColId(1));
        let _ = sm.apply(&rows, &mut im);
        let restored = sm.reject_backend_result(token);
        assert_eq!(restored, None, "a stale token must not restore anything");

        let mut sm2 = SortManager::new(SortMode::Backend);
        sm2.toggle_column(ColId(0));
        let mut im2 = IndexMap::new(2);
        let token2 = sm2.apply(&rows, &mut im2).unwrap_err();
        let restored2 = sm2.reject_backend_result(token2).unwrap();
        assert!(restored2.is_empty(), "keys should revert to pre-toggle state");
        assert!(sm2.keys().is_empty());
    }

    #[test]
    fn nan_comparison_records_a_sort_error_and_treats_the_pair_as_equal() {
        let rows = Rows(vec![
            vec![Cell::Number(f64::NAN)],
            vec![Cell::Number(1.0)],
        ]);
        let mut sm = SortManager::new(SortMode::Frontend);
        sm.set_keys(vec![SortKey { column: ColId(0), direction: SortDirection::Ascending }]);
        let mut im = IndexMap::new(2);
        sm.apply(&rows, &mut im).unwrap();
        // Treated as equal: stable sort leaves insertion order untouched.
        assert_eq!(im.as_slice(), &[RowId(0), RowId(1)]);
        assert_eq!(sm.last_errors().len(), 1);
        assert_eq!(sm.last_errors()[0].column, ColId(0));
    }

    #[test]
    fn stable_sort_preserves_insertion_order_on_ties() {
        let rows = Rows(vec![
            vec![Cell::Number(1.0)],
            vec![Cell::Number(1.0)],
            vec![Cell::Number(0.0)],
        ]);
        let mut sm = SortManager::new(SortMode::Frontend);
        sm.set_keys(vec![SortKey { column: ColId(0), direction: SortDirection::Ascending }]);
        let mut im = IndexMap::new(3);
        sm.apply(&rows, &mut im).unwrap();
        assert_eq!(im.as_slice(), &[RowId(2), RowId(0), RowId(1)]);
    }
}
