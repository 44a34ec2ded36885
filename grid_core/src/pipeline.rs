//! `ProjectionPipeline`: owns the composition `identity -> filter -> sort ->
//! window` and caches the resulting visible-row mapping so
//! `map_visual_to_data` is O(1) on the
//! hot path (the positioner/selection/editor all call through here rather
//! than recomputing filter+sort themselves).

use crate::cell::RowId;
use crate::filter::FilterEngine;
use crate::index_map::IndexMap;
use crate::request::RequestToken;
use crate::row_source::RowSource;
use crate::sort::SortManager;

/// The projection result: either a dense
/// permutation, a filtered subset, both composed, or identity.
#[derive(Clone, Debug, Default)]
struct VisibleRowMapping {
    /// `None` means identity over `[0, row_count)`.
    rows: Option<Vec<RowId>>,
}

impl VisibleRowMapping {
    fn len(&self, total: usize) -> usize {
        self.rows.as_ref().map_or(total, |r| r.len())
    }

    fn get(&self, visual: usize, total: usize) -> Option<RowId> {
        match &self.rows {
            Some(rows) => rows.get(visual).copied(),
            None => (visual < total).then(|| RowId(visual as u32)),
        }
    }
}

pub struct ProjectionPipeline {
    mapping: VisibleRowMapping,
    dirty: bool,
}

impl ProjectionPipeline {
    pub fn new() -> Self {
        ProjectionPipeline {
            mapping: VisibleRowMapping::default(),
            dirty: true,
        }
    }

    /// Recomputes the filter set on the next `recompute`; the sort
    /// permutation's effective domain then restricts to it.
    pub fn invalidate_filter(&mut self) {
        self.dirty = true;
    }

    /// Recomputes the permutation on the next `recompute`; the filter
    /// set is left intact and reapplied after.
    pub fn invalidate_sort(&mut self) {
        self.dirty = true;
    }

    /// A data mutation on a single row leaves the row mapping itself
    /// valid. Callers are responsible for invalidating only the
    /// per-row caches this implies (quick-filter string cache, cell
    /// fingerprints) — this pipeline's mapping does not change.
    pub fn note_data_mutation(&self, _row: RowId) {}

    /// Column visibility/width changes leave the mapping invariant;
    /// only viewport geometry and the cell pool need updating, which this
    /// pipeline has no say over.
    pub fn note_column_geometry_change(&self) {}

    /// Recomputes the visible-row mapping: runs the filter over
    /// `[0, row_count)`, then sorts the resulting `IndexMap` via
    /// `SortManager`, intersecting sort order with the filtered set.
    /// A no-op if nothing is dirty.
    ///
    /// Returns `Some(token)` when sorting resolved to backend mode: the
    /// mapping is left filtered-but-unsorted until the caller later hands
    /// the backend's row order to `accept_external_mapping`. `visible_columns`
    /// is the grid's current visible-column-in-order list, used as the quick
    /// filter's default target set.
    pub fn recompute<S: RowSource>(
        &mut self,
        source: &S,
        filter: &mut FilterEngine,
        sort: &mut SortManager,
        visible_columns: &[crate::cell::ColId],
    ) -> Option<RequestToken> {
        if !self.dirty {
            return None;
        }
        let total = source.row_count();
        let filter_active = !filter.state().is_empty();
        let sort_active = !sort.keys().is_empty();

        if !filter_active && !sort_active {
            self.mapping = VisibleRowMapping { rows: None };
            self.dirty = false;
            return None;
        }

        let filtered: Vec<RowId> = if filter_active {
            (0..total as u32)
                .map(RowId)
                .filter(|&r| filter.matches_frontend(source, r, visible_columns))
                .collect()
        } else {
            (0..total as u32).map(RowId).collect()
        };

        if sort_active {
            let mut index_map = IndexMap::default();
            index_map.set(filtered);
            let pending_token = sort.apply(source, &mut index_map).err();
            self.mapping = VisibleRowMapping {
                rows: Some(index_map.as_slice().to_vec()),
            };
            self.dirty = false;
            pending_token
        } else {
            self.mapping = VisibleRowMapping { rows: Some(filtered) };
            self.dirty = false;
            None
        }
    }

    /// Installs a row order computed off-thread (a backend sort or filter
    /// response) as the current mapping directly, bypassing `recompute`.
    pub fn accept_external_mapping(&mut self, rows: Vec<RowId>) {
        self.mapping = VisibleRowMapping { rows: Some(rows) };
        self.dirty = false;
    }

    /// Appends newly loaded rows through the filter only (incremental),
    /// leaving the already
    /// computed prefix alone. Sort is deliberately NOT re-run here — a full
    /// re-sort of the whole mapping is the caller's job via
    /// `invalidate_sort` if exact order across old+new rows matters more
    /// than append-speed; this path favors O(new rows) append.
    pub fn append_rows<S: RowSource>(
        &mut self,
        source: &S,
        filter: &mut FilterEngine,
        new_rows: &[RowId],
        visible_columns: &[crate::cell::ColId],
    ) {
        let accepted: Vec<RowId> = new_rows
            .iter()
            .copied()
            .filter(|&r| filter.state().is_empty() || filter.matches_frontend(source, r, visible_columns))
            .collect();
        match &mut self.mapping.rows {
            Some(rows) => rows.extend(accepted),
            None => {
                // identity mapping: materialize explicitly now that an
                // append means "identity over old rows" no longer implies
                // "identity over old+new" once a filter is active.
                if !accepted.is_empty() {
                    let mut rows: Vec<RowId> = (0..source.row_count() as u32 - new_rows.len() as u32).map(RowId).collect();
                    rows.extend(accepted);
                    self.mapping.rows = Some(rows);
                }
            }
        }
    }

    pub fn visible_row_count(&self, total_rows: usize) -> usize {
        self.mapping.len(total_rows)
    }

    pub fn map_visual_to_data(&self, visual: usize, total_rows: usize) -> Option<RowId> {
        self.mapping.get(visual, total_rows)
    }
}

impl Default for ProjectionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
