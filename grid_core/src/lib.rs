//! Virtualized tabular data grid computational core.
//!
//! Pure logic: no GUI, no I/O. A host wires this crate's `Grid` to its own
//! rendering layer through the `RowSource`/`Renderer`/`FrameScheduler`
//! traits (`row_source.rs`), and to its own backing store through
//! `grid_csv` or an equivalent `RowSource` implementation.

pub mod auxindex;
pub mod cache;
pub mod cell;
pub mod column;
pub mod config;
pub mod error;
pub mod events;
pub mod fenwick;
pub mod filter;
pub mod index_map;
pub mod infinite;
pub mod pipeline;
pub mod pool;
pub mod positioner;
pub mod renderer_cache;
pub mod request;
pub mod row_source;
pub mod scroll;
pub mod scroller;
pub mod snapshot;
pub mod sort;

use cell::{Cell, CellCoord, CellFingerprint, ColId, RowId};
use column::{ColumnDef, ColumnModel};
use config::GridConfig;
use error::{GridResult, StateError, ValidationError};
use events::{EventBus, EventSink, GridEvent};
use filter::{FilterState, FilterTransition};
use index_map::IndexMap;
use infinite::InfiniteScrollController;
use pipeline::ProjectionPipeline;
use pool::CellPool;
use positioner::{CellPositioner, PositionOp};
use renderer_cache::RendererCache;
use request::RequestToken;
use row_source::{FrameScheduler, Renderer, RowSource};
use scroll::{ScrollModel, ViewportModel};
use scroller::{RowHeightMode, VirtualScroller};
use sort::SortManager;

/// The grid's full runtime state, composing every component per the
/// data-flow:
/// `RowSource -> ColumnModel -> FilterEngine -> SortManager ->
/// (visible-row mapping) -> CellPositioner <- ViewportModel <- ScrollModel`.
pub struct Grid<A> {
    columns: ColumnModel,
    scroll: ScrollModel,
    viewport: ViewportModel,
    scroller: VirtualScroller,
    pool: CellPool<A>,
    positioner: CellPositioner,
    renderer_cache: RendererCache<A>,
    filter: filter::FilterEngine,
    sort: SortManager,
    pipeline: ProjectionPipeline,
    infinite: Option<InfiniteScrollController>,
    events: EventBus,
    destroyed: bool,
    /// Backend sort request issued by the most recent `toggle_sort`/
    /// `set_filter_state` call that triggered a re-sort, until resolved by
    /// `apply_sort_backend_result`/`reject_sort_backend_result`.
    pending_sort_token: Option<RequestToken>,
    /// Infinite-scroll load request raised by the most recent viewport
    /// update, until resolved by `apply_loaded_rows`/`reject_load_request`.
    pending_load_token: Option<RequestToken>,
}

impl<A> Grid<A> {
    pub fn new(config: GridConfig, column_defs: impl IntoIterator<Item = ColumnDef>) -> GridResult<Self> {
        config.validate()?;

        let columns = ColumnModel::new(column_defs);
        let row_height_mode = match config.row_height_mode {
            config::RowHeightModeConfig::Uniform => RowHeightMode::Uniform(config.row_height),
            config::RowHeightModeConfig::ContentAware => {
                RowHeightMode::ContentAware(fenwick::Fenwick::new(&vec![
                    config.row_height_config.default_height;
                    config.row_count.max(0) as usize
                ]))
            }
        };
        let mut scroller = VirtualScroller::new(config.row_count.max(0) as usize, row_height_mode);
        scroller.set_overscan(config.overscan_rows.max(0) as usize, config.overscan_cols.max(0) as usize);
        let widths: Vec<f32> = columns.visible_columns_in_order().iter().map(|c| c.width).collect();
        scroller.recompute_columns(&widths);

        let pool_capacity = (config.col_count + 1)
            * (config.overscan_rows.max(0) as usize * 2 + 16);
        let pool = CellPool::new(pool_capacity.max(1));

        let renderer_cache = RendererCache::new(if config.renderer_cache.enabled {
            config.renderer_cache.capacity
        } else {
            1
        })?;

        let filter = filter::FilterEngine::new(config.filter_mode);
        let sort = SortManager::new(config.sort_mode);

        let infinite = config.infinite_scrolling.enabled.then(|| {
            let ctrl = InfiniteScrollController::new(config.infinite_scrolling.threshold);
            if config.infinite_scrolling.enable_sliding_window {
                ctrl.with_sliding_window(infinite::SlidingWindowConfig {
                    window_size: config.infinite_scrolling.window_size,
                    prune_threshold: config.infinite_scrolling.prune_threshold,
                })
            } else {
                ctrl
            }
        });

        Ok(Grid {
            columns,
            scroll: ScrollModel::default(),
            viewport: ViewportModel::default(),
            scroller,
            pool,
            positioner: CellPositioner::new(),
            renderer_cache,
            filter,
            sort,
            pipeline: ProjectionPipeline::new(),
            infinite,
            events: EventBus::new(),
            destroyed: false,
            pending_sort_token: None,
            pending_load_token: None,
        })
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.events.subscribe(sink);
    }

    fn check_alive(&self) -> GridResult<()> {
        if self.destroyed {
            Err(error::GridError::State(StateError::Destroyed))
        } else {
            Ok(())
        }
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub fn columns(&self) -> &ColumnModel {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ColumnModel {
        &mut self.columns
    }

    /// Captures the persistable `{columns, sort, filter}` state snapshot.
    pub fn capture_snapshot(&self) -> snapshot::GridSnapshot {
        snapshot::capture(&self.columns, &self.sort, self.filter.state())
    }

    /// Applies a previously captured snapshot atomically: column
    /// width/visibility/order changes coalesce into a single
    /// `ColumnModel::batch_update` emission, sort/filter state are replaced
    /// wholesale, and the projection is recomputed once. Applying a
    /// grid's own just-captured snapshot is a no-op for the resulting
    /// projection.
    pub fn apply_snapshot<S: RowSource>(&mut self, source: &S, snap: &snapshot::GridSnapshot) -> GridResult<()> {
        self.check_alive()?;
        let previous_filter = self.filter.state().clone();
        let previous_sort = self.sort.keys().to_vec();
        let restored_filter = snapshot::apply(snap, &mut self.columns, &mut self.sort);
        self.filter.set_state(restored_filter.clone())?;
        self.pipeline.invalidate_filter();
        self.pipeline.invalidate_sort();
        self.recompute_projection(source);
        self.events.emit(GridEvent::FilterChange { state: restored_filter, previous: previous_filter });
        self.events.emit(GridEvent::SortChange { state: self.sort.keys().to_vec(), previous: previous_sort });
        Ok(())
    }

    /// Replaces the active filter state and recomputes the projection.
    /// Frontend mode applies immediately; backend mode returns the request
    /// token the caller must eventually resolve with
    /// `apply_filter_backend_result`/`reject_filter_backend_result`.
    pub fn set_filter_state<S: RowSource>(&mut self, source: &S, state: FilterState) -> GridResult<FilterTransition> {
        self.check_alive()?;
        let previous = self.filter.state().clone();
        self.events.emit(GridEvent::FilterBeforeFilter { state: state.clone() });
        let transition = self.filter.set_state(state.clone())?;
        if matches!(transition, FilterTransition::AppliedLocally) {
            self.pipeline.invalidate_filter();
            self.recompute_projection(source);
            let total = source.row_count();
            let visible = self.pipeline.visible_row_count(total);
            self.events.emit(GridEvent::FilterChange { state, previous });
            self.events.emit(GridEvent::FilterAfterFilter {
                rows_visible: visible,
                rows_hidden: total.saturating_sub(visible),
            });
        }
        Ok(transition)
    }

    /// Applies a backend's filtered row-id response (if `token` is still
    /// current) and, when a frontend sort is also active, re-sorts the
    /// result locally before installing it as the new mapping. Emits
    /// `FilterAfterFilter` on success.
    pub fn apply_filter_backend_result<S: RowSource>(
        &mut self,
        source: &S,
        token: RequestToken,
        result: Vec<RowId>,
    ) -> bool {
        let Some(rows) = self.filter.apply_backend_result(token, result) else {
            return false;
        };
        self.install_filtered_rows(source, rows);
        for error in self.sort.take_errors() {
            self.events.emit(GridEvent::SortError(error));
        }
        let total = source.row_count();
        let visible = self.pipeline.visible_row_count(total);
        self.events.emit(GridEvent::FilterAfterFilter {
            rows_visible: visible,
            rows_hidden: total.saturating_sub(visible),
        });
        true
    }

    /// Rejects a backend filter response, restoring the filter state in
    /// effect before the request and emitting `backend:error`.
    pub fn reject_filter_backend_result<S: RowSource>(&mut self, source: &S, token: RequestToken, reason: String) -> bool {
        let Some(restored) = self.filter.reject_backend_result(token) else {
            return false;
        };
        self.events.emit(GridEvent::BackendError(reason));
        self.pipeline.invalidate_filter();
        self.recompute_projection(source);
        self.events.emit(GridEvent::FilterChange { state: restored.clone(), previous: restored });
        true
    }

    /// Serializes the active filter state to REST/GraphQL/SQL form and
    /// emits `filter:export{rest, graphql, sql}` with the result, for a
    /// host that delegates filtering to a backend query.
    pub fn export_filter(&mut self) {
        let rest = self.filter.to_rest();
        let graphql = events::GraphQlFilterExport(self.filter.to_graphql());
        let sql = self.filter.to_sql();
        self.events.emit(GridEvent::FilterExport { rest, graphql, sql });
    }

    fn install_filtered_rows<S: RowSource>(&mut self, source: &S, rows: Vec<RowId>) {
        if self.sort.keys().is_empty() {
            self.pipeline.accept_external_mapping(rows);
            return;
        }
        let mut index_map = IndexMap::default();
        index_map.set(rows);
        match self.sort.apply(source, &mut index_map) {
            Ok(_) => self.pipeline.accept_external_mapping(index_map.as_slice().to_vec()),
            Err(token) => {
                self.pipeline.accept_external_mapping(index_map.as_slice().to_vec());
                self.pending_sort_token = Some(token);
            }
        }
    }

    fn recompute_projection<S: RowSource>(&mut self, source: &S) {
        let visible: Vec<ColId> = self.columns.visible_columns_in_order().iter().map(|c| c.id()).collect();
        if let Some(token) = self.pipeline.recompute(source, &mut self.filter, &mut self.sort, &visible) {
            self.pending_sort_token = Some(token);
        }
        for error in self.sort.take_errors() {
            self.events.emit(GridEvent::SortError(error));
        }
    }

    /// Backend sort/filter request still awaiting resolution, if any.
    pub fn pending_sort_request(&self) -> Option<RequestToken> {
        self.pending_sort_token
    }

    /// Toggles a column's sort direction per the none/asc/desc cycle and
    /// recomputes the projection. `SortChange` reflects the new key list
    /// immediately regardless of mode; when resolved to backend mode the
    /// returned token must be resolved with `apply_sort_backend_result`/
    /// `reject_sort_backend_result` before the row order itself updates.
    pub fn toggle_sort<S: RowSource>(&mut self, source: &S, column: ColId) -> Option<RequestToken> {
        let previous = self.sort.keys().to_vec();
        self.sort.toggle_column(column);
        self.pipeline.invalidate_sort();
        self.recompute_projection(source);
        self.events.emit(GridEvent::SortChange { state: self.sort.keys().to_vec(), previous });
        self.pending_sort_token
    }

    /// Applies a backend's row-order response (if `token` is still
    /// current) as the new projection.
    pub fn apply_sort_backend_result(&mut self, order: Vec<RowId>, token: RequestToken) -> bool {
        let mut index_map = IndexMap::default();
        index_map.set(order.clone());
        if self.sort.apply_backend_result(token, order, &mut index_map) {
            self.pipeline.accept_external_mapping(index_map.as_slice().to_vec());
            self.pending_sort_token = None;
            true
        } else {
            false
        }
    }

    /// Rejects a backend sort response, restoring the key list in effect
    /// before the request and emitting `backend:error`.
    pub fn reject_sort_backend_result<S: RowSource>(&mut self, source: &S, token: RequestToken, reason: String) -> bool {
        let previous = self.sort.keys().to_vec();
        let Some(restored) = self.sort.reject_backend_result(token) else {
            return false;
        };
        self.events.emit(GridEvent::BackendError(reason));
        self.pending_sort_token = None;
        self.pipeline.invalidate_sort();
        self.recompute_projection(source);
        self.events.emit(GridEvent::SortChange { state: restored, previous });
        true
    }

    /// Infinite-scroll load request raised by the most recent `run_frame`
    /// viewport update, if the visible range has crossed the configured
    /// threshold and no load is already in flight. The host is expected
    /// to invoke its own `onLoadMoreRows`, append the
    /// result to `source`, then resolve with `apply_loaded_rows` or
    /// `reject_load_request`.
    pub fn pending_load_request(&self) -> Option<RequestToken> {
        self.pending_load_token
    }

    /// Applies the host's `onLoadMoreRows` response. `loaded` is exactly
    /// the rows the host appended to `source`; `previous_row_count` is
    /// `source.row_count()` as it stood before that append (the same
    /// `currentCount` value the host's callback received). Recomputes the
    /// projection to cover the appended rows and emits `data:pruned` if the
    /// sliding window fired. Returns `false` if `token` was superseded by a
    /// later request (the response is discarded).
    pub fn apply_loaded_rows<S: RowSource>(
        &mut self,
        source: &S,
        token: RequestToken,
        loaded: Vec<RowId>,
        previous_row_count: usize,
    ) -> bool {
        let Some(ctrl) = self.infinite.as_mut() else { return false };
        let Some((appended, pruned)) = ctrl.apply_loaded_rows(token, loaded, previous_row_count) else {
            return false;
        };
        self.pending_load_token = None;
        if !appended.is_empty() {
            if self.sort.keys().is_empty() {
                // Filter incremental, append-only fast path.
                let visible: Vec<ColId> = self.columns.visible_columns_in_order().iter().map(|c| c.id()).collect();
                self.pipeline.append_rows(source, &mut self.filter, &appended, &visible);
            } else {
                // a sort is active: the new rows must take their place in
                // the existing order, which needs a full re-permute.
                self.pipeline.invalidate_filter();
                self.pipeline.invalidate_sort();
                self.recompute_projection(source);
            }
        }
        if let Some(event) = pruned {
            self.events.emit(GridEvent::DataPruned(event));
        }
        true
    }

    /// Rejects a failed/stale `onLoadMoreRows` response: clears the
    /// in-flight slot (so a later load may start) and emits `backend:error`.
    /// No rows are appended and `hasMore`/`virtualOffset` are untouched.
    pub fn reject_load_request(&mut self, token: RequestToken, reason: String) -> bool {
        let Some(ctrl) = self.infinite.as_mut() else { return false };
        if !ctrl.reject(token) {
            return false;
        }
        self.pending_load_token = None;
        self.events.emit(GridEvent::BackendError(reason));
        true
    }

    /// Emits `cell:click` for the given visual coordinate.
    pub fn click(&mut self, coord: CellCoord) {
        self.events.emit(GridEvent::CellClick(coord));
    }

    /// Emits `cell:dblclick` for the given visual coordinate.
    pub fn double_click(&mut self, coord: CellCoord) {
        self.events.emit(GridEvent::CellDoubleClick(coord));
    }

    /// Emits `edit:start` for the given visual coordinate.
    pub fn start_edit(&mut self, coord: CellCoord) {
        self.events.emit(GridEvent::EditStart(coord));
    }

    /// Commits an edit after running `validate`. On rejection emits
    /// `edit:invalid` and, per the default host policy, blocks the commit
    /// and retains the editor — the caller should not emit
    /// `edit:end` in that case. On acceptance emits `edit:commit` then
    /// `edit:end`.
    pub fn commit_edit(
        &mut self,
        coord: CellCoord,
        value: Cell,
        validate: impl FnOnce(&Cell) -> Result<(), String>,
    ) -> Result<(), ValidationError> {
        if let Err(reason) = validate(&value) {
            self.events.emit(GridEvent::EditInvalid { coord, reason: reason.clone() });
            return Err(ValidationError::Rejected { col: coord.col, reason });
        }
        self.events.emit(GridEvent::EditCommit { coord, value });
        self.events.emit(GridEvent::EditEnd(coord));
        Ok(())
    }

    /// Cancels an in-progress edit, emitting `edit:cancel` then `edit:end`.
    pub fn cancel_edit(&mut self, coord: CellCoord) {
        self.events.emit(GridEvent::EditCancel(coord));
        self.events.emit(GridEvent::EditEnd(coord));
    }

    pub fn visible_row_count<S: RowSource>(&self, source: &S) -> usize {
        self.pipeline.visible_row_count(source.row_count())
    }

    pub fn map_visual_to_data<S: RowSource>(&self, source: &S, visual: usize) -> Option<RowId> {
        self.pipeline.map_visual_to_data(visual, source.row_count())
    }

    /// Reads a cell by visual coordinate, resolving through the projection.
    pub fn cell<S: RowSource>(&self, source: &S, visual: CellCoord) -> GridResult<Cell> {
        let data_row = self
            .map_visual_to_data(source, visual.row.0 as usize)
            .ok_or(error::GridError::Bounds(error::BoundsError::VisualIndex {
                index: visual.row.0 as usize,
                len: self.visible_row_count(source),
            }))?;
        let data_col = self
            .columns
            .data_index(visual.col.0 as usize)
            .ok_or(error::GridError::Bounds(error::BoundsError::Column { col: visual.col }))?;
        Ok(source.cell(data_row, data_col))
    }

    /// Drives scroll + viewport recomputation and the resulting
    /// mount/unmount/update diff; call once per frame from the host's
    /// `scheduleFrame` hook via `Self::run_frame`. `update` ops are only
    /// emitted for persisted coordinates whose fingerprint actually
    /// changed, compared against what `pool` last rendered there.
    fn recompute_viewport<S: RowSource>(
        &mut self,
        source: &S,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Option<Vec<PositionOp>> {
        let resized = self.viewport.set_viewport_size(viewport_width, viewport_height);
        let position = self.scroll.flush();
        let Some(position) = position.or_else(|| resized.then_some(self.scroll.position())) else {
            return None;
        };

        let columns = self.columns.visible_columns_in_order();
        let col_ids: Vec<ColId> = columns.iter().map(|c| c.id()).collect();
        let widths: Vec<f32> = columns.iter().map(|c| c.width).collect();
        self.scroller.recompute_columns(&widths);

        let event = self.viewport.update(position, &self.scroller, resized)?;
        self.events.emit(match event.kind {
            scroll::ViewportEventKind::Resize => GridEvent::ViewportResize { old: event.old_range, new: event.new_range },
            _ => GridEvent::ViewportRange { old: event.old_range, new: event.new_range },
        });

        if let Some(ctrl) = self.infinite.as_mut() {
            if let Some(token) = ctrl.maybe_request_more(event.new_range, source.row_count()) {
                self.pending_load_token = Some(token);
            }
        }

        let pool = &self.pool;
        let pipeline = &self.pipeline;
        let fingerprint_changed = |coord: (usize, usize)| {
            let row = match pipeline.map_visual_to_data(coord.0, source.row_count()) {
                Some(row) => row,
                None => return false,
            };
            let col = match col_ids.get(coord.1) {
                Some(&col) => col,
                None => return false,
            };
            let width = widths.get(coord.1).copied().unwrap_or(0.0);
            let cell = source.cell(row, col);
            let fresh = CellFingerprint::new(0, width, &cell, 0);
            pool.fingerprint_for_coord(coord) != Some(&fresh)
        };
        let ops = self.positioner.diff(event.new_range, fingerprint_changed);
        Some(ops)
    }

    /// Runs the scheduler once: recomputes viewport/positioner state and
    /// applies the resulting mount/unmount/update ops against the cell pool
    /// and renderer cache via `renderer`.
    pub fn run_frame<S, R>(
        &mut self,
        source: &S,
        renderer: &mut R,
        scheduler: &mut dyn FrameScheduler,
        viewport_width: f32,
        viewport_height: f32,
    ) where
        S: RowSource,
        R: Renderer<Artifact = A>,
    {
        let ops = self.recompute_viewport(source, viewport_width, viewport_height);
        let Some(ops) = ops else { return };
        let columns = self.columns.visible_columns_in_order();
        let col_ids: Vec<ColId> = columns.iter().map(|c| c.id()).collect();
        let widths: Vec<f32> = columns.iter().map(|c| c.width).collect();
        let renderer_cache = &mut self.renderer_cache;
        let pool = &mut self.pool;
        let pipeline = &self.pipeline;
        let row_count = source.row_count();

        scheduler.schedule_frame(Box::new(move || {
            for op in ops {
                match op {
                    PositionOp::Unmount(coord) => pool.release(coord),
                    PositionOp::Mount(coord) | PositionOp::Update(coord) => {
                        if let (Some(row), Some(&col)) =
                            (pipeline.map_visual_to_data(coord.0, row_count), col_ids.get(coord.1))
                        {
                            let cell = source.cell(row, col);
                            let width = widths.get(coord.1).copied().unwrap_or(0.0);
                            let fp = CellFingerprint::new(0, width, &cell, 0);
                            if let Some(idx) = pool.acquire(coord, &|_c| true) {
                                renderer_cache.get_or_render(fp.clone(), renderer, &cell, col);
                                if let Some(slot) = pool.slot_mut(idx) {
                                    slot.set_fingerprint(Some(fp));
                                }
                            }
                        }
                    }
                }
            }
        }));
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

    fn source() -> Rows {
        Rows(vec![
            vec![Cell::Text("b".into())],
            vec![Cell::Text("a".into())],
        ])
    }

    #[test]
    fn new_grid_defaults_to_identity_projection() {
        let config = GridConfig::builder().row_count(2).col_count(1).build().unwrap();
        let grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = source();
        assert_eq!(grid.visible_row_count(&src), 2);
        assert_eq!(grid.map_visual_to_data(&src, 0), Some(RowId(0)));
    }

    #[test]
    fn toggle_sort_reorders_projection() {
        let config = GridConfig::builder().row_count(2).col_count(1).build().unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = source();
        grid.toggle_sort(&src, ColId(0));
        assert_eq!(grid.map_visual_to_data(&src, 0), Some(RowId(1)));
    }

    #[test]
    fn nan_comparator_failure_emits_sort_error_event() {
        let config = GridConfig::builder().row_count(2).col_count(1).build().unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = Rows(vec![vec![Cell::Number(f64::NAN)], vec![Cell::Number(1.0)]]);
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_in_sink = seen.clone();
        grid.subscribe(Box::new(move |e: &GridEvent| {
            if let GridEvent::SortError(err) = e {
                seen_in_sink.borrow_mut().push(*err);
            }
        }));
        grid.toggle_sort(&src, ColId(0));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].column, ColId(0));
    }

    #[test]
    fn destroyed_grid_rejects_filter_state_changes() {
        let config = GridConfig::builder().row_count(2).col_count(1).build().unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        grid.destroy();
        let src = source();
        assert!(grid.set_filter_state(&src, FilterState::default()).is_err());
    }

    #[test]
    fn backend_sort_request_is_surfaced_and_applies_on_resolution() {
        let config = GridConfig::builder()
            .row_count(2)
            .col_count(1)
            .sort_mode(sort::SortMode::Backend)
            .build()
            .unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = source();
        let token = grid.toggle_sort(&src, ColId(0)).expect("backend mode must return a token");
        assert_eq!(grid.pending_sort_request(), Some(token));
        // row order is unchanged until the backend result arrives.
        assert_eq!(grid.map_visual_to_data(&src, 0), Some(RowId(0)));

        assert!(grid.apply_sort_backend_result(vec![RowId(1), RowId(0)], token));
        assert_eq!(grid.pending_sort_request(), None);
        assert_eq!(grid.map_visual_to_data(&src, 0), Some(RowId(1)));
    }

    #[test]
    fn rejected_backend_sort_restores_previous_order() {
        let config = GridConfig::builder()
            .row_count(2)
            .col_count(1)
            .sort_mode(sort::SortMode::Backend)
            .build()
            .unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = source();
        let token = grid.toggle_sort(&src, ColId(0)).unwrap();
        assert!(grid.reject_sort_backend_result(&src, token, "upstream unavailable".into()));
        assert_eq!(grid.pending_sort_request(), None);
        assert_eq!(grid.map_visual_to_data(&src, 0), Some(RowId(0)));
    }

    #[test]
    fn run_frame_mounts_visible_cells() {
        // Column geometry must be populated before the first viewport
        // computation, or `visible_range` takes the `col_count == 0`
        // branch and no cell is ever mounted.
        let config = GridConfig::builder().row_count(10).col_count(2).build().unwrap();
        let mut grid: Grid<()> =
            Grid::new(config, vec![ColumnDef::new(ColId(0), "a"), ColumnDef::new(ColId(1), "b")]).unwrap();
        let src = Rows((0..10).map(|i| vec![Cell::Number(i as f64), Cell::Number(i as f64)]).collect());
        let mut scheduler = row_source::ImmediateScheduler;
        struct NullRenderer;
        impl Renderer for NullRenderer {
            type Artifact = ();
            fn render(&mut self, _cell: &Cell, _col: ColId, _fp: &CellFingerprint) {}
        }
        let mut renderer = NullRenderer;
        grid.run_frame(&src, &mut renderer, &mut scheduler, 200.0, 100.0);
        assert!(grid.pool.mounted_count() > 0, "first frame must mount at least one cell");
    }

    #[test]
    fn infinite_scroll_request_surfaces_on_scroll_near_end_and_resolves() {
        let config = GridConfig::builder()
            .row_count(20)
            .col_count(1)
            .infinite_scrolling(config::InfiniteScrollingConfig {
                enabled: true,
                threshold: 5,
                enable_sliding_window: false,
                window_size: 0,
                prune_threshold: 0,
            })
            .build()
            .unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = Rows((0..20).map(|i| vec![Cell::Number(i as f64)]).collect());
        let mut scheduler = row_source::ImmediateScheduler;
        struct NullRenderer;
        impl Renderer for NullRenderer {
            type Artifact = ();
            fn render(&mut self, _cell: &Cell, _col: ColId, _fp: &CellFingerprint) {}
        }
        let mut renderer = NullRenderer;
        grid.run_frame(&src, &mut renderer, &mut scheduler, 200.0, 400.0);
        let token = grid.pending_load_request().expect("near end of 20 rows must request more");
        assert!(grid.apply_loaded_rows(&src, token, vec![RowId(20), RowId(21)], 20));
        assert_eq!(grid.pending_load_request(), None);
    }

    #[test]
    fn quick_filter_matches_across_two_columns_not_named_by_any_column_filter() {
        // Names ["Alice","Bob","Charlie"], quick filter "li" must select
        // rows 0 and 2. Here the name lives in column 1 while no
        // `ColumnFilter` targets either column, exercising the "all visible
        // columns" default rather than a hardcoded single column.
        let config = GridConfig::builder().row_count(3).col_count(2).build().unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "id"), ColumnDef::new(ColId(1), "name")])
            .unwrap();
        let src = Rows(vec![
            vec![Cell::Number(1.0), Cell::Text("Alice".into())],
            vec![Cell::Number(2.0), Cell::Text("Bob".into())],
            vec![Cell::Number(3.0), Cell::Text("Charlie".into())],
        ]);
        grid.set_filter_state(
            &src,
            FilterState {
                columns: vec![],
                quick: filter::QuickFilter { text: "li".into(), columns: None },
            },
        )
        .unwrap();
        assert_eq!(grid.visible_row_count(&src), 2);
        assert_eq!(grid.map_visual_to_data(&src, 0), Some(RowId(0)));
        assert_eq!(grid.map_visual_to_data(&src, 1), Some(RowId(2)));
    }

    #[test]
    fn capture_then_apply_snapshot_is_a_no_op_for_the_projection() {
        let config = GridConfig::builder().row_count(2).col_count(1).build().unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = source();
        grid.toggle_sort(&src, ColId(0));
        let before: Vec<_> = (0..2).map(|i| grid.map_visual_to_data(&src, i)).collect();

        let snap = grid.capture_snapshot();
        grid.apply_snapshot(&src, &snap).unwrap();

        let after: Vec<_> = (0..2).map(|i| grid.map_visual_to_data(&src, i)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn export_filter_emits_filter_export_event() {
        let config = GridConfig::builder().row_count(2).col_count(1).build().unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let src = source();
        grid.set_filter_state(
            &src,
            FilterState {
                columns: vec![],
                quick: filter::QuickFilter { text: "a".into(), columns: None },
            },
        )
        .unwrap();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(false));
        let seen_in_sink = seen.clone();
        grid.subscribe(Box::new(move |e: &GridEvent| {
            if matches!(e, GridEvent::FilterExport { .. }) {
                *seen_in_sink.borrow_mut() = true;
            }
        }));
        grid.export_filter();
        assert!(*seen.borrow());
    }

    #[test]
    fn invalid_edit_is_rejected_and_valid_edit_commits() {
        let config = GridConfig::builder().row_count(2).col_count(1).build().unwrap();
        let mut grid: Grid<()> = Grid::new(config, vec![ColumnDef::new(ColId(0), "c0")]).unwrap();
        let coord = CellCoord::new(RowId(0), ColId(0));
        let rejected = grid.commit_edit(coord, Cell::Text("x".into()), |_| Err("not numeric".into()));
        assert!(rejected.is_err());

        let accepted = grid.commit_edit(coord, Cell::Number(1.0), |_| Ok(()));
        assert!(accepted.is_ok());
    }
}
