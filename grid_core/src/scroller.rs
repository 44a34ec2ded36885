//! `VirtualScroller`: logical geometry authority. Maps scroll offsets and
//! column/row geometry to pixel positions and visible ranges; knows
//! nothing about rendering.

use crate::fenwick::Fenwick;
use crate::scroll::VisibleRange;

pub const DEFAULT_OVERSCAN_ROWS: usize = 5;
pub const DEFAULT_OVERSCAN_COLS: usize = 2;

#[derive(Clone, Debug)]
pub enum RowHeightMode {
    Uniform(f32),
    /// Per-row heights, content-aware mode, backed by a Fenwick tree for
    /// O(log n) prefix-sum lookup and O(log n) update.
    ContentAware(Fenwick),
}

pub struct VirtualScroller {
    effective_row_count: usize,
    row_height: RowHeightMode,
    /// Cumulative column offsets over the *visible* columns, length V+1.
    col_prefix: Vec<f32>,
    overscan_rows: usize,
    overscan_cols: usize,
}

impl VirtualScroller {
    pub fn new(effective_row_count: usize, row_height: RowHeightMode) -> Self {
        VirtualScroller {
            effective_row_count,
            row_height,
            col_prefix: vec![0.0],
            overscan_rows: DEFAULT_OVERSCAN_ROWS,
            overscan_cols: DEFAULT_OVERSCAN_COLS,
        }
    }

    pub fn set_overscan(&mut self, rows: usize, cols: usize) {
        self.overscan_rows = rows;
        self.overscan_cols = cols;
    }

    pub fn set_effective_row_count(&mut self, n: usize) {
        self.effective_row_count = n;
    }

    pub fn effective_row_count(&self) -> usize {
        self.effective_row_count
    }

    pub fn set_row_height(&mut self, row: usize, height: f32) {
        if let RowHeightMode::ContentAware(fenwick) = &mut self.row_height {
            if row < fenwick.len() {
                fenwick.set(row, height);
            }
        }
    }

    pub fn push_row_height(&mut self, height: f32) {
        if let RowHeightMode::ContentAware(fenwick) = &mut self.row_height {
            fenwick.push(height);
        }
    }

    pub fn drop_row_height_prefix(&mut self, count: usize) {
        if let RowHeightMode::ContentAware(fenwick) = &mut self.row_height {
            fenwick.drop_prefix(count);
        }
    }

    /// Recomputes column prefix sums in O(V), V = number of visible
    /// columns. Called whenever widths change.
    pub fn recompute_columns(&mut self, visible_widths: &[f32]) {
        let mut prefix = Vec::with_capacity(visible_widths.len() + 1);
        let mut acc = 0.0f32;
        prefix.push(0.0);
        for w in visible_widths {
            acc += w;
            prefix.push(acc);
        }
        self.col_prefix = prefix;
    }

    pub fn total_width(&self) -> f32 {
        self.col_prefix.last().copied().unwrap_or(0.0)
    }

    pub fn total_height(&self) -> f32 {
        match &self.row_height {
            RowHeightMode::Uniform(h) => h * self.effective_row_count as f32,
            RowHeightMode::ContentAware(fenwick) => fenwick.total(),
        }
    }

    fn row_offset(&self, row: usize) -> f32 {
        match &self.row_height {
            RowHeightMode::Uniform(h) => h * row as f32,
            RowHeightMode::ContentAware(fenwick) => fenwick.offset_of(row),
        }
    }

    fn row_height_of(&self, row: usize) -> f32 {
        match &self.row_height {
            RowHeightMode::Uniform(h) => *h,
            RowHeightMode::ContentAware(fenwick) => {
                if row < fenwick.len() {
                    fenwick.get(row)
                } else {
                    0.0
                }
            }
        }
    }

    /// `(x, y, w, h)` pixel rect for the cell at visual `(row, col)`.
    pub fn cell_position(&self, row: usize, col: usize) -> (f32, f32, f32, f32) {
        let x = self.col_prefix.get(col).copied().unwrap_or(0.0);
        let w = self
            .col_prefix
            .get(col + 1)
            .map(|next| next - x)
            .unwrap_or(0.0);
        let y = self.row_offset(row);
        let h = self.row_height_of(row);
        (x, y, w, h)
    }

    /// Finds the visible range intersecting
    /// `[scroll_top, scroll_top+viewport_height)` x
    /// `[scroll_left, scroll_left+viewport_width)`, pads with overscan, and
    /// clamps to `[0, effective_row_count)` / `[0, visible_col_count)`.
    pub fn visible_range(
        &self,
        scroll_top: f32,
        scroll_left: f32,
        viewport_width: f32,
        viewport_height: f32,
    ) -> VisibleRange {
        let row_count = self.effective_row_count;
        let (start_row, end_row) = if row_count == 0 {
            (0, 0)
        } else {
            let first = self.row_at_offset(scroll_top.max(0.0));
            let last = self.row_at_offset((scroll_top + viewport_height).max(0.0));
            let start = first.saturating_sub(self.overscan_rows);
            let end = (last + 1 + self.overscan_rows).min(row_count);
            (start, end.max(start))
        };

        let col_count = self.col_prefix.len().saturating_sub(1);
        let (start_col, end_col) = if col_count == 0 {
            (0, 0)
        } else {
            let first = self.col_at_offset(scroll_left.max(0.0));
            let last = self.col_at_offset((scroll_left + viewport_width).max(0.0));
            let start = first.saturating_sub(self.overscan_cols);
            let end = (last + 1 + self.overscan_cols).min(col_count);
            (start, end.max(start))
        };

        VisibleRange {
            start_row,
            end_row,
            start_col,
            end_col,
        }
    }

    fn row_at_offset(&self, target: f32) -> usize {
        match &self.row_height {
            RowHeightMode::Uniform(h) if *h > 0.0 => {
                ((target / h).floor() as isize).max(0) as usize
            }
            RowHeightMode::Uniform(_) => 0,
            RowHeightMode::ContentAware(fenwick) => {
                fenwick.row_at_offset(target).unwrap_or(0)
            }
        }
        .min(self.effective_row_count.saturating_sub(1).max(0))
    }

    fn col_at_offset(&self, target: f32) -> usize {
        // Binary search over the column prefix-sum array (O(log V)).
        let col_count = self.col_prefix.len().saturating_sub(1);
        if col_count == 0 {
            return 0;
        }
        let idx = self
            .col_prefix
            .partition_point(|&offset| offset <= target)
            .saturating_sub(1);
        idx.min(col_count - 1)
    }
}
