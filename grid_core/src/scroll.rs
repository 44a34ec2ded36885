//! `ScrollModel` + `ViewportModel`: reactive scroll position to visible
//! range derivation.
//!
//! `ScrollModel` holds raw `(top, left)` and throttles emission to "once
//! per frame" by exposing a dirty flag that the host drains via its
//! `scheduleFrame` hook rather than the core polling a clock itself
//! (scroll, like everything but the async backend callbacks, is
//! synchronous and host-driven).

use crate::scroller::VirtualScroller;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollPosition {
    pub top: f32,
    pub left: f32,
}

#[derive(Default)]
pub struct ScrollModel {
    current: ScrollPosition,
    dirty: bool,
}

impl ScrollModel {
    pub fn position(&self) -> ScrollPosition {
        self.current
    }

    /// Records a new scroll position. Does not emit immediately; marks
    /// dirty for the next `flush`.
    pub fn set(&mut self, top: f32, left: f32) {
        if (self.current.top - top).abs() > f32::EPSILON
            || (self.current.left - left).abs() > f32::EPSILON
        {
            self.current = ScrollPosition { top, left };
            self.dirty = true;
        }
    }

    /// Drains the dirty flag, returning the latest position if it changed
    /// since the last flush. Call once per frame from the host's
    /// `scheduleFrame` hook.
    pub fn flush(&mut self) -> Option<ScrollPosition> {
        if self.dirty {
            self.dirty = false;
            Some(self.current)
        } else {
            None
        }
    }
}

/// Half-open visible range, derived from scroll offsets and cumulative
/// column/row geometry plus overscan.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleRange {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl VisibleRange {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start_row..self.end_row
    }

    pub fn cols(&self) -> std::ops::Range<usize> {
        self.start_col..self.end_col
    }

    pub fn row_count(&self) -> usize {
        self.end_row.saturating_sub(self.start_row)
    }

    pub fn col_count(&self) -> usize {
        self.end_col.saturating_sub(self.start_col)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row < self.end_row && col >= self.start_col && col < self.end_col
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewportEventKind {
    Rows,
    Cols,
    Range,
    Resize,
}

#[derive(Clone, Debug)]
pub struct ViewportEvent {
    pub kind: ViewportEventKind,
    pub old_range: VisibleRange,
    pub new_range: VisibleRange,
}

/// Derived from `ScrollModel` + scroller geometry + column/row models;
/// recomputes the visible range and classifies what changed so
/// subscribers (`CellPositioner`, `InfiniteScrollController`, header) only
/// react to what actually moved.
#[derive(Default)]
pub struct ViewportModel {
    current_range: VisibleRange,
    viewport_width: f32,
    viewport_height: f32,
}

impl ViewportModel {
    pub fn current_range(&self) -> VisibleRange {
        self.current_range
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) -> bool {
        let changed = (self.viewport_width - width).abs() > f32::EPSILON
            || (self.viewport_height - height).abs() > f32::EPSILON;
        self.viewport_width = width;
        self.viewport_height = height;
        changed
    }

    /// Recomputes the range from the current scroll position and scroller
    /// geometry, returning an event iff something changed. Emits `Resize`
    /// when the caller reports a viewport-size change (checked via
    /// `set_viewport_size` beforehand), else classifies row-only,
    /// column-only, or both-changed as `Rows`/`Cols`/`Range`.
    pub fn update(
        &mut self,
        scroll: ScrollPosition,
        scroller: &VirtualScroller,
        resized: bool,
    ) -> Option<ViewportEvent> {
        let new_range = scroller.visible_range(scroll.top, scroll.left, self.viewport_width, self.viewport_height);
        let old_range = self.current_range;
        if new_range == old_range && !resized {
            return None;
        }
        let rows_changed = new_range.rows() != old_range.rows();
        let cols_changed = new_range.cols() != old_range.cols();
        let kind = if resized {
            ViewportEventKind::Resize
        } else if rows_changed && cols_changed {
            ViewportEventKind::Range
        } else if rows_changed {
            ViewportEventKind::Rows
        } else {
            ViewportEventKind::Cols
        };
        self.current_range = new_range;
        Some(ViewportEvent {
            kind,
            old_range,
            new_range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroller::{RowHeightMode, VirtualScroller};

    #[test]
    fn scroll_model_only_flushes_on_change() {
        let mut sm = ScrollModel::default();
        sm.set(10.0, 0.0);
        assert_eq!(sm.flush(), Some(ScrollPosition { top: 10.0, left: 0.0 }));
        assert_eq!(sm.flush(), None, "no change since last flush");
        sm.set(10.0, 0.0);
        assert_eq!(sm.flush(), None, "identical value is not a change");
    }

    #[test]
    fn viewport_event_classifies_row_only_change() {
        let mut scroller = VirtualScroller::new(1000, RowHeightMode::Uniform(20.0));
        scroller.recompute_columns(&[100.0, 100.0, 100.0]);
        let mut vm = ViewportModel::default();
        vm.set_viewport_size(300.0, 100.0);
        let first = vm.update(ScrollPosition { top: 0.0, left: 0.0 }, &scroller, true);
        assert!(matches!(first.unwrap().kind, ViewportEventKind::Resize));

        let second = vm.update(ScrollPosition { top: 500.0, left: 0.0 }, &scroller, false);
        assert!(matches!(second.unwrap().kind, ViewportEventKind::Rows));
    }
}
