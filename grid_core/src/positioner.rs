//! `CellPositioner`: diffs previous vs. new visible range and issues
//! mount/update/unmount operations.
//!
//! Ordering guarantee: unmounts precede mounts within a single tick, so
//! pool slots can be reclaimed before new coordinates claim them.
//! Cancellation: a new range event received before the previous tick's
//! diff completes supersedes it — the diff itself is always a single
//! synchronous pass, never concurrent.

use crate::scroll::VisibleRange;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PositionOp {
    Mount((usize, usize)),
    Update((usize, usize)),
    Unmount((usize, usize)),
}

#[derive(Default)]
pub struct CellPositioner {
    previous_range: Option<VisibleRange>,
}

impl CellPositioner {
    pub fn new() -> Self {
        CellPositioner::default()
    }

    pub fn previous_range(&self) -> Option<VisibleRange> {
        self.previous_range
    }

    /// Computes `unmount(exit)`, `mount(enter)`, then `update(persist)` for
    /// cells whose fingerprint changed, in that order. `fingerprint_changed`
    /// is consulted only for persisted coordinates.
    pub fn diff<F>(&mut self, new_range: VisibleRange, fingerprint_changed: F) -> Vec<PositionOp>
    where
        F: Fn((usize, usize)) -> bool,
    {
        let old_range = self.previous_range.unwrap_or_default();
        let had_previous = self.previous_range.is_some();

        let mut ops = Vec::new();

        if had_previous {
            for coord in old_range.rows().flat_map(|r| old_range.cols().map(move |c| (r, c))) {
                if !new_range.contains(coord.0, coord.1) {
                    ops.push(PositionOp::Unmount(coord));
                }
            }
        }

        for coord in new_range.rows().flat_map(|r| new_range.cols().map(move |c| (r, c))) {
            let was_visible = had_previous && old_range.contains(coord.0, coord.1);
            if !was_visible {
                ops.push(PositionOp::Mount(coord));
            }
        }

        if had_previous {
            for coord in new_range.rows().flat_map(|r| new_range.cols().map(move |c| (r, c))) {
                if old_range.contains(coord.0, coord.1) && fingerprint_changed(coord) {
                    ops.push(PositionOp::Update(coord));
                }
            }
        }

        self.previous_range = Some(new_range);
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(r0: usize, r1: usize, c0: usize, c1: usize) -> VisibleRange {
        VisibleRange {
            start_row: r0,
            end_row: r1,
            start_col: c0,
            end_col: c1,
        }
    }

    #[test]
    fn first_diff_mounts_everything() {
        let mut p = CellPositioner::new();
        let ops = p.diff(range(0, 2, 0, 2), |_| false);
        assert_eq!(ops.len(), 4);
        assert!(ops.iter().all(|op| matches!(op, PositionOp::Mount(_))));
    }

    #[test]
    fn unmounts_precede_mounts() {
        let mut p = CellPositioner::new();
        p.diff(range(0, 2, 0, 1), |_| false);
        let ops = p.diff(range(1, 3, 0, 1), |_| false);
        let first_mount = ops.iter().position(|op| matches!(op, PositionOp::Mount(_)));
        let last_unmount = ops.iter().rposition(|op| matches!(op, PositionOp::Unmount(_)));
        if let (Some(fm), Some(lu)) = (first_mount, last_unmount) {
            assert!(lu < fm, "all unmounts must precede all mounts");
        }
    }

    #[test]
    fn persist_only_updates_on_fingerprint_change() {
        let mut p = CellPositioner::new();
        p.diff(range(0, 1, 0, 1), |_| false);
        let ops = p.diff(range(0, 1, 0, 1), |_| true);
        assert_eq!(ops, vec![PositionOp::Update((0, 0))]);
    }

    #[test]
    fn unchanged_persist_emits_nothing() {
        let mut p = CellPositioner::new();
        p.diff(range(0, 1, 0, 1), |_| false);
        let ops = p.diff(range(0, 1, 0, 1), |_| false);
        assert!(ops.is_empty());
    }
}
