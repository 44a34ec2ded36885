//! `InfiniteScrollController`: threshold detection, load requests,
//! sliding-window prune.
//!
//! Subscribes to `ViewportModel` range events; when the visible range nears
//! the end of the known row count, requests more rows through the host's
//! load-more callback boundary (represented here by `apply_loaded_rows`
//! being called back by the host, not by this type invoking a callback
//! itself — the core never owns the async call, only the token bookkeeping
//! around it, same pattern as `SortManager`/`FilterEngine`).

use crate::cell::RowId;
use crate::request::{LatestWins, RequestToken};
use crate::scroll::VisibleRange;

#[derive(Clone, Debug, PartialEq)]
pub struct DataPrunedEvent {
    pub dropped: usize,
    pub virtual_offset: u64,
}

#[derive(Copy, Clone, Debug)]
pub struct SlidingWindowConfig {
    pub window_size: usize,
    pub prune_threshold: usize,
}

pub struct InfiniteScrollController {
    threshold: usize,
    has_more: bool,
    tracker: LatestWins,
    window: Option<SlidingWindowConfig>,
    virtual_offset: u64,
}

impl InfiniteScrollController {
    pub fn new(threshold: usize) -> Self {
        InfiniteScrollController {
            threshold,
            has_more: true,
            tracker: LatestWins::default(),
            window: None,
            virtual_offset: 0,
        }
    }

    pub fn with_sliding_window(mut self, window: SlidingWindowConfig) -> Self {
        self.window = Some(window);
        self
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn virtual_offset(&self) -> u64 {
        self.virtual_offset
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.is_in_flight()
    }

    /// Called on every `ViewportEvent` carrying row-range information.
    /// Returns a request token when the range has crossed the threshold and
    /// no load is already in flight and more rows are believed to exist —
    /// the host is expected to issue the load and later call
    /// `apply_loaded_rows` with the same token.
    pub fn maybe_request_more(&mut self, new_range: VisibleRange, total_rows: usize) -> Option<RequestToken> {
        if self.tracker.is_in_flight() || !self.has_more {
            return None;
        }
        if new_range.end_row + self.threshold < total_rows {
            return None;
        }
        Some(self.tracker.start())
    }

    /// Applies the host's response. `loaded` empty means no more rows exist
    /// (`has_more` becomes `false`). Stale responses (superseded by a later
    /// request) are silently discarded. Returns the rows actually appended
    /// and, if the sliding window pruned a prefix, the resulting event.
    pub fn apply_loaded_rows(
        &mut self,
        token: RequestToken,
        loaded: Vec<RowId>,
        current_row_count: usize,
    ) -> Option<(Vec<RowId>, Option<DataPrunedEvent>)> {
        if !self.tracker.is_current(token) {
            return None;
        }
        self.tracker.complete(token);
        if loaded.is_empty() {
            self.has_more = false;
            return Some((Vec::new(), None));
        }

        let new_total = current_row_count + loaded.len();
        let pruned = self.window.and_then(|w| {
            if new_total > w.prune_threshold {
                let dropped = new_total - w.window_size;
                self.virtual_offset += dropped as u64;
                Some(DataPrunedEvent {
                    dropped,
                    virtual_offset: self.virtual_offset,
                })
            } else {
                None
            }
        });

        Some((loaded, pruned))
    }

    /// Clears the in-flight token without appending rows, for a rejected or
    /// failed `onLoadMoreRows` response. A no-op if `token` was already
    /// superseded.
    pub fn reject(&mut self, token: RequestToken) -> bool {
        if !self.tracker.is_current(token) {
            return false;
        }
        self.tracker.complete(token);
        true
    }
}
