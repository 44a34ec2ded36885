//! The grid's observable event contract.
//!
//! `GridEvent` is one exhaustive tagged-variant enum rather than a grab bag
//! of per-module closures, so a host can match on it exhaustively instead
//! of wiring a separate untyped callback per channel.

use crate::cell::{Cell, CellCoord, ColId};
use crate::filter::{FilterState, ImpossibleFilterWarning, RestFilter, SqlFilter};
use crate::infinite::DataPrunedEvent;
use crate::scroll::VisibleRange;
use crate::sort::{SortErrorEvent, SortKey};

#[derive(Clone, Debug)]
pub struct GraphQlFilterExport(pub serde_json::Value);

#[derive(Clone, Debug)]
pub enum GridEvent {
    ViewportRange { old: VisibleRange, new: VisibleRange },
    ViewportResize { old: VisibleRange, new: VisibleRange },

    DataSet,
    DataCellChange { coord: CellCoord, old: Cell, new: Cell },
    DataPruned(DataPrunedEvent),

    FilterBeforeFilter { state: FilterState },
    FilterChange { state: FilterState, previous: FilterState },
    FilterAfterFilter { rows_visible: usize, rows_hidden: usize },
    FilterExport { rest: RestFilter, graphql: GraphQlFilterExport, sql: SqlFilter },
    FilterImpossible(Vec<ImpossibleFilterWarning>),

    SortChange { state: Vec<SortKey>, previous: Vec<SortKey> },
    SortError(SortErrorEvent),

    ColumnWidth { id: ColId, old: f32, new: f32 },
    ColumnVisibility { id: ColId, old: bool, new: bool },
    ColumnReorder { id: ColId, old: u32, new: u32 },

    CellClick(CellCoord),
    CellDoubleClick(CellCoord),
    EditStart(CellCoord),
    EditCommit { coord: CellCoord, value: Cell },
    EditCancel(CellCoord),
    EditEnd(CellCoord),
    /// Emitted when a validator rejects a commit. Default host policy
    /// blocks the commit and retains the editor; the core never silently
    /// drops the attempt.
    EditInvalid { coord: CellCoord, reason: String },

    BackendError(String),
}

/// Marker trait implemented by anything that can receive the full
/// `GridEvent` stream, mirroring the way `ColumnModel::subscribe` takes a
/// plain closure rather than requiring a dedicated observer type. Kept as a
/// blanket impl so any `FnMut(&GridEvent)` qualifies.
pub trait EventSink {
    fn handle(&mut self, event: &GridEvent);
}

impl<F: FnMut(&GridEvent)> EventSink for F {
    fn handle(&mut self, event: &GridEvent) {
        self(event)
    }
}

#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn emit(&mut self, event: GridEvent) {
        for sink in &mut self.sinks {
            sink.handle(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
