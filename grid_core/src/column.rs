//! `ColumnModel`: reactive, ordered, visibility- and width-tracked column
//! state.
//!
//! Split into an immutable `ColumnDef` (construction input) and a mutable
//! `ColumnState` owned exclusively by this model, so config values and
//! live runtime state can never alias each other.

use crate::cell::ColId;

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderSpec {
    pub label: String,
    pub tooltip: Option<String>,
}

impl HeaderSpec {
    pub fn new(label: impl Into<String>) -> Self {
        HeaderSpec {
            label: label.into(),
            tooltip: None,
        }
    }
}

/// Immutable column definition, as supplied by the host at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
    pub id: ColId,
    pub field_key: Option<String>,
    pub default_width: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub sortable: bool,
    pub filterable: bool,
    pub editable: bool,
    pub renderer_kind: u32,
    pub header: HeaderSpec,
}

impl ColumnDef {
    pub fn new(id: ColId, label: impl Into<String>) -> Self {
        ColumnDef {
            id,
            field_key: None,
            default_width: 120.0,
            min_width: 24.0,
            max_width: 4096.0,
            sortable: true,
            filterable: true,
            editable: false,
            renderer_kind: 0,
            header: HeaderSpec::new(label),
        }
    }
}

/// Mutable runtime state for one column, owned by `ColumnModel`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnState {
    pub def: ColumnDef,
    pub width: f32,
    pub visible: bool,
    pub order: u32,
}

impl ColumnState {
    pub fn id(&self) -> ColId {
        self.def.id
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnChangeKind {
    Width,
    Visibility,
    Reorder,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColumnChangeValue {
    Width(f32),
    Visibility(bool),
    Order(u32),
}

#[derive(Clone, Debug)]
pub struct ColumnEvent {
    pub kind: ColumnChangeKind,
    pub column_id: ColId,
    pub old_value: ColumnChangeValue,
    pub new_value: ColumnChangeValue,
    /// Snapshot of every column's state at emission time, so a subscriber
    /// never needs to re-query the model mid-reaction.
    pub snapshot: Vec<ColumnState>,
}

type Observer = Box<dyn FnMut(&ColumnEvent)>;

pub struct ColumnModel {
    /// Display order of *all* columns, visible or not.
    sequence: Vec<ColId>,
    states: Vec<ColumnState>,
    observers: Vec<Observer>,
    batch_depth: u32,
    pending: Vec<ColumnEvent>,
}

impl ColumnModel {
    pub fn new(defs: impl IntoIterator<Item = ColumnDef>) -> Self {
        let states: Vec<ColumnState> = defs
            .into_iter()
            .enumerate()
            .map(|(idx, def)| ColumnState {
                width: def.default_width,
                visible: true,
                order: idx as u32,
                def,
            })
            .collect();
        let sequence = states.iter().map(|s| s.id()).collect();
        ColumnModel {
            sequence,
            states,
            observers: Vec::new(),
            batch_depth: 0,
            pending: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    fn index_of(&self, id: ColId) -> Option<usize> {
        self.states.iter().position(|s| s.id() == id)
    }

    pub fn get(&self, id: ColId) -> Option<&ColumnState> {
        self.states.iter().find(|s| s.id() == id)
    }

    /// Every column, visible or not, in `sequence` (display) order — used
    /// by `snapshot::capture`, which must persist hidden columns too.
    pub fn all_columns_in_sequence(&self) -> Vec<&ColumnState> {
        self.sequence
            .iter()
            .filter_map(|id| self.get(*id))
            .collect()
    }

    /// Visible columns in display order (property 3: `order` is a
    /// gap-free `0..k-1` prefix after any op or batch).
    pub fn visible_columns_in_order(&self) -> Vec<&ColumnState> {
        let mut visible: Vec<&ColumnState> = self.states.iter().filter(|s| s.visible).collect();
        visible.sort_by_key(|s| s.order);
        visible
    }

    /// Maps a visual column index to its `ColId`.
    pub fn data_index(&self, visual: usize) -> Option<ColId> {
        self.visible_columns_in_order().get(visual).map(|s| s.id())
    }

    /// Sets a column's width, clamped to `[minWidth, maxWidth]`. Only this
    /// column's width changes — no reflow of others.
    pub fn set_width(&mut self, id: ColId, width: f32) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        let clamped = width.clamp(self.states[idx].def.min_width, self.states[idx].def.max_width);
        let old = self.states[idx].width;
        if (old - clamped).abs() < f32::EPSILON {
            return;
        }
        self.states[idx].width = clamped;
        self.emit(ColumnChangeKind::Width, id, ColumnChangeValue::Width(old), ColumnChangeValue::Width(clamped));
    }

    /// Shows or hides a column, renormalizing visible `order` afterward.
    pub fn set_visibility(&mut self, id: ColId, visible: bool) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        let old = self.states[idx].visible;
        if old == visible {
            return;
        }
        self.states[idx].visible = visible;
        self.normalize_order();
        self.emit(
            ColumnChangeKind::Visibility,
            id,
            ColumnChangeValue::Visibility(old),
            ColumnChangeValue::Visibility(visible),
        );
    }

    /// Moves `id` so that, among currently visible columns, it occupies
    /// rank `new_order` (0-based). Out-of-range ranks clamp to the last
    /// visible slot.
    pub fn reorder(&mut self, id: ColId, new_order: u32) {
        let Some(old_order) = self.get(id).map(|s| s.order) else {
            return;
        };
        if !self.get(id).map(|s| s.visible).unwrap_or(false) {
            return;
        }
        let Some(seq_idx) = self.sequence.iter().position(|c| *c == id) else {
            return;
        };
        let moved = self.sequence.remove(seq_idx);

        let visible_positions: Vec<usize> = self
            .sequence
            .iter()
            .enumerate()
            .filter(|(_, cid)| self.get(**cid).map(|s| s.visible).unwrap_or(false))
            .map(|(i, _)| i)
            .collect();
        let target_seq_idx = visible_positions
            .get(new_order as usize)
            .copied()
            .unwrap_or(self.sequence.len());
        self.sequence.insert(target_seq_idx, moved);

        self.normalize_order();
        let new_order_actual = self.get(id).map(|s| s.order).unwrap_or(old_order);
        self.emit(
            ColumnChangeKind::Reorder,
            id,
            ColumnChangeValue::Order(old_order),
            ColumnChangeValue::Order(new_order_actual),
        );
    }

    /// Coalesces every emission inside `f` into one synthetic event per
    /// channel, delivered at batch end.
    pub fn batch_update<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.batch_depth += 1;
        f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            let pending = std::mem::take(&mut self.pending);
            for mut event in dedup_by_kind_and_column(pending) {
                event.snapshot = self.states.clone();
                for obs in &mut self.observers {
                    obs(&event);
                }
            }
        }
    }

    fn normalize_order(&mut self) {
        let mut rank = 0u32;
        for id in self.sequence.clone() {
            if let Some(idx) = self.index_of(id) {
                if self.states[idx].visible {
                    self.states[idx].order = rank;
                    rank += 1;
                }
            }
        }
    }

    fn emit(
        &mut self,
        kind: ColumnChangeKind,
        column_id: ColId,
        old_value: ColumnChangeValue,
        new_value: ColumnChangeValue,
    ) {
        let event = ColumnEvent {
            kind,
            column_id,
            old_value,
            new_value,
            snapshot: self.states.clone(),
        };
        if self.batch_depth > 0 {
            self.pending.push(event);
        } else {
            for obs in &mut self.observers {
                obs(&event);
            }
        }
    }
}

/// Keeps only the last event per `(kind, column_id)` so a batch that
/// touches the same column repeatedly still delivers one synthetic event.
fn dedup_by_kind_and_column(events: Vec<ColumnEvent>) -> Vec<ColumnEvent> {
    let mut out: Vec<ColumnEvent> = Vec::new();
    for event in events {
        if let Some(existing) = out
            .iter_mut()
            .find(|e| e.kind == event.kind && e.column_id == event.column_id)
        {
            existing.new_value = event.new_value;
        } else {
            out.push(event);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(n: usize) -> ColumnModel {
        ColumnModel::new((0..n).map(|i| ColumnDef::new(ColId(i as u32), format!("c{i}"))))
    }

    #[test]
    fn order_is_gap_free_after_hide() {
        let mut m = model(4);
        m.set_visibility(ColId(1), false);
        let visible = m.visible_columns_in_order();
        let orders: Vec<u32> = visible.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn width_clamped_and_does_not_reflow_others() {
        let mut m = model(2);
        let before = m.get(ColId(1)).unwrap().width;
        m.set_width(ColId(0), 99999.0);
        assert!(m.get(ColId(0)).unwrap().width <= m.get(ColId(0)).unwrap().def.max_width);
        assert_eq!(m.get(ColId(1)).unwrap().width, before);
    }

    #[test]
    fn reorder_normalizes_and_preserves_gap_free_invariant() {
        let mut m = model(3);
        m.reorder(ColId(2), 0);
        let visible = m.visible_columns_in_order();
        assert_eq!(visible[0].id(), ColId(2));
        let orders: Vec<u32> = visible.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn batch_update_coalesces_emissions() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let count = Rc::new(RefCell::new(0));
        let mut m = model(3);
        let c = count.clone();
        m.subscribe(Box::new(move |_e| {
            *c.borrow_mut() += 1;
        }));
        m.batch_update(|m| {
            m.set_width(ColId(0), 200.0);
            m.set_width(ColId(0), 210.0);
            m.set_visibility(ColId(1), false);
        });
        // One synthetic event per distinct (kind, column) touched: width(0), visibility(1).
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn data_index_maps_visual_to_col_id() {
        let m = model(3);
        assert_eq!(m.data_index(1), Some(ColId(1)));
    }
}
