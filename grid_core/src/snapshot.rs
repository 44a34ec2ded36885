//! State snapshot: `{columns, sort, filter}`, (de)serializable via
//! `serde` and applied atomically through
//! `ColumnModel::batch_update` (property 9: a round trip through
//! export/import is a no-op for the projection).

use serde::{Deserialize, Serialize};

use crate::cell::ColId;
use crate::column::ColumnModel;
use crate::filter::FilterState;
use crate::sort::{SortDirection, SortKey, SortManager};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub id: u32,
    pub field: Option<String>,
    pub width: f32,
    pub visible: bool,
    pub order: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SortDirSnapshot {
    Asc,
    Desc,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SortSnapshot {
    pub col: u32,
    pub dir: SortDirSnapshot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub columns: Vec<ColumnSnapshot>,
    pub sort: Vec<SortSnapshot>,
    pub filter: FilterState,
}

/// Serde support only for `FilterCondition`/`FilterValue`/`FilterOperator`
/// is already derived where those types live (`filter/operator.rs`), so
/// `FilterState` round-trips as-is.
pub fn capture(columns: &ColumnModel, sort: &SortManager, filter: &FilterState) -> GridSnapshot {
    let column_snaps = columns
        .all_columns_in_sequence()
        .into_iter()
        .map(|s| ColumnSnapshot {
            id: s.id().0,
            field: s.def.field_key.clone(),
            width: s.width,
            visible: s.visible,
            order: s.order,
        })
        .collect();

    let sort_snaps = sort
        .keys()
        .iter()
        .map(|k| SortSnapshot {
            col: k.column.0,
            dir: match k.direction {
                SortDirection::Ascending => SortDirSnapshot::Asc,
                SortDirection::Descending => SortDirSnapshot::Desc,
            },
        })
        .collect();

    GridSnapshot {
        columns: column_snaps,
        sort: sort_snaps,
        filter: filter.clone(),
    }
}

/// Applies a snapshot atomically: column width/visibility/order changes go
/// through a single `batch_update` so subscribers see one coalesced event
/// set, sort and filter state are replaced wholesale.
pub fn apply(snapshot: &GridSnapshot, columns: &mut ColumnModel, sort: &mut SortManager) -> FilterState {
    columns.batch_update(|model| {
        for snap in &snapshot.columns {
            let id = ColId(snap.id);
            model.set_width(id, snap.width);
            model.set_visibility(id, snap.visible);
            model.reorder(id, snap.order);
        }
    });

    let keys: Vec<SortKey> = snapshot
        .sort
        .iter()
        .map(|s| SortKey {
            column: ColId(s.col),
            direction: match s.dir {
                SortDirSnapshot::Asc => SortDirection::Ascending,
                SortDirSnapshot::Desc => SortDirection::Descending,
            },
        })
        .collect();
    sort.set_keys(keys);

    snapshot.filter.clone()
}
