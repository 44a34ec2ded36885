//! A concrete `grid_core::RowSource` backed by delimited text files: a
//! realistic host collaborator, not part of the core grid logic. This
//! crate owns the only I/O in the workspace.

pub mod error;
pub mod flags;
pub mod required_column;
pub mod separator;
pub mod util;

use std::path::PathBuf;

use grid_core::cell::{Cell, ColId, RowId};
use grid_core::column::ColumnDef;
use grid_core::error::GridResult;
use grid_core::row_source::RowSource;
use log::{trace, warn};

use error::CsvLoadError;
use flags::{OneShotFlags, PersistentFlags};
use required_column::{RequiredColumn, ValueKind};
use separator::Separator;

#[derive(Debug, Default)]
pub enum IoStatus {
    #[default]
    Empty,
    Loaded(PathBuf),
    Edited,
}

struct State {
    persistent_flags: PersistentFlags,
    one_shot_flags: OneShotFlags,
    columns: Vec<ColumnDef>,
    status: IoStatus,
    rows: Vec<Vec<Cell>>,
}

impl Default for State {
    fn default() -> Self {
        State {
            persistent_flags: PersistentFlags::default(),
            one_shot_flags: OneShotFlags::default(),
            columns: Vec::new(),
            status: IoStatus::Empty,
            rows: Vec::new(),
        }
    }
}

/// `RowSource` backed by an in-memory table loaded from a delimited text
/// file. Columns are either a caller-supplied `required_columns` list
/// (matched against the file's header row by name/synonym) or, if none
/// is given, taken verbatim from the header
/// with spreadsheet-style fallback names (`util::base_26`) when the file
/// has none.
pub struct CsvRowSource {
    required_columns: Vec<RequiredColumn>,
    separator: Separator,
    skip_first_rows: usize,
    has_header: bool,
    state: State,
}

impl CsvRowSource {
    pub fn new(required_columns: impl IntoIterator<Item = RequiredColumn>) -> Self {
        CsvRowSource {
            required_columns: required_columns.into_iter().collect(),
            separator: Separator::default(),
            skip_first_rows: 0,
            has_header: true,
            state: State::default(),
        }
    }

    pub fn set_separator(&mut self, separator: Separator) {
        self.separator = separator;
    }

    pub fn skip_rows_on_load(&mut self, count: usize) {
        self.skip_first_rows = count;
    }

    /// Whether the first non-skipped row is a header row, rather than data.
    pub fn set_has_header(&mut self, has_header: bool) {
        self.has_header = has_header;
    }

    pub fn status(&self) -> &IoStatus {
        &self.state.status
    }

    pub fn persistent_flags(&self) -> &PersistentFlags {
        &self.state.persistent_flags
    }

    pub fn one_shot_flags(&self) -> &OneShotFlags {
        &self.state.one_shot_flags
    }

    /// Resets one-shot flags; call once per host poll cycle.
    pub fn poll(&mut self) {
        self.state.one_shot_flags = OneShotFlags::default();
    }

    pub fn column_defs(&self) -> &[ColumnDef] {
        &self.state.columns
    }

    pub fn clear(&mut self) {
        self.state.rows.clear();
        self.state.columns.clear();
        self.state.persistent_flags.is_loaded = false;
        self.state.persistent_flags.column_info_present = false;
        self.state.one_shot_flags.cleared = true;
        self.state.status = IoStatus::Empty;
    }

    pub fn load(&mut self, path: PathBuf) -> Result<(), CsvLoadError> {
        trace!("CsvRowSource: loading {path:?}");
        self.clear();

        let delimiter = self.separator.resolve(&path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(CsvLoadError::Parse)?;

        let mut records = rdr.records();
        for _ in 0..self.skip_first_rows {
            records.next();
        }

        let mut first_data_record = None;
        let (columns, csv_to_col) = if self.has_header {
            match records.next() {
                Some(Ok(headers)) => {
                    let headers: Vec<&str> = headers.iter().collect();
                    self.resolve_columns(&headers)
                }
                Some(Err(e)) => return Err(CsvLoadError::Parse(e)),
                None => {
                    self.state.status = IoStatus::Empty;
                    return Err(CsvLoadError::Empty);
                }
            }
        } else {
            // No header row: use the first data record only to learn the
            // field count, then replay it as data below.
            match records.next() {
                Some(Ok(record)) => {
                    let width = record.len().max(self.required_columns.len());
                    let placeholder_headers = vec![""; width];
                    first_data_record = Some(record);
                    self.resolve_columns(&placeholder_headers)
                }
                Some(Err(e)) => return Err(CsvLoadError::Parse(e)),
                None => {
                    self.state.status = IoStatus::Empty;
                    return Err(CsvLoadError::Empty);
                }
            }
        };
        self.state.columns = columns;

        let col_count = self.state.columns.len();
        let first_data_record = first_data_record.into_iter().map(Ok);
        for (row_idx, record) in first_data_record.chain(records).enumerate() {
            let record = record.map_err(|e| CsvLoadError::ParseAtLine {
                line: row_idx + 1 + self.skip_first_rows,
                source: e,
            })?;
            let mut row = vec![Cell::Null; col_count];
            for (csv_idx, field) in record.iter().enumerate() {
                let Some(Some(col_idx)) = csv_to_col.get(csv_idx).copied() else {
                    continue;
                };
                if let Some(slot) = row.get_mut(col_idx) {
                    let kind = self
                        .required_columns
                        .get(col_idx)
                        .map(|c| c.kind)
                        .unwrap_or(ValueKind::Text);
                    *slot = kind.parse(field);
                }
            }
            self.state.rows.push(row);
        }

        self.state.persistent_flags.is_loaded = true;
        self.state.persistent_flags.column_info_present = true;
        self.state.one_shot_flags.column_info_updated = true;
        self.state.one_shot_flags.reloaded = true;
        self.state.status = IoStatus::Loaded(path);
        Ok(())
    }

    /// Maps CSV column positions to `ColId`s, placing required columns
    /// first (unmatched required columns still get a slot, filled with
    /// nulls) and any extra file columns after,
    /// in file order. Returns `(columns, csv_to_col)` where
    /// `csv_to_col[csv_idx]` is the destination column index, or `None`
    /// if that CSV column has no destination (only possible when required
    /// columns are in play and a file column goes unclaimed — which never
    /// happens here, since unclaimed file columns get appended, but the
    /// `Option` keeps the mapping total and explicit).
    fn resolve_columns(&self, headers: &[&str]) -> (Vec<ColumnDef>, Vec<Option<usize>>) {
        if self.required_columns.is_empty() {
            let columns: Vec<ColumnDef> = headers
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let label = if name.is_empty() {
                        util::base_26(idx as u32 + 1)
                    } else {
                        name.to_string()
                    };
                    ColumnDef::new(ColId(idx as u32), label)
                })
                .collect();
            let csv_to_col: Vec<Option<usize>> = (0..headers.len()).map(Some).collect();
            return (columns, csv_to_col);
        }

        let mut columns = Vec::with_capacity(self.required_columns.len());
        let mut csv_to_col: Vec<Option<usize>> = vec![None; headers.len()];
        let mut claimed = vec![false; headers.len()];

        for (col_idx, required) in self.required_columns.iter().enumerate() {
            if let Some(csv_idx) = required.find_match(headers) {
                if claimed[csv_idx] {
                    warn!("double match for column {}", required.name);
                } else {
                    claimed[csv_idx] = true;
                    csv_to_col[csv_idx] = Some(col_idx);
                }
            }
            columns.push(ColumnDef::new(ColId(col_idx as u32), required.name.clone()));
        }

        let mut next_col_idx = self.required_columns.len();
        for (csv_idx, name) in headers.iter().enumerate() {
            if claimed[csv_idx] {
                continue;
            }
            let label = if name.is_empty() {
                util::base_26(next_col_idx as u32 + 1)
            } else {
                name.to_string()
            };
            csv_to_col[csv_idx] = Some(next_col_idx);
            columns.push(ColumnDef::new(ColId(next_col_idx as u32), label));
            next_col_idx += 1;
        }

        (columns, csv_to_col)
    }
}

impl RowSource for CsvRowSource {
    fn row_count(&self) -> usize {
        self.state.rows.len()
    }

    fn cell(&self, row: RowId, col: ColId) -> Cell {
        self.state
            .rows
            .get(row.0 as usize)
            .and_then(|r| r.get(col.0 as usize))
            .cloned()
            .unwrap_or(Cell::Null)
    }

    fn set_cell(&mut self, row: RowId, col: ColId, value: Cell) -> GridResult<()> {
        let Some(r) = self.state.rows.get_mut(row.0 as usize) else {
            return Err(grid_core::error::GridError::Bounds(
                grid_core::error::BoundsError::Row { row, len: self.state.rows.len() },
            ));
        };
        let Some(slot) = r.get_mut(col.0 as usize) else {
            return Err(grid_core::error::GridError::Bounds(
                grid_core::error::BoundsError::Column { col },
            ));
        };
        *slot = value;
        self.state.status = IoStatus::Edited;
        Ok(())
    }

    fn rows(&self, range: std::ops::Range<usize>) -> Vec<RowId> {
        let end = range.end.min(self.state.rows.len());
        (range.start..end).map(|i| RowId(i as u32)).collect()
    }
}
