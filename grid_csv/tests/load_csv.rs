use std::io::Write;

use grid_core::cell::{Cell, ColId, RowId};
use grid_core::row_source::RowSource;
use grid_csv::required_column::{RequiredColumn, ValueKind};
use grid_csv::separator::Separator;
use grid_csv::CsvRowSource;

fn fixture(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_header_and_rows_with_no_required_columns() {
    let file = fixture("name,age\nAlice,30\nBob,25\n");
    let mut src = CsvRowSource::new([]);
    src.load(file.path().to_path_buf()).unwrap();

    assert_eq!(src.row_count(), 2);
    assert_eq!(src.column_defs().len(), 2);
    assert_eq!(src.cell(RowId(0), ColId(0)), Cell::Text("Alice".into()));
    assert_eq!(src.cell(RowId(1), ColId(1)), Cell::Text("25".into()));
    assert!(src.persistent_flags().is_loaded);
    assert!(src.one_shot_flags().column_info_updated);
}

#[test]
fn required_columns_coerce_and_match_by_synonym() {
    let file = fixture("Full Name,Years\nAlice,30\n");
    let required = vec![
        RequiredColumn::text("name").synonyms(["full name"]),
        RequiredColumn::new("age", ValueKind::Number).synonyms(["years"]),
    ];
    let mut src = CsvRowSource::new(required);
    src.load(file.path().to_path_buf()).unwrap();

    assert_eq!(src.cell(RowId(0), ColId(0)), Cell::Text("Alice".into()));
    assert_eq!(src.cell(RowId(0), ColId(1)), Cell::Number(30.0));
}

#[test]
fn unmatched_required_column_yields_null_cells() {
    let file = fixture("name\nAlice\n");
    let required = vec![
        RequiredColumn::text("name"),
        RequiredColumn::new("age", ValueKind::Number),
    ];
    let mut src = CsvRowSource::new(required);
    src.load(file.path().to_path_buf()).unwrap();

    assert_eq!(src.cell(RowId(0), ColId(0)), Cell::Text("Alice".into()));
    assert_eq!(src.cell(RowId(0), ColId(1)), Cell::Null);
}

#[test]
fn extra_file_columns_are_appended_after_required_ones() {
    let file = fixture("name,extra\nAlice,foo\n");
    let required = vec![RequiredColumn::text("name")];
    let mut src = CsvRowSource::new(required);
    src.load(file.path().to_path_buf()).unwrap();

    assert_eq!(src.column_defs().len(), 2);
    assert_eq!(src.cell(RowId(0), ColId(1)), Cell::Text("foo".into()));
}

#[test]
fn auto_separator_detects_semicolons() {
    let file = fixture("name;age\nAlice;30\n");
    let mut src = CsvRowSource::new([]);
    src.set_separator(Separator::Auto);
    src.load(file.path().to_path_buf()).unwrap();

    assert_eq!(src.row_count(), 1);
    assert_eq!(src.cell(RowId(0), ColId(1)), Cell::Text("30".into()));
}

#[test]
fn set_cell_edits_in_memory_and_marks_edited() {
    let file = fixture("name\nAlice\n");
    let mut src = CsvRowSource::new([]);
    src.load(file.path().to_path_buf()).unwrap();

    src.set_cell(RowId(0), ColId(0), Cell::Text("Alicia".into())).unwrap();
    assert_eq!(src.cell(RowId(0), ColId(0)), Cell::Text("Alicia".into()));
    assert!(matches!(src.status(), grid_csv::IoStatus::Edited));
}

#[test]
fn empty_file_is_reported_as_empty() {
    let file = fixture("");
    let mut src = CsvRowSource::new([]);
    assert!(src.load(file.path().to_path_buf()).is_err());
}
