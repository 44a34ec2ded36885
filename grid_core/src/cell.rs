//! Core data model: `Cell`, `RowId`, `ColId`, `CellCoord`, `CellFingerprint`.
//!
//! `Cell` is an untyped, backend-agnostic value the grid never interprets
//! beyond comparison/sort/filter/display.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Index into the backing row source. Stable across sort/filter.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RowId(pub u32);

/// Identifier for a column definition. Stable across reorder/resize.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ColId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: RowId,
    pub col: ColId,
}

impl CellCoord {
    pub fn new(row: RowId, col: ColId) -> Self {
        CellCoord { row, col }
    }
}

/// A chip in a list-of-chip cell: a small labelled token (e.g. a tag).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chip {
    pub label: String,
    pub color_hint: Option<u32>,
}

/// An opaque record value, read via `RowSource::cell`.
///
/// No schema is enforced by the core: a column's declared
/// `VariantTy`-like type, if any, lives in `ColumnDef`/`ColumnState`, not
/// here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Milliseconds since Unix epoch.
    Timestamp(i64),
    ChipList(Vec<Chip>),
    /// Escape hatch for host-defined cell kinds the core must still be able
    /// to carry through sort/filter by falling back to its string form.
    Arbitrary(String),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.is_empty(),
            Cell::ChipList(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Timestamp(t) => Some(*t as f64),
            Cell::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Coerce-to-string representation used for locale-compare sort/filter
    /// fallback on mixed-type columns.
    pub fn to_sort_string(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Boolean(b) => b.to_string(),
            Cell::Timestamp(t) => t.to_string(),
            Cell::ChipList(chips) => chips
                .iter()
                .map(|c| c.label.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Cell::Arbitrary(s) => s.clone(),
        }
    }

    /// Ordering used by `SortManager`: numeric when both sides are numeric,
    /// otherwise locale-aware (here: case-insensitive) string compare.
    /// Nulls/blanks sort according to the caller-supplied direction
    /// (handled one level up, in `sort.rs`, since "last" flips with
    /// direction).
    ///
    /// Returns `None` only when both sides are numeric but the comparison
    /// itself can't decide an order (a NaN on either side) — the one case
    /// where this comparator "throws". The caller is responsible for
    /// treating that pair as equal and surfacing a `sort:error`.
    pub fn compare_checked(&self, other: &Cell) -> Option<Ordering> {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                let a = self.to_sort_string().to_lowercase();
                let b = other.to_sort_string().to_lowercase();
                Some(a.cmp(&b))
            }
        }
    }

    /// `compare_checked`, treating an undecidable comparison as equal.
    pub fn compare(&self, other: &Cell) -> Ordering {
        self.compare_checked(other).unwrap_or(Ordering::Equal)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sort_string())
    }
}

/// Content-derived key sufficient to determine whether a cached rendered
/// artifact may be reused. Equal fingerprints are
/// interchangeable by contract.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CellFingerprint {
    pub renderer_kind: u32,
    /// Width quantized to whole pixels: sub-pixel jitter must not thrash
    /// the cache.
    pub column_width: i32,
    pub value_digest: u64,
    pub state_flags: u32,
}

impl CellFingerprint {
    pub fn new(renderer_kind: u32, column_width: f32, value: &Cell, state_flags: u32) -> Self {
        CellFingerprint {
            renderer_kind,
            column_width: column_width.round() as i32,
            value_digest: digest_cell(value),
            state_flags,
        }
    }
}

fn digest_cell(cell: &Cell) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    match cell {
        Cell::Null => 0u8.hash(&mut hasher),
        Cell::Number(n) => {
            1u8.hash(&mut hasher);
            n.to_bits().hash(&mut hasher);
        }
        Cell::Text(s) => {
            2u8.hash(&mut hasher);
            s.hash(&mut hasher);
        }
        Cell::Boolean(b) => {
            3u8.hash(&mut hasher);
            b.hash(&mut hasher);
        }
        Cell::Timestamp(t) => {
            4u8.hash(&mut hasher);
            t.hash(&mut hasher);
        }
        Cell::ChipList(chips) => {
            5u8.hash(&mut hasher);
            for c in chips {
                c.label.hash(&mut hasher);
            }
        }
        Cell::Arbitrary(s) => {
            6u8.hash(&mut hasher);
            s.hash(&mut hasher);
        }
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_compare_ignores_representation() {
        assert_eq!(Cell::Number(3.0).compare(&Cell::Number(3.0)), Ordering::Equal);
        assert_eq!(Cell::Number(1.0).compare(&Cell::Number(2.0)), Ordering::Less);
    }

    #[test]
    fn nan_comparison_is_undecidable_but_compare_treats_it_as_equal() {
        assert_eq!(Cell::Number(f64::NAN).compare_checked(&Cell::Number(1.0)), None);
        assert_eq!(Cell::Number(f64::NAN).compare(&Cell::Number(1.0)), Ordering::Equal);
    }

    #[test]
    fn mixed_type_falls_back_to_string_compare() {
        // "10" < "9" lexicographically, unlike numerically.
        assert_eq!(
            Cell::Text("10".into()).compare(&Cell::Text("9".into())),
            Ordering::Less
        );
    }

    #[test]
    fn blank_detection() {
        assert!(Cell::Null.is_blank());
        assert!(Cell::Text(String::new()).is_blank());
        assert!(!Cell::Text("x".into()).is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn fingerprint_equal_for_equal_inputs() {
        let a = CellFingerprint::new(1, 100.4, &Cell::Text("x".into()), 0);
        let b = CellFingerprint::new(1, 100.2, &Cell::Text("x".into()), 0);
        assert_eq!(a, b, "sub-pixel width jitter should not change fingerprint");
    }
}
