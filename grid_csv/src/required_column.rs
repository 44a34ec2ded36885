//! Column synonym matching for mapping external header names to `ColId`s.

use grid_core::cell::Cell;

/// The coercion the loader applies to a raw CSV field when a required
/// column is matched. `Text` performs no coercion (the common case for
/// ad-hoc, unmatched columns).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueKind {
    Text,
    Number,
    Boolean,
    Timestamp,
}

impl ValueKind {
    pub fn parse(self, raw: &str) -> Cell {
        if raw.is_empty() {
            return Cell::Null;
        }
        match self {
            ValueKind::Text => Cell::Text(raw.to_string()),
            ValueKind::Number => raw
                .parse::<f64>()
                .map(Cell::Number)
                .unwrap_or_else(|_| Cell::Text(raw.to_string())),
            ValueKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Cell::Boolean(true),
                "false" | "0" | "no" => Cell::Boolean(false),
                _ => Cell::Text(raw.to_string()),
            },
            ValueKind::Timestamp => raw
                .parse::<i64>()
                .map(Cell::Timestamp)
                .unwrap_or_else(|_| Cell::Text(raw.to_string())),
        }
    }
}

/// A column the host expects by name, with optional synonym aliases for
/// fuzzy header matching (case-insensitive).
pub struct RequiredColumn {
    pub name: String,
    pub synonyms: Vec<String>,
    pub kind: ValueKind,
    pub default: Option<Cell>,
}

impl RequiredColumn {
    pub fn new(name: impl AsRef<str>, kind: ValueKind) -> Self {
        RequiredColumn {
            name: name.as_ref().to_string(),
            synonyms: vec![],
            kind,
            default: None,
        }
    }

    pub fn text(name: impl AsRef<str>) -> Self {
        RequiredColumn::new(name, ValueKind::Text)
    }

    pub fn synonyms<'a>(mut self, synonyms: impl IntoIterator<Item = &'a str>) -> Self {
        self.synonyms = synonyms.into_iter().map(|s| s.to_lowercase()).collect();
        self
    }

    pub fn default(mut self, default: Cell) -> Self {
        self.default = Some(default);
        self
    }

    fn matches(&self, candidate_lower: &str) -> bool {
        self.name.to_lowercase() == candidate_lower
            || self.synonyms.iter().any(|s| s == candidate_lower)
    }

    /// Finds this column's position among a CSV header row, if present.
    pub fn find_match(&self, headers: &[&str]) -> Option<usize> {
        headers
            .iter()
            .enumerate()
            .find(|(_, h)| self.matches(&h.to_lowercase()))
            .map(|(idx, _)| idx)
    }
}
