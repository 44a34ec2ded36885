//! Filter operators and condition compilation.
//!
//! Each operator compiles to a predicate `Cell -> bool`. The compiler
//! caches compiled predicates by `(operator, value-digest)` so identical
//! conditions across columns, or re-applied after a round trip through
//! `FilterState`, share one closure instead of rebuilding it per row scan.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::{GridError, ValidationError};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, strum::Display)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Blank,
    NotBlank,
    Between,
    In,
    NotIn,
    Regex,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    None,
    Single(Cell),
    Range(Cell, Cell),
    List(Vec<Cell>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub op: FilterOperator,
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(op: FilterOperator, value: FilterValue) -> Self {
        FilterCondition { op, value }
    }
}

fn digest_value(value: &FilterValue) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    match value {
        FilterValue::None => 0u8.hash(&mut hasher),
        FilterValue::Single(c) => {
            1u8.hash(&mut hasher);
            c.to_sort_string().hash(&mut hasher);
        }
        FilterValue::Range(a, b) => {
            2u8.hash(&mut hasher);
            a.to_sort_string().hash(&mut hasher);
            b.to_sort_string().hash(&mut hasher);
        }
        FilterValue::List(items) => {
            3u8.hash(&mut hasher);
            for i in items {
                i.to_sort_string().hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

pub type CompiledPredicate = Rc<dyn Fn(&Cell) -> bool>;

#[derive(Default)]
pub struct PredicateCompiler {
    cache: HashMap<(FilterOperator, u64), CompiledPredicate>,
}

impl PredicateCompiler {
    pub fn new() -> Self {
        PredicateCompiler::default()
    }

    pub fn compile(&mut self, condition: &FilterCondition) -> Result<CompiledPredicate, GridError> {
        let key = (condition.op, digest_value(&condition.value));
        if let Some(p) = self.cache.get(&key) {
            return Ok(p.clone());
        }
        let predicate = build_predicate(condition)?;
        self.cache.insert(key, predicate.clone());
        Ok(predicate)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

fn build_predicate(condition: &FilterCondition) -> Result<CompiledPredicate, GridError> {
    use FilterOperator::*;
    let op = condition.op;
    let value = condition.value.clone();

    let predicate: CompiledPredicate = match op {
        Blank => Rc::new(|cell: &Cell| cell.is_blank()),
        NotBlank => Rc::new(|cell: &Cell| !cell.is_blank()),
        Equals => {
            let target = single_string(&value)?;
            Rc::new(move |cell: &Cell| cell.to_sort_string() == target)
        }
        NotEquals => {
            let target = single_string(&value)?;
            Rc::new(move |cell: &Cell| cell.to_sort_string() != target)
        }
        Contains => {
            let needle = single_string(&value)?.to_lowercase();
            Rc::new(move |cell: &Cell| cell.to_sort_string().to_lowercase().contains(&needle))
        }
        NotContains => {
            let needle = single_string(&value)?.to_lowercase();
            Rc::new(move |cell: &Cell| !cell.to_sort_string().to_lowercase().contains(&needle))
        }
        StartsWith => {
            let needle = single_string(&value)?.to_lowercase();
            Rc::new(move |cell: &Cell| cell.to_sort_string().to_lowercase().starts_with(&needle))
        }
        EndsWith => {
            let needle = single_string(&value)?.to_lowercase();
            Rc::new(move |cell: &Cell| cell.to_sort_string().to_lowercase().ends_with(&needle))
        }
        GreaterThan => {
            let target = single_number_or_string(&value)?;
            Rc::new(move |cell: &Cell| numeric_or_string_cmp(cell, &target) == std::cmp::Ordering::Greater)
        }
        LessThan => {
            let target = single_number_or_string(&value)?;
            Rc::new(move |cell: &Cell| numeric_or_string_cmp(cell, &target) == std::cmp::Ordering::Less)
        }
        GreaterThanOrEqual => {
            let target = single_number_or_string(&value)?;
            Rc::new(move |cell: &Cell| numeric_or_string_cmp(cell, &target) != std::cmp::Ordering::Less)
        }
        LessThanOrEqual => {
            let target = single_number_or_string(&value)?;
            Rc::new(move |cell: &Cell| numeric_or_string_cmp(cell, &target) != std::cmp::Ordering::Greater)
        }
        Between => {
            let (lo, hi) = match &value {
                FilterValue::Range(a, b) => (a.clone(), b.clone()),
                _ => {
                    return Err(GridError::Validation(ValidationError::Rejected {
                        col: crate::cell::ColId(0),
                        reason: "between requires a Range value".into(),
                    }))
                }
            };
            Rc::new(move |cell: &Cell| {
                numeric_or_string_cmp(cell, &lo) != std::cmp::Ordering::Less
                    && numeric_or_string_cmp(cell, &hi) != std::cmp::Ordering::Greater
            })
        }
        In => {
            let list = list_strings(&value)?;
            Rc::new(move |cell: &Cell| list.contains(&cell.to_sort_string()))
        }
        NotIn => {
            let list = list_strings(&value)?;
            Rc::new(move |cell: &Cell| !list.contains(&cell.to_sort_string()))
        }
        Regex => {
            let pattern = single_string(&value)?;
            let re = Regex::new(&pattern).map_err(|e| {
                GridError::Validation(ValidationError::Rejected {
                    col: crate::cell::ColId(0),
                    reason: format!("invalid regex /{pattern}/: {e}"),
                })
            })?;
            Rc::new(move |cell: &Cell| re.is_match(&cell.to_sort_string()))
        }
    };
    Ok(predicate)
}

fn single_string(value: &FilterValue) -> Result<String, GridError> {
    match value {
        FilterValue::Single(c) => Ok(c.to_sort_string()),
        _ => Err(GridError::Validation(ValidationError::Rejected {
            col: crate::cell::ColId(0),
            reason: "operator requires a single value".into(),
        })),
    }
}

fn single_number_or_string(value: &FilterValue) -> Result<Cell, GridError> {
    match value {
        FilterValue::Single(c) => Ok(c.clone()),
        _ => Err(GridError::Validation(ValidationError::Rejected {
            col: crate::cell::ColId(0),
            reason: "operator requires a single value".into(),
        })),
    }
}

fn list_strings(value: &FilterValue) -> Result<Vec<String>, GridError> {
    match value {
        FilterValue::List(items) => Ok(items.iter().map(|c| c.to_sort_string()).collect()),
        _ => Err(GridError::Validation(ValidationError::Rejected {
            col: crate::cell::ColId(0),
            reason: "operator requires a list value".into(),
        })),
    }
}

/// Mixed-type comparison: numeric when
/// both sides coerce to numbers, coerce-to-string locale-compare
/// otherwise.
fn numeric_or_string_cmp(cell: &Cell, target: &Cell) -> std::cmp::Ordering {
    cell.compare(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn contains_is_case_insensitive() {
        let mut compiler = PredicateCompiler::new();
        let cond = FilterCondition::new(
            FilterOperator::Contains,
            FilterValue::Single(Cell::Text("LI".into())),
        );
        let pred = compiler.compile(&cond).unwrap();
        assert!(pred(&Cell::Text("Alice".into())));
        assert!(!pred(&Cell::Text("Bob".into())));
    }

    #[test]
    fn between_is_inclusive() {
        let mut compiler = PredicateCompiler::new();
        let cond = FilterCondition::new(
            FilterOperator::Between,
            FilterValue::Range(Cell::Number(1.0), Cell::Number(10.0)),
        );
        let pred = compiler.compile(&cond).unwrap();
        assert!(pred(&Cell::Number(1.0)));
        assert!(pred(&Cell::Number(10.0)));
        assert!(!pred(&Cell::Number(11.0)));
    }

    #[test]
    fn invalid_regex_is_a_validation_error() {
        let mut compiler = PredicateCompiler::new();
        let cond = FilterCondition::new(
            FilterOperator::Regex,
            FilterValue::Single(Cell::Text("(".into())),
        );
        assert!(compiler.compile(&cond).is_err());
    }

    #[test]
    fn repeated_condition_reuses_cached_predicate() {
        let mut compiler = PredicateCompiler::new();
        let cond = FilterCondition::new(
            FilterOperator::Equals,
            FilterValue::Single(Cell::Text("x".into())),
        );
        compiler.compile(&cond).unwrap();
        compiler.compile(&cond).unwrap();
        assert_eq!(compiler.cached_len(), 1);
    }
}
