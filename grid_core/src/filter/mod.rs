//! `FilterEngine`: compiled predicates, quick-filter cache, export projection.
//!
//! Per-column predicates combine with `CombineLogic::And`/`Or`; an optional
//! quick filter applies a case-insensitive substring test across every
//! filterable column. `set_state` runs a bloom-filter pre-pass once per
//! filter change: an `Equals`-only column condition whose target is absent
//! from that column's `BloomFilter` membership set can never match any row,
//! so the whole scan short-circuits instead of re-checking per row. Backend
//! evaluation hands the whole `FilterState` to the host and tracks the
//! response with `LatestWins`, exactly as `SortManager` does for backend
//! sort.

mod export;
mod operator;

pub use export::{to_graphql, to_rest, to_sql, RestFilter, SqlFilter};
pub use operator::{CompiledPredicate, FilterCondition, FilterOperator, FilterValue, PredicateCompiler};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::auxindex::BloomFilter;
use crate::cell::{Cell, ColId, RowId};
use crate::error::GridResult;
use crate::request::{LatestWins, RequestToken};
use crate::row_source::RowSource;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CombineLogic {
    And,
    Or,
}

/// One column's active filter: one or more conditions, combined by
/// `logic`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: ColId,
    pub conditions: Vec<FilterCondition>,
    pub logic: CombineLogic,
}

impl ColumnFilter {
    pub fn new(column: ColId, logic: CombineLogic) -> Self {
        ColumnFilter {
            column,
            conditions: Vec::new(),
            logic,
        }
    }
}

/// Quick filter: a single free-text string matched, case-insensitively,
/// against the rendered value of every column in `columns`, or every
/// visible column if `columns` is `None`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QuickFilter {
    pub text: String,
    pub columns: Option<Vec<ColId>>,
}

impl QuickFilter {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The declarative state applied by `FilterEngine`: per-column filters plus
/// an optional quick filter, combined with AND across columns. Exported/
/// imported as a whole for snapshotting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub columns: Vec<ColumnFilter>,
    pub quick: QuickFilter,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.conditions.is_empty()) && self.quick.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FilterMode {
    Frontend,
    Backend,
    /// Resolves to `Backend` iff a backend callback is registered, else
    /// `Frontend`, mirroring `SortManager`'s mode resolution.
    Auto,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FilterPhase {
    Idle,
    Compiling,
    Filtering,
    RequestPending,
    ApplyingResult,
}

/// Advisory diagnostic surfaced when a `ColumnFilter`'s conditions can
/// never jointly be satisfied, e.g. `GreaterThan(10) AND LessThan(5)`
/// combined with `And`. Never blocks evaluation — filtering still runs
/// and simply returns no rows.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpossibleFilterWarning {
    pub column: ColId,
    pub reason: String,
}

pub struct FilterEngine {
    state: FilterState,
    mode: FilterMode,
    phase: FilterPhase,
    compiler: PredicateCompiler,
    bloom: HashMap<ColId, BloomFilter>,
    /// Columns whose `Equals`-only `And` filter was proven, via
    /// `bloom.contains`, to match no value ever seen in that column. Set
    /// once per `set_state` call rather than rechecked per row: a single
    /// bloom lookup against the whole-column membership set rules out the
    /// entire row scan.
    vacuous_columns: std::collections::HashSet<ColId>,
    backend_tracker: LatestWins,
    has_backend: bool,
    /// State in effect immediately before the current backend request was
    /// issued, so a rejected response can restore it.
    pending_previous_state: Option<FilterState>,
}

impl FilterEngine {
    pub fn new(mode: FilterMode) -> Self {
        FilterEngine {
            state: FilterState::default(),
            mode,
            phase: FilterPhase::Idle,
            compiler: PredicateCompiler::new(),
            bloom: HashMap::new(),
            vacuous_columns: std::collections::HashSet::new(),
            backend_tracker: LatestWins::default(),
            has_backend: false,
            pending_previous_state: None,
        }
    }

    pub fn set_has_backend(&mut self, has_backend: bool) {
        self.has_backend = has_backend;
    }

    fn resolved_mode(&self) -> FilterMode {
        match self.mode {
            FilterMode::Auto => {
                if self.has_backend {
                    FilterMode::Backend
                } else {
                    FilterMode::Frontend
                }
            }
            other => other,
        }
    }

    pub fn phase(&self) -> FilterPhase {
        self.phase
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Registers a bloom filter built over a column's values, enabling the
    /// negative short-circuit in `matches_frontend`. Building the filter
    /// itself is the host/`ColumnModel` integration's job; this just wires
    /// it in.
    pub fn install_bloom(&mut self, column: ColId, filter: BloomFilter) {
        self.bloom.insert(column, filter);
    }

    /// Replaces the active filter state and recompiles predicates,
    /// transitioning `Idle -> Compiling -> Filtering -> Idle` for frontend
    /// mode, or `Idle -> RequestPending -> ApplyingResult -> Idle` when
    /// resolved to backend mode.
    pub fn set_state(&mut self, state: FilterState) -> GridResult<FilterTransition> {
        let previous = self.state.clone();
        self.state = state;
        match self.resolved_mode() {
            FilterMode::Frontend | FilterMode::Auto => {
                self.phase = FilterPhase::Compiling;
                self.compile_all()?;
                self.phase = FilterPhase::Filtering;
                self.phase = FilterPhase::Idle;
                Ok(FilterTransition::AppliedLocally)
            }
            FilterMode::Backend => {
                self.phase = FilterPhase::RequestPending;
                self.pending_previous_state = Some(previous);
                let token = self.backend_tracker.start();
                Ok(FilterTransition::BackendRequested(token))
            }
        }
    }

    fn compile_all(&mut self) -> GridResult<()> {
        self.vacuous_columns.clear();
        for col in &self.state.columns {
            for cond in &col.conditions {
                self.compiler.compile(cond)?;
            }
            if let Some(bloom) = self.bloom.get(&col.column) {
                let equals_only = !col.conditions.is_empty()
                    && col.logic == CombineLogic::And
                    && col.conditions.iter().all(|c| c.op == FilterOperator::Equals);
                if equals_only {
                    let all_absent = col.conditions.iter().all(|c| match &c.value {
                        FilterValue::Single(v) => !bloom.contains(&v.to_sort_string().to_lowercase()),
                        _ => false,
                    });
                    if all_absent {
                        self.vacuous_columns.insert(col.column);
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies a backend's filtered row-id response if `token` is still the
    /// current request, discarding it (a no-op) otherwise ("latest wins").
    pub fn apply_backend_result(&mut self, token: RequestToken, result: Vec<RowId>) -> Option<Vec<RowId>> {
        if !self.backend_tracker.is_current(token) {
            return None;
        }
        self.phase = FilterPhase::ApplyingResult;
        self.backend_tracker.complete(token);
        self.pending_previous_state = None;
        self.phase = FilterPhase::Idle;
        Some(result)
    }

    /// Discards a rejected backend response (if `token` is still current)
    /// and restores the state in effect before the request was issued.
    /// Returns the restored state for the caller to surface as the new
    /// "current" filter state, or `None` if `token` was already superseded.
    pub fn reject_backend_result(&mut self, token: RequestToken) -> Option<FilterState> {
        if !self.backend_tracker.is_current(token) {
            return None;
        }
        self.backend_tracker.complete(token);
        self.phase = FilterPhase::Idle;
        let restored = self.pending_previous_state.take().unwrap_or_default();
        self.state = restored.clone();
        Some(restored)
    }

    /// Frontend evaluation of one row: any column already proven vacuous by
    /// the bloom pre-pass short-circuits the whole row immediately, then
    /// the compiled per-column predicates run (AND across columns, combined
    /// per `logic` within a column), then the quick filter. `visible_columns`
    /// is the grid's current visible-column-in-order list, used as the quick
    /// filter's default column set when `QuickFilter::columns` is `None`.
    pub fn matches_frontend<S: RowSource>(&mut self, source: &S, row: RowId, visible_columns: &[ColId]) -> bool {
        if !self.vacuous_columns.is_empty() {
            return false;
        }
        for col_filter in &self.state.columns {
            if col_filter.conditions.is_empty() {
                continue;
            }
            let cell = source.cell(row, col_filter.column);
            let matched = match col_filter.logic {
                CombineLogic::And => col_filter.conditions.iter().all(|cond| self.eval_cached(cond, &cell)),
                CombineLogic::Or => col_filter.conditions.iter().any(|cond| self.eval_cached(cond, &cell)),
            };
            if !matched {
                return false;
            }
        }
        if !self.state.quick.is_empty() {
            let needle = self.state.quick.text.to_lowercase();
            let targets: &[ColId] = self.state.quick.columns.as_deref().unwrap_or(visible_columns);
            let any_match = targets
                .iter()
                .any(|&col| source.cell(row, col).to_sort_string().to_lowercase().contains(&needle));
            if !any_match {
                return false;
            }
        }
        true
    }

    fn eval_cached(&mut self, cond: &FilterCondition, cell: &Cell) -> bool {
        match self.compiler.compile(cond) {
            Ok(predicate) => predicate(cell),
            Err(_) => false,
        }
    }

    /// Advisory impossibility scan over `AND`-combined conditions within a
    /// single column: a numeric range whose lower bound exceeds its upper
    /// bound, two distinct `Equals` targets, or an exact duplicate
    /// condition. Does not mutate engine state.
    pub fn detect_impossible(&self) -> Vec<ImpossibleFilterWarning> {
        let mut warnings = Vec::new();
        for col_filter in &self.state.columns {
            if col_filter.logic != CombineLogic::And {
                continue;
            }
            let mut lower_bound: Option<f64> = None;
            let mut upper_bound: Option<f64> = None;
            let mut equals_targets: Vec<&Cell> = Vec::new();
            for (i, cond) in col_filter.conditions.iter().enumerate() {
                match (&cond.op, &cond.value) {
                    (FilterOperator::GreaterThan, FilterValue::Single(v))
                    | (FilterOperator::GreaterThanOrEqual, FilterValue::Single(v)) => {
                        if let Some(n) = v.as_number() {
                            lower_bound = Some(lower_bound.map_or(n, |b: f64| b.max(n)));
                        }
                    }
                    (FilterOperator::LessThan, FilterValue::Single(v))
                    | (FilterOperator::LessThanOrEqual, FilterValue::Single(v)) => {
                        if let Some(n) = v.as_number() {
                            upper_bound = Some(upper_bound.map_or(n, |b: f64| b.min(n)));
                        }
                    }
                    (FilterOperator::Equals, FilterValue::Single(v)) => {
                        equals_targets.push(v);
                    }
                    _ => {}
                }
                let is_duplicate = col_filter.conditions[..i]
                    .iter()
                    .any(|other| other.op == cond.op && other.value == cond.value);
                if is_duplicate {
                    warnings.push(ImpossibleFilterWarning {
                        column: col_filter.column,
                        reason: format!("duplicate condition {:?} {:?} within an AND group", cond.op, cond.value),
                    });
                }
            }
            if let (Some(lo), Some(hi)) = (lower_bound, upper_bound) {
                if lo > hi {
                    warnings.push(ImpossibleFilterWarning {
                        column: col_filter.column,
                        reason: format!("lower bound {lo} exceeds upper bound {hi}"),
                    });
                }
            }
            for i in 0..equals_targets.len() {
                for j in (i + 1)..equals_targets.len() {
                    if equals_targets[i] != equals_targets[j] {
                        warnings.push(ImpossibleFilterWarning {
                            column: col_filter.column,
                            reason: format!(
                                "column cannot equal both {:?} and {:?}",
                                equals_targets[i], equals_targets[j]
                            ),
                        });
                    }
                }
            }
        }
        warnings
    }

    /// Serializes the active filter state as a REST-style query value.
    pub fn to_rest(&self) -> RestFilter {
        export::to_rest(&self.state)
    }

    /// Serializes the active filter state as a GraphQL `where` object.
    pub fn to_graphql(&self) -> serde_json::Value {
        export::to_graphql(&self.state)
    }

    /// Serializes the active filter state as a parameterized SQL clause.
    pub fn to_sql(&self) -> SqlFilter {
        export::to_sql(&self.state)
    }
}

#[derive(Debug)]
pub enum FilterTransition {
    AppliedLocally,
    BackendRequested(RequestToken),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    struct Rows(Vec<Vec<Cell>>);

    impl RowSource for Rows {
        fn row_count(&self) -> usize {
            self.0.len()
        }
        fn cell(&self, row: RowId, col: ColId) -> Cell {
            self.0[row.0 as usize][col.0 as usize].clone()
        }
    }

    fn rows() -> Rows {
        Rows(vec![
            vec![Cell::Text("Alice".into()), Cell::Number(30.0)],
            vec![Cell::Text("Bob".into()), Cell::Number(40.0)],
            vec![Cell::Text("Charlie".into()), Cell::Number(22.0)],
        ])
    }

    #[test]
    fn frontend_and_combination_narrows_results() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        let mut col = ColumnFilter::new(ColId(1), CombineLogic::And);
        col.conditions.push(FilterCondition::new(
            FilterOperator::GreaterThan,
            FilterValue::Single(Cell::Number(25.0)),
        ));
        engine
            .set_state(FilterState {
                columns: vec![col],
                quick: QuickFilter::default(),
            })
            .unwrap();
        let src = rows();
        let matches: Vec<u32> = (0..3)
            .filter(|&i| engine.matches_frontend(&src, RowId(i), &[ColId(0), ColId(1)]))
            .collect();
        assert_eq!(matches, vec![0, 1]);
    }

    #[test]
    fn quick_filter_matches_any_column() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        engine
            .set_state(FilterState {
                columns: vec![],
                quick: QuickFilter { text: "bo".into(), columns: None },
            })
            .unwrap();
        let src = rows();
        assert!(engine.matches_frontend(&src, RowId(1), &[ColId(0), ColId(1)]));
        assert!(!engine.matches_frontend(&src, RowId(0), &[ColId(0), ColId(1)]));
    }

    #[test]
    fn quick_filter_defaults_to_every_visible_column_not_just_column_filter_targets() {
        // No `ColumnFilter`s are configured at all (state.columns is empty),
        // yet the quick filter must still search every visible column —
        // including column 1, which no `ColumnFilter` ever references.
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        engine
            .set_state(FilterState {
                columns: vec![],
                quick: QuickFilter { text: "40".into(), columns: None },
            })
            .unwrap();
        let src = rows();
        let visible = [ColId(0), ColId(1)];
        assert!(engine.matches_frontend(&src, RowId(1), &visible), "Bob's age (40) lives in column 1");
        assert!(!engine.matches_frontend(&src, RowId(0), &visible));
    }

    #[test]
    fn quick_filter_explicit_columns_restricts_the_search() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        engine
            .set_state(FilterState {
                columns: vec![],
                quick: QuickFilter { text: "40".into(), columns: Some(vec![ColId(0)]) },
            })
            .unwrap();
        let src = rows();
        let visible = [ColId(0), ColId(1)];
        assert!(!engine.matches_frontend(&src, RowId(1), &visible), "restricted to column 0, which has no '40'");
    }

    #[test]
    fn backend_mode_issues_request_and_applies_latest_result() {
        let mut engine = FilterEngine::new(FilterMode::Backend);
        let transition = engine
            .set_state(FilterState {
                columns: vec![],
                quick: QuickFilter { text: "x".into(), columns: None },
            })
            .unwrap();
        let FilterTransition::BackendRequested(token) = transition else {
            panic!("expected a backend request");
        };
        let applied = engine.apply_backend_result(token, vec![RowId(2)]);
        assert_eq!(applied, Some(vec![RowId(2)]));
    }

    #[test]
    fn stale_backend_response_is_discarded() {
        let mut engine = FilterEngine::new(FilterMode::Backend);
        let first = match engine.set_state(FilterState::default()).unwrap() {
            FilterTransition::BackendRequested(t) => t,
            _ => unreachable!(),
        };
        let _second = match engine.set_state(FilterState::default()).unwrap() {
            FilterTransition::BackendRequested(t) => t,
            _ => unreachable!(),
        };
        assert_eq!(engine.apply_backend_result(first, vec![]), None);
    }

    #[test]
    fn rejected_backend_response_restores_previous_state() {
        let mut engine = FilterEngine::new(FilterMode::Backend);
        let initial = FilterState {
            columns: vec![],
            quick: QuickFilter { text: "keep".into(), columns: None },
        };
        engine.set_state(initial.clone()).unwrap();
        // Backend mode never applies frontend-locally, so `state()` already
        // holds `initial` as the "last-applied" value from the engine's
        // point of view even before a response arrives.
        let transition = engine
            .set_state(FilterState {
                columns: vec![],
                quick: QuickFilter { text: "replace".into(), columns: None },
            })
            .unwrap();
        let FilterTransition::BackendRequested(token) = transition else {
            panic!("expected a backend request");
        };
        let restored = engine.reject_backend_result(token).unwrap();
        assert_eq!(restored.quick.text, "keep");
        assert_eq!(engine.state().quick.text, "keep");
    }

    #[test]
    fn bloom_absent_equals_target_short_circuits_whole_scan() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        let mut bloom = BloomFilter::with_capacity(8, 0.01);
        bloom.add("alice");
        bloom.add("bob");
        engine.install_bloom(ColId(0), bloom);
        let mut col = ColumnFilter::new(ColId(0), CombineLogic::And);
        col.conditions.push(FilterCondition::new(
            FilterOperator::Equals,
            FilterValue::Single(Cell::Text("zzz-not-present".into())),
        ));
        engine
            .set_state(FilterState {
                columns: vec![col],
                quick: QuickFilter::default(),
            })
            .unwrap();
        let src = rows();
        assert!(!engine.matches_frontend(&src, RowId(0), &[ColId(0), ColId(1)]));
        assert!(!engine.matches_frontend(&src, RowId(1), &[ColId(0), ColId(1)]));
    }

    #[test]
    fn impossible_range_is_flagged_but_not_fatal() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        let mut col = ColumnFilter::new(ColId(1), CombineLogic::And);
        col.conditions.push(FilterCondition::new(
            FilterOperator::GreaterThan,
            FilterValue::Single(Cell::Number(10.0)),
        ));
        col.conditions.push(FilterCondition::new(
            FilterOperator::LessThan,
            FilterValue::Single(Cell::Number(5.0)),
        ));
        engine
            .set_state(FilterState {
                columns: vec![col],
                quick: QuickFilter::default(),
            })
            .unwrap();
        let warnings = engine.detect_impossible();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].column, ColId(1));
    }

    #[test]
    fn conflicting_equals_targets_are_flagged() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        let mut col = ColumnFilter::new(ColId(0), CombineLogic::And);
        col.conditions.push(FilterCondition::new(
            FilterOperator::Equals,
            FilterValue::Single(Cell::Text("A".into())),
        ));
        col.conditions.push(FilterCondition::new(
            FilterOperator::Equals,
            FilterValue::Single(Cell::Text("B".into())),
        ));
        engine
            .set_state(FilterState {
                columns: vec![col],
                quick: QuickFilter::default(),
            })
            .unwrap();
        let warnings = engine.detect_impossible();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].column, ColId(0));
    }

    #[test]
    fn exact_duplicate_conditions_within_and_group_are_flagged() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        let mut col = ColumnFilter::new(ColId(0), CombineLogic::And);
        col.conditions.push(FilterCondition::new(
            FilterOperator::GreaterThan,
            FilterValue::Single(Cell::Number(5.0)),
        ));
        col.conditions.push(FilterCondition::new(
            FilterOperator::GreaterThan,
            FilterValue::Single(Cell::Number(5.0)),
        ));
        engine
            .set_state(FilterState {
                columns: vec![col],
                quick: QuickFilter::default(),
            })
            .unwrap();
        let warnings = engine.detect_impossible();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].reason.contains("duplicate"));
    }

    #[test]
    fn to_rest_to_graphql_to_sql_are_reachable_from_the_engine() {
        let mut engine = FilterEngine::new(FilterMode::Frontend);
        let mut col = ColumnFilter::new(ColId(0), CombineLogic::And);
        col.conditions.push(FilterCondition::new(
            FilterOperator::GreaterThan,
            FilterValue::Single(Cell::Number(10.0)),
        ));
        engine
            .set_state(FilterState {
                columns: vec![col],
                quick: QuickFilter::default(),
            })
            .unwrap();
        assert_eq!(engine.to_rest().0["conditions"].as_array().unwrap().len(), 1);
        assert!(engine.to_graphql()["where"]["col0"]["gt"].is_number());
        assert_eq!(engine.to_sql().where_clause, "(col0 > $1)");
    }
}
