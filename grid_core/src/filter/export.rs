//! Serializing `FilterState` for host backends that expect a REST query
//! object, a GraphQL `where` object, or a parameterized SQL clause. The
//! shapes below follow common `serde_json`-based conventions for ad-hoc
//! JSON construction.

use serde_json::{json, Value};

use super::{CombineLogic, FilterOperator, FilterState, FilterValue};
use crate::cell::Cell;

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Number(n) => json!(n),
        Cell::Text(s) => json!(s),
        Cell::Boolean(b) => json!(b),
        Cell::Timestamp(t) => json!(t),
        Cell::ChipList(chips) => json!(chips.iter().map(|c| c.label.clone()).collect::<Vec<_>>()),
        Cell::Arbitrary(s) => json!(s),
    }
}

fn operator_key(op: FilterOperator) -> &'static str {
    match op {
        FilterOperator::Equals => "eq",
        FilterOperator::NotEquals => "ne",
        FilterOperator::Contains => "contains",
        FilterOperator::NotContains => "notContains",
        FilterOperator::StartsWith => "startsWith",
        FilterOperator::EndsWith => "endsWith",
        FilterOperator::GreaterThan => "gt",
        FilterOperator::LessThan => "lt",
        FilterOperator::GreaterThanOrEqual => "gte",
        FilterOperator::LessThanOrEqual => "lte",
        FilterOperator::Blank => "blank",
        FilterOperator::NotBlank => "notBlank",
        FilterOperator::Between => "between",
        FilterOperator::In => "in",
        FilterOperator::NotIn => "notIn",
        FilterOperator::Regex => "regex",
    }
}

fn value_to_json(value: &FilterValue) -> Value {
    match value {
        FilterValue::None => Value::Null,
        FilterValue::Single(c) => cell_to_json(c),
        FilterValue::Range(a, b) => json!([cell_to_json(a), cell_to_json(b)]),
        FilterValue::List(items) => json!(items.iter().map(cell_to_json).collect::<Vec<_>>()),
    }
}

/// REST-style flat representation: one entry per `(column, operator)` pair.
#[derive(Clone, Debug)]
pub struct RestFilter(pub Value);

/// SQL-style representation: a parameterized `WHERE` clause plus its
/// positional bind values, in the order referenced by the clause.
#[derive(Clone, Debug)]
pub struct SqlFilter {
    pub where_clause: String,
    pub positional_params: Vec<Value>,
}

pub fn to_rest(state: &FilterState) -> RestFilter {
    let mut entries = Vec::new();
    for col in &state.columns {
        for cond in &col.conditions {
            entries.push(json!({
                "column": col.column.0,
                "op": operator_key(cond.op),
                "value": value_to_json(&cond.value),
                "combine": if col.logic == CombineLogic::And { "and" } else { "or" },
            }));
        }
    }
    let mut root = json!({ "conditions": entries });
    if !state.quick.is_empty() {
        root["quick"] = json!(state.quick.text);
    }
    RestFilter(root)
}

pub fn to_graphql(state: &FilterState) -> Value {
    let mut where_obj = serde_json::Map::new();
    for col in &state.columns {
        if col.conditions.is_empty() {
            continue;
        }
        let field = format!("col{}", col.column.0);
        let mut ops = serde_json::Map::new();
        for cond in &col.conditions {
            ops.insert(operator_key(cond.op).to_string(), value_to_json(&cond.value));
        }
        where_obj.insert(field, Value::Object(ops));
    }
    let mut root = json!({ "where": where_obj });
    if !state.quick.is_empty() {
        root["search"] = json!(state.quick.text);
    }
    root
}

fn sql_operator(op: FilterOperator, param_index: &mut usize, params: &mut Vec<Value>, value: &FilterValue) -> String {
    let mut next_param = |v: Value| {
        *param_index += 1;
        params.push(v);
        format!("${}", *param_index)
    };
    match (op, value) {
        (FilterOperator::Equals, FilterValue::Single(c)) => format!("= {}", next_param(cell_to_json(c))),
        (FilterOperator::NotEquals, FilterValue::Single(c)) => format!("<> {}", next_param(cell_to_json(c))),
        (FilterOperator::Contains, FilterValue::Single(c)) => {
            format!("LIKE {}", next_param(json!(format!("%{}%", c.to_sort_string()))))
        }
        (FilterOperator::NotContains, FilterValue::Single(c)) => {
            format!("NOT LIKE {}", next_param(json!(format!("%{}%", c.to_sort_string()))))
        }
        (FilterOperator::StartsWith, FilterValue::Single(c)) => {
            format!("LIKE {}", next_param(json!(format!("{}%", c.to_sort_string()))))
        }
        (FilterOperator::EndsWith, FilterValue::Single(c)) => {
            format!("LIKE {}", next_param(json!(format!("%{}", c.to_sort_string()))))
        }
        (FilterOperator::GreaterThan, FilterValue::Single(c)) => format!("> {}", next_param(cell_to_json(c))),
        (FilterOperator::LessThan, FilterValue::Single(c)) => format!("< {}", next_param(cell_to_json(c))),
        (FilterOperator::GreaterThanOrEqual, FilterValue::Single(c)) => format!(">= {}", next_param(cell_to_json(c))),
        (FilterOperator::LessThanOrEqual, FilterValue::Single(c)) => format!("<= {}", next_param(cell_to_json(c))),
        (FilterOperator::Blank, _) => "IS NULL".to_string(),
        (FilterOperator::NotBlank, _) => "IS NOT NULL".to_string(),
        (FilterOperator::Between, FilterValue::Range(a, b)) => {
            format!("BETWEEN {} AND {}", next_param(cell_to_json(a)), next_param(cell_to_json(b)))
        }
        (FilterOperator::In, FilterValue::List(items)) => {
            let placeholders: Vec<String> = items.iter().map(|c| next_param(cell_to_json(c))).collect();
            format!("IN ({})", placeholders.join(", "))
        }
        (FilterOperator::NotIn, FilterValue::List(items)) => {
            let placeholders: Vec<String> = items.iter().map(|c| next_param(cell_to_json(c))).collect();
            format!("NOT IN ({})", placeholders.join(", "))
        }
        (FilterOperator::Regex, FilterValue::Single(c)) => format!("~ {}", next_param(cell_to_json(c))),
        _ => "IS NOT NULL".to_string(),
    }
}

pub fn to_sql(state: &FilterState) -> SqlFilter {
    let mut params = Vec::new();
    let mut param_index = 0usize;
    let mut column_clauses = Vec::new();
    for col in &state.columns {
        if col.conditions.is_empty() {
            continue;
        }
        let parts: Vec<String> = col
            .conditions
            .iter()
            .map(|cond| format!("col{} {}", col.column.0, sql_operator(cond.op, &mut param_index, &mut params, &cond.value)))
            .collect();
        let joiner = if col.logic == CombineLogic::And { " AND " } else { " OR " };
        column_clauses.push(format!("({})", parts.join(joiner)));
    }
    let where_clause = if column_clauses.is_empty() {
        "TRUE".to_string()
    } else {
        column_clauses.join(" AND ")
    };
    SqlFilter {
        where_clause,
        positional_params: params,
    }
}
