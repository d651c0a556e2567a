//! Filter / sort / paginate pipeline over resolved sequences
//!
//! Invariants:
//! - Non-sequence input is returned unchanged
//! - Filters combine with AND and never reorder
//! - Sorting is stable for equal keys
//! - Offset, then limit, strictly after filtering and sorting

use crate::recipe::{Filter, Operator, SortDirection, SortSpec};
use crate::value::{as_number, coerce_string, locale_cmp, strict_eq};
use serde_json::Value;
use std::cmp::Ordering;

/// Post-processing steps of a data source
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineSpec<'a> {
    pub filters: &'a [Filter],
    pub sort: Option<&'a SortSpec>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Single predicate extracted from a [`Filter`] entry
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<'a> {
    DimensionCodes(&'a [String]),
    ChapterCodes(&'a [String]),
    Kind(&'a str),
    ScoreRange { min: Option<f64>, max: Option<f64> },
    Compare {
        field: &'a str,
        operator: Operator,
        value: &'a Value,
    },
}

impl Filter {
    /// Predicates for every recognized key set on this entry
    pub fn predicates(&self) -> Vec<Predicate<'_>> {
        let mut preds = Vec::new();
        if let Some(codes) = &self.dimension_codes {
            preds.push(Predicate::DimensionCodes(codes));
        }
        if let Some(codes) = &self.chapter_codes {
            preds.push(Predicate::ChapterCodes(codes));
        }
        if let Some(kind) = &self.kind {
            preds.push(Predicate::Kind(kind));
        }
        if self.min_score.is_some() || self.max_score.is_some() {
            preds.push(Predicate::ScoreRange {
                min: self.min_score,
                max: self.max_score,
            });
        }
        if let (Some(field), Some(operator)) = (&self.field, self.operator) {
            preds.push(Predicate::Compare {
                field,
                operator,
                value: self.value.as_ref().unwrap_or(&Value::Null),
            });
        }
        preds
    }

    /// Does `item` satisfy every predicate of this entry?
    pub fn matches(&self, item: &Value) -> bool {
        self.predicates().iter().all(|p| p.matches(item))
    }
}

fn code_in(item: &Value, field: &str, codes: &[String]) -> bool {
    item.get(field)
        .and_then(Value::as_str)
        .is_some_and(|code| codes.iter().any(|c| c == code))
}

impl Predicate<'_> {
    pub fn matches(&self, item: &Value) -> bool {
        match self {
            Predicate::DimensionCodes(codes) => code_in(item, "dimension_code", codes),
            Predicate::ChapterCodes(codes) => code_in(item, "chapter_code", codes),
            Predicate::Kind(kind) => item.get("type").and_then(Value::as_str) == Some(*kind),
            Predicate::ScoreRange { min, max } => {
                let Some(score) = as_number(item.get("score_overall")) else {
                    return false;
                };
                min.map_or(true, |m| score >= m) && max.map_or(true, |m| score <= m)
            }
            Predicate::Compare {
                field,
                operator,
                value,
            } => compare(item.get(*field), *operator, value),
        }
    }
}

fn compare(actual: Option<&Value>, operator: Operator, expected: &Value) -> bool {
    let numeric = |cmp: fn(f64, f64) -> bool| match (as_number(actual), as_number(Some(expected))) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    };
    match operator {
        Operator::Eq => strict_eq(actual, expected),
        Operator::Ne => !strict_eq(actual, expected),
        Operator::Gt => numeric(|a, b| a > b),
        Operator::Gte => numeric(|a, b| a >= b),
        Operator::Lt => numeric(|a, b| a < b),
        Operator::Lte => numeric(|a, b| a <= b),
        Operator::In => expected
            .as_array()
            .is_some_and(|list| list.iter().any(|v| strict_eq(actual, v))),
        Operator::NotIn => expected
            .as_array()
            .map_or(true, |list| !list.iter().any(|v| strict_eq(actual, v))),
        Operator::Contains => match actual {
            Some(a) => coerce_string(Some(a)).contains(&coerce_string(Some(expected))),
            None => false,
        },
        Operator::Unknown => {
            tracing::warn!("unknown filter operator; entry treated as always-true");
            true
        }
    }
}

/// Compare two items by `field` per the sort rules: numbers numerically,
/// anything else as locale-ordered strings.
fn compare_items(a: &Value, b: &Value, field: &str, direction: SortDirection) -> Ordering {
    let (va, vb) = (a.get(field), b.get(field));
    match (va, vb) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let diff = (x.as_f64().unwrap_or(0.0) - y.as_f64().unwrap_or(0.0)) * direction.factor();
            diff.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
        }
        _ => {
            let base = locale_cmp(&sort_key(va), &sort_key(vb));
            if direction.factor() < 0.0 {
                base.reverse()
            } else {
                base
            }
        }
    }
}

fn sort_key(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        other => coerce_string(other),
    }
}

/// Apply filters, sort and pagination to `data`
pub fn apply_pipeline(data: Value, spec: &PipelineSpec<'_>) -> Value {
    let Value::Array(items) = data else {
        return data;
    };

    let mut items: Vec<Value> = items
        .into_iter()
        .filter(|item| spec.filters.iter().all(|f| f.matches(item)))
        .collect();

    if let Some(sort) = spec.sort {
        // Vec::sort_by is stable
        items.sort_by(|a, b| compare_items(a, b, &sort.field, sort.direction));
    }

    let offset = spec.offset.unwrap_or(0);
    let paged: Vec<Value> = match spec.limit {
        Some(limit) => items.into_iter().skip(offset).take(limit).collect(),
        None => items.into_iter().skip(offset).collect(),
    };

    Value::Array(paged)
}
