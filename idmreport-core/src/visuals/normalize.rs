//! Input shape normalization shared by renderers
//!
//! Resolved data arrives as an array, as a record holding a well-known array
//! field, or as a single record. Precedence: explicit array, then the first
//! known nested array field, then a one-item wrap.

use crate::bands::Trajectory;
use crate::recipe::Section;
use crate::value::{as_number, coerce_string};
use serde_json::Value;

/// Nested array fields probed on a record, in order
pub const NESTED_ARRAY_FIELDS: &[&str] = &[
    "items",
    "dimensions",
    "chapters",
    "sub_indicators",
    "phases",
    "findings",
    "recommendations",
    "quick_wins",
    "risks",
    "key_imperatives",
    "action_steps",
];

/// Fields used to label an item, first present wins
pub const LABEL_FIELDS: &[&str] = &[
    "name",
    "label",
    "title",
    "theme",
    "short_label",
    "dimension_code",
    "chapter_code",
    "id",
];

/// Fields holding an item's score, first numeric wins
pub const SCORE_FIELDS: &[&str] = &["score_overall", "score", "value", "overall_health_score"];

/// Fields holding an item's prose
pub const TEXT_FIELDS: &[&str] = &[
    "text",
    "narrative",
    "description",
    "expected_outcomes",
    "summary",
];

/// Normalize a resolved value into a list of items
///
/// `None` and `null` yield an empty list. A section may force the nested
/// field with the `items_field` option.
pub fn normalize_items<'a>(value: Option<&'a Value>, section: &Section) -> Vec<&'a Value> {
    let Some(value) = value else {
        return Vec::new();
    };
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let forced = section.option_str("items_field");
            let nested = forced
                .into_iter()
                .chain(NESTED_ARRAY_FIELDS.iter().copied())
                .find_map(|field| map.get(field).and_then(Value::as_array));
            match nested {
                Some(items) => items.iter().collect(),
                None => vec![value],
            }
        }
        scalar => vec![scalar],
    }
}

/// Apply the `max_items` option
pub fn truncate<T>(mut items: Vec<T>, section: &Section) -> Vec<T> {
    if let Some(max) = section.option_usize("max_items") {
        items.truncate(max);
    }
    items
}

fn first_present<'a>(item: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .find_map(|f| item.get(*f).filter(|v| !v.is_null()))
}

/// Display label for an item
///
/// Honours the `label_field` option, then [`LABEL_FIELDS`]. Scalars label
/// themselves.
pub fn item_label(item: &Value, section: &Section) -> String {
    if let Some(field) = section.option_str("label_field") {
        if let Some(v) = item.get(field).filter(|v| !v.is_null()) {
            return coerce_string(Some(v));
        }
    }
    match item {
        Value::Object(_) => first_present(item, LABEL_FIELDS)
            .map(|v| coerce_string(Some(v)))
            .unwrap_or_default(),
        Value::Null => String::new(),
        other => coerce_string(Some(other)),
    }
}

/// Score for an item
///
/// Honours the `value_field` option, then [`SCORE_FIELDS`]. A bare number is
/// its own score.
pub fn item_score(item: &Value, section: &Section) -> Option<f64> {
    if let Some(field) = section.option_str("value_field") {
        return as_number(item.get(field));
    }
    match item {
        Value::Object(_) => SCORE_FIELDS.iter().find_map(|f| as_number(item.get(*f))),
        other => as_number(Some(other)),
    }
}

/// Prose for an item
///
/// Honours the `text_field` option, then [`TEXT_FIELDS`], then the label.
pub fn item_text(item: &Value, section: &Section) -> String {
    if let Some(field) = section.option_str("text_field") {
        if let Some(v) = item.get(field).filter(|v| !v.is_null()) {
            return coerce_string(Some(v));
        }
    }
    match item {
        Value::String(s) => s.clone(),
        Value::Object(_) => first_present(item, TEXT_FIELDS)
            .map(|v| coerce_string(Some(v)))
            .unwrap_or_else(|| item_label(item, section)),
        Value::Null => String::new(),
        other => coerce_string(Some(other)),
    }
}

/// Trajectory for an item: explicit `trajectory`, else derived from
/// `previous_score_overall`
pub fn item_trajectory(item: &Value, score: Option<f64>) -> Option<Trajectory> {
    if let Some(t) = item
        .get("trajectory")
        .and_then(Value::as_str)
        .and_then(Trajectory::parse)
    {
        return Some(t);
    }
    let previous = as_number(item.get("previous_score_overall"))?;
    score.map(|s| Trajectory::from_scores(s, Some(previous)))
}

/// Title-case a snake_case key: `score_overall` -> `Score Overall`
pub fn title_case(key: &str) -> String {
    key.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
