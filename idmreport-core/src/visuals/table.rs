//! Generic table with column inference, and the side-by-side comparison table

use super::normalize::{item_label, item_score, normalize_items, title_case, truncate};
use super::{empty_state, RenderOptions};
use crate::datasource::ResolvedData;
use crate::html::html_escape;
use crate::recipe::Section;
use crate::value::{coerce_string, format_number};
use anyhow::{bail, Result};
use serde_json::Value;

/// Bookkeeping fields never shown as inferred columns
const DENYLIST: &[&str] = &[
    "id",
    "evidence_refs",
    "linked_finding_ids",
    "linked_recommendation_ids",
    "contributing_question_ids",
    "sub_indicators",
];

fn is_denied(key: &str) -> bool {
    DENYLIST.contains(&key) || key.ends_with("_id") || key.ends_with("_ids")
}

/// Columns from the first item's keys, minus denylisted fields, capped
pub fn infer_columns(first: &Value, max_columns: usize) -> Vec<String> {
    match first.as_object() {
        Some(map) => map
            .keys()
            .filter(|k| !is_denied(k))
            .take(max_columns)
            .cloned()
            .collect(),
        None => Vec::new(),
    }
}

/// Cell text: absent/null `-`, bool `Yes`/`No`, arrays comma-joined,
/// objects as JSON
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| coerce_string(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => coerce_string(Some(other)),
    }
}

pub fn render_table(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let items = truncate(normalize_items(data.primary(), section), section);
    let Some(first) = items.first() else {
        return Ok(empty_state("No data available"));
    };

    let max_columns = section
        .option_usize("max_columns")
        .unwrap_or(options.max_columns)
        .max(1);
    let explicit: Option<Vec<String>> = section
        .options
        .get("columns")
        .and_then(Value::as_array)
        .map(|cols| {
            cols.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });
    let columns = match explicit {
        Some(cols) if !cols.is_empty() => cols,
        _ => infer_columns(first, max_columns),
    };

    let mut html = String::from(r#"<table class="data-table"><thead><tr>"#);
    if columns.is_empty() {
        // Scalar items: one value column
        html.push_str("<th>Value</th></tr></thead><tbody>");
        for item in &items {
            html.push_str(&format!(
                "<tr><td>{}</td></tr>",
                html_escape(&format_cell(Some(*item)))
            ));
        }
    } else {
        for col in &columns {
            html.push_str(&format!("<th>{}</th>", html_escape(&title_case(col))));
        }
        html.push_str("</tr></thead><tbody>");
        for item in &items {
            html.push_str("<tr>");
            for col in &columns {
                html.push_str(&format!(
                    "<td>{}</td>",
                    html_escape(&format_cell(item.get(col.as_str())))
                ));
            }
            html.push_str("</tr>");
        }
    }
    html.push_str("</tbody></table>");
    Ok(html)
}

fn ranked_cell(item: Option<&&Value>, section: &Section) -> String {
    let Some(item) = item else {
        return "<td></td>".to_string();
    };
    let score = item_score(item, section)
        .map(|s| format!(r#" <span class="rank-score">{}</span>"#, format_number(s.round())))
        .unwrap_or_default();
    format!("<td>{}{}</td>", html_escape(&item_label(item, section)), score)
}

/// Two ranked lists side by side, one per data source
///
/// Needs at least two data sources; a section configured with fewer fails so
/// the report shows why it degraded.
pub fn render_comparison_table(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    if data.len() < 2 {
        bail!(
            "comparison_table needs two data sources, section '{}' has {}",
            section.id,
            data.len()
        );
    }
    let ids: Vec<&str> = data.iter().map(|(id, _)| id).collect();
    let left_title = section
        .option_str("left_title")
        .map(str::to_string)
        .unwrap_or_else(|| title_case(ids[0]));
    let right_title = section
        .option_str("right_title")
        .map(str::to_string)
        .unwrap_or_else(|| title_case(ids[1]));

    let left = truncate(normalize_items(data.nth(0), section), section);
    let right = truncate(normalize_items(data.nth(1), section), section);
    if left.is_empty() && right.is_empty() {
        return Ok(empty_state("No data available"));
    }

    let mut html = format!(
        r#"<table class="comparison-table"><thead><tr><th>#</th><th>{}</th><th>{}</th></tr></thead><tbody>"#,
        html_escape(&left_title),
        html_escape(&right_title),
    );
    for rank in 0..left.len().max(right.len()) {
        html.push_str(&format!(
            "<tr><td class=\"rank\">{}</td>{}{}</tr>",
            rank + 1,
            ranked_cell(left.get(rank), section),
            ranked_cell(right.get(rank), section),
        ));
    }
    html.push_str("</tbody></table>");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(options: Value) -> Section {
        Section {
            id: "t".to_string(),
            title: "T".to_string(),
            visual_type: "table".to_string(),
            options,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_array_is_no_data_message() {
        let out = render_table(
            &ResolvedData::single(json!([])),
            &section(Value::Null),
            &RenderOptions::default(),
        )
        .unwrap();
        assert!(out.contains("No data available"));
        assert!(!out.contains("<table"));
    }

    #[test]
    fn test_inferred_columns_skip_bookkeeping_fields() {
        let first = json!({
            "id": "F1",
            "dimension_code": "STR",
            "sub_indicator_id": "STR_01",
            "short_label": "x",
            "evidence_refs": {},
            "linked_finding_ids": [],
            "narrative": "y"
        });
        let cols = infer_columns(&first, 6);
        assert_eq!(cols, vec!["dimension_code", "short_label", "narrative"]);
    }

    #[test]
    fn test_columns_capped() {
        let first = json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6, "g": 7, "h": 8});
        assert_eq!(infer_columns(&first, 6).len(), 6);
        let out = render_table(
            &ResolvedData::single(json!([first])),
            &section(json!({"max_columns": 2})),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(out.matches("<th>").count(), 2);
    }

    #[test]
    fn test_cell_formatting() {
        assert_eq!(format_cell(None), "-");
        assert_eq!(format_cell(Some(&Value::Null)), "-");
        assert_eq!(format_cell(Some(&json!(true))), "Yes");
        assert_eq!(format_cell(Some(&json!(false))), "No");
        assert_eq!(format_cell(Some(&json!(["a", "b"]))), "a, b");
        assert_eq!(format_cell(Some(&json!({"k": 1}))), r#"{"k":1}"#);
        assert_eq!(format_cell(Some(&json!(72.0))), "72");
    }

    #[test]
    fn test_headers_title_cased_and_cells_escaped() {
        let out = render_table(
            &ResolvedData::single(json!([{"short_label": "<b>", "is_core": true}])),
            &section(Value::Null),
            &RenderOptions::default(),
        )
        .unwrap();
        assert!(out.contains("<th>Short Label</th>"));
        assert!(out.contains("<td>&lt;b&gt;</td>"));
        assert!(out.contains("<td>Yes</td>"));
    }

    #[test]
    fn test_explicit_columns_keep_order() {
        let out = render_table(
            &ResolvedData::single(json!([{"a": 1, "b": 2}])),
            &section(json!({"columns": ["b", "missing"]})),
            &RenderOptions::default(),
        )
        .unwrap();
        assert!(out.contains("<th>B</th><th>Missing</th>"));
        assert!(out.contains("<td>2</td><td>-</td>"));
    }

    #[test]
    fn test_comparison_table_needs_two_sources() {
        let err = render_comparison_table(
            &ResolvedData::single(json!([1])),
            &section(Value::Null),
            &RenderOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("two data sources"));
    }

    #[test]
    fn test_comparison_table_pads_shorter_side() {
        let data = ResolvedData::from_entries([
            ("top_strengths", Some(json!([{"name": "Ops", "score_overall": 88}, {"name": "Fin", "score_overall": 81}]))),
            ("top_gaps", Some(json!([{"name": "Sales", "score_overall": 41}]))),
        ]);
        let out = render_comparison_table(&data, &section(Value::Null), &RenderOptions::default()).unwrap();
        assert!(out.contains("<th>Top Strengths</th><th>Top Gaps</th>"));
        assert_eq!(out.matches("<td class=\"rank\">").count(), 2);
        assert!(out.contains("<td></td>"));
        assert!(out.contains("rank-score\">88"));
    }
}
