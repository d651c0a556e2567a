//! Bullet, numbered and checklist renderers

use super::normalize::{item_label, item_text, normalize_items, truncate, NESTED_ARRAY_FIELDS};
use super::{empty_state, RenderOptions};
use crate::datasource::ResolvedData;
use crate::html::html_escape;
use crate::recipe::Section;
use anyhow::Result;
use serde_json::Value;

fn list_items(data: &ResolvedData, section: &Section) -> Vec<String> {
    truncate(normalize_items(data.primary(), section), section)
        .into_iter()
        .map(|item| item_text(item, section))
        .filter(|text| !text.trim().is_empty())
        .collect()
}

fn render_list(tag: &str, class: &str, items: &[String]) -> String {
    let body: String = items
        .iter()
        .map(|text| format!("<li>{}</li>", html_escape(text)))
        .collect();
    format!(r#"<{tag} class="{class}">{body}</{tag}>"#)
}

pub fn render_bullet_list(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let items = list_items(data, section);
    if items.is_empty() {
        return Ok(empty_state("No items"));
    }
    Ok(render_list("ul", "bullet-list", &items))
}

pub fn render_numbered_list(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let items = list_items(data, section);
    if items.is_empty() {
        return Ok(empty_state("No items"));
    }
    Ok(render_list("ol", "numbered-list", &items))
}

/// Completion state from `checked_field` (default `completed`). Strings like
/// `done` count as checked.
fn is_checked(item: &Value, section: &Section) -> bool {
    let field = section.option_str("checked_field").unwrap_or("completed");
    match item.get(field) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.to_ascii_lowercase().as_str(),
            "done" | "complete" | "completed" | "yes" | "true"
        ),
        _ => false,
    }
}

/// A lone record whose only nested list is `action_steps` is one checklist
/// item, not a list of its steps
fn checklist_items<'a>(value: Option<&'a Value>, section: &Section) -> Vec<&'a Value> {
    if let Some(map) = value.and_then(Value::as_object) {
        let has_steps = map.get("action_steps").is_some_and(Value::is_array);
        let other_nested = NESTED_ARRAY_FIELDS
            .iter()
            .filter(|field| **field != "action_steps")
            .any(|field| map.get(*field).is_some_and(Value::is_array));
        if has_steps && !other_nested && section.option_str("items_field").is_none() {
            return value.into_iter().collect();
        }
    }
    normalize_items(value, section)
}

/// Checklist; records carrying `action_steps` render their steps nested
/// under the record's label
pub fn render_checklist(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let items = truncate(checklist_items(data.primary(), section), section);
    let mut body = String::new();
    for item in items {
        let checked = is_checked(item, section);
        let (mark, class) = if checked {
            ("\u{2611}", "checklist-item checked")
        } else {
            ("\u{2610}", "checklist-item")
        };
        let steps = item.get("action_steps").and_then(Value::as_array);
        let text = match steps {
            Some(_) => item_label(item, section),
            None => item_text(item, section),
        };
        if text.trim().is_empty() {
            continue;
        }
        body.push_str(&format!(
            r#"<li class="{class}"><span class="check">{mark}</span> {text}"#,
            class = class,
            mark = mark,
            text = html_escape(&text),
        ));
        if let Some(steps) = steps {
            body.push_str(r#"<ul class="checklist-steps">"#);
            for step in steps {
                body.push_str(&format!(
                    r#"<li><span class="check">{}</span> {}</li>"#,
                    mark,
                    html_escape(&item_text(step, section))
                ));
            }
            body.push_str("</ul>");
        }
        body.push_str("</li>");
    }
    if body.is_empty() {
        return Ok(empty_state("No items"));
    }
    Ok(format!(r#"<ul class="checklist">{}</ul>"#, body))
}
