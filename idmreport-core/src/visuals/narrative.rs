//! Prose renderers: free text, structured narrative and callouts

use super::normalize::{item_score, item_text, item_trajectory, normalize_items, title_case};
use super::{empty_state, RenderOptions};
use crate::bands::health_descriptor;
use crate::datasource::ResolvedData;
use crate::html::html_escape;
use crate::recipe::Section;
use crate::value::{coerce_string, format_number, sanitize};
use anyhow::Result;
use serde_json::Value;

/// Paragraphs split on blank lines
fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", html_escape(p)))
        .collect()
}

/// Text for prose sections: resolved data first, then the `text` option
fn section_text(data: &ResolvedData, section: &Section) -> String {
    let from_data: Vec<String> = normalize_items(data.primary(), section)
        .into_iter()
        .map(|item| item_text(item, section))
        .filter(|t| !t.trim().is_empty())
        .collect();
    if !from_data.is_empty() {
        return from_data.join("\n\n");
    }
    section.option_str("text").unwrap_or_default().to_string()
}

pub fn render_text_block(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let text = section_text(data, section);
    if text.trim().is_empty() {
        return Ok(empty_state("No content available"));
    }
    Ok(format!(r#"<div class="text-block">{}</div>"#, paragraphs(&text)))
}

/// Health score headline with descriptor and trajectory, a summary paragraph
/// and one bullet section per list field
///
/// Bullet sections come from the `bullet_fields` option (default
/// `key_imperatives`). A missing `descriptor` is derived from the score.
pub fn render_narrative_block(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let Some(record) = data.primary().filter(|v| !v.is_null()) else {
        return Ok(empty_state("No narrative available"));
    };
    if !record.is_object() {
        return render_text_block(data, section, options);
    }

    let mut html = String::from(r#"<div class="narrative-block">"#);
    let score = item_score(record, section).map(|s| sanitize(s, 100.0));
    if let Some(score) = score {
        let descriptor = record
            .get("descriptor")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| health_descriptor(score).to_string());
        let trajectory = item_trajectory(record, Some(score))
            .map(|t| {
                format!(
                    r#"<span class="trajectory trajectory-{}">{} {}</span>"#,
                    t.label().to_ascii_lowercase(),
                    t.arrow(),
                    t.label()
                )
            })
            .unwrap_or_default();
        html.push_str(&format!(
            r#"<div class="narrative-headline"><span class="score-value">{score}</span><span class="descriptor">{descriptor}</span>{trajectory}</div>"#,
            score = format_number(score.round()),
            descriptor = html_escape(&descriptor),
            trajectory = trajectory,
        ));
    }

    for field in ["summary", "narrative", "text"] {
        if let Some(text) = record.get(field).and_then(Value::as_str) {
            html.push_str(&paragraphs(text));
            break;
        }
    }

    let bullet_fields: Vec<String> = match section.options.get("bullet_fields").and_then(Value::as_array) {
        Some(fields) => fields
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => vec!["key_imperatives".to_string()],
    };
    for field in &bullet_fields {
        let Some(items) = record.get(field).and_then(Value::as_array) else {
            continue;
        };
        if items.is_empty() {
            continue;
        }
        html.push_str(&format!("<h3>{}</h3><ul>", html_escape(&title_case(field))));
        for item in items {
            html.push_str(&format!("<li>{}</li>", html_escape(&coerce_string(Some(item)))));
        }
        html.push_str("</ul>");
    }

    html.push_str("</div>");
    Ok(html)
}

fn css_slug(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Highlighted box; variant from the `variant` option or the first tone tag
pub fn render_callout_box(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let text = section_text(data, section);
    if text.trim().is_empty() {
        return Ok(empty_state("No content available"));
    }
    let variant = section
        .option_str("variant")
        .or_else(|| section.tone_tags.first().map(String::as_str))
        .map(css_slug)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "info".to_string());
    let heading = section
        .option_str("heading")
        .map(|h| format!(r#"<div class="callout-heading">{}</div>"#, html_escape(h)))
        .unwrap_or_default();
    Ok(format!(
        r#"<aside class="callout callout-{variant}">{heading}{body}</aside>"#,
        variant = variant,
        heading = heading,
        body = paragraphs(&text),
    ))
}
