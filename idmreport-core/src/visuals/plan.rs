//! Timeline, roadmap and risk matrix renderers

use super::normalize::{item_label, item_text, normalize_items, truncate};
use super::{empty_state, RenderOptions};
use crate::charts::{render_timeline as timeline_svg, TimelineConfig, TimelinePhase};
use crate::datasource::ResolvedData;
use crate::html::html_escape;
use crate::recipe::Section;
use crate::value::{as_number, coerce_string};
use anyhow::Result;
use serde_json::Value;

/// Field holding a phase's time horizon
const HORIZON_FIELDS: &[&str] = &["time_horizon", "horizon", "timeframe"];

fn horizon(item: &Value) -> Option<String> {
    HORIZON_FIELDS
        .iter()
        .find_map(|f| item.get(*f).filter(|v| !v.is_null()))
        .map(|v| coerce_string(Some(v)))
}

fn phases(data: &ResolvedData, section: &Section) -> Vec<TimelinePhase> {
    truncate(normalize_items(data.primary(), section), section)
        .into_iter()
        .map(|item| TimelinePhase {
            label: item_label(item, section),
            caption: horizon(item),
        })
        .collect()
}

fn timeline_config(section: &Section) -> TimelineConfig {
    let mut cfg = TimelineConfig::with_width(section.option_f64("width").unwrap_or(720.0));
    if let Some(start) = section.option_str("start_label") {
        cfg.start_label = start.to_string();
    }
    if let Some(end) = section.option_str("end_label") {
        cfg.end_label = end.to_string();
    }
    cfg
}

pub fn render_timeline(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let phases = phases(data, section);
    if phases.is_empty() {
        return Ok(empty_state("No phases available"));
    }
    Ok(timeline_svg(
        &phases,
        &timeline_config(section),
        &options.brand.primary_color,
        &options.brand.accent_color,
    ))
}

/// Timeline followed by one detail card per phase
pub fn render_roadmap_timeline(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let items = truncate(normalize_items(data.primary(), section), section);
    if items.is_empty() {
        return Ok(empty_state("No roadmap available"));
    }
    let mut html = String::from(r#"<div class="roadmap">"#);
    html.push_str(&render_timeline(data, section, options)?);
    html.push_str(r#"<div class="roadmap-phases">"#);
    for (i, item) in items.iter().enumerate() {
        let caption = horizon(item)
            .map(|h| format!(r#" <span class="roadmap-horizon">{}</span>"#, html_escape(&h)))
            .unwrap_or_default();
        let narrative = match item.get("narrative").and_then(Value::as_str) {
            Some(text) => format!("<p>{}</p>", html_escape(text)),
            None => String::new(),
        };
        let linked = item
            .get("linked_recommendation_ids")
            .and_then(Value::as_array)
            .filter(|ids| !ids.is_empty())
            .map(|ids| {
                format!(
                    r#"<div class="roadmap-linked">{} linked recommendation{}</div>"#,
                    ids.len(),
                    if ids.len() == 1 { "" } else { "s" }
                )
            })
            .unwrap_or_default();
        html.push_str(&format!(
            r#"<div class="roadmap-phase"><h3><span class="roadmap-step">{n}</span> {label}{caption}</h3>{narrative}{linked}</div>"#,
            n = i + 1,
            label = html_escape(&item_label(item, section)),
            caption = caption,
            narrative = narrative,
            linked = linked,
        ));
    }
    html.push_str("</div></div>");
    Ok(html)
}

/// Map a severity/likelihood rating onto 1 (low) ..= 3 (high)
///
/// Accepts words (`low`, `medium`, `high`, ...) or numbers on a 1-3, 1-5 or
/// 0-100 scale. Unrecognized ratings yield `None`.
pub fn rating_level(value: Option<&Value>) -> Option<u8> {
    let value = value?;
    if let Some(word) = value.as_str() {
        match word.trim().to_ascii_lowercase().as_str() {
            "low" | "minor" | "unlikely" | "rare" => return Some(1),
            "medium" | "moderate" | "possible" => return Some(2),
            "high" | "major" | "critical" | "severe" | "likely" | "almost certain" => {
                return Some(3)
            }
            _ => {}
        }
    }
    let n = as_number(Some(value))?;
    let level = if n <= 0.0 {
        return None;
    } else if n <= 3.0 {
        n.round()
    } else if n <= 5.0 {
        match n.round() as u8 {
            0..=2 => 1.0,
            3 => 2.0,
            _ => 3.0,
        }
    } else if n < 34.0 {
        1.0
    } else if n < 67.0 {
        2.0
    } else {
        3.0
    };
    Some((level as u8).clamp(1, 3))
}

const LEVEL_NAMES: [&str; 3] = ["Low", "Medium", "High"];

/// 3x3 grid: likelihood rows (high at top) by severity columns
pub fn render_risk_matrix(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let items = normalize_items(data.primary(), section);
    if items.is_empty() {
        return Ok(empty_state("No risks identified"));
    }

    // cells[likelihood-1][severity-1]
    let mut cells: [[Vec<String>; 3]; 3] = Default::default();
    let mut unplaced = 0usize;
    for item in &items {
        let severity = rating_level(item.get("severity"));
        let likelihood = rating_level(item.get("likelihood"));
        let (Some(sev), Some(lik)) = (severity, likelihood) else {
            unplaced += 1;
            continue;
        };
        let label = match item_label(item, section) {
            l if l.is_empty() => item_text(item, section),
            l => l,
        };
        cells[(lik - 1) as usize][(sev - 1) as usize].push(label);
    }

    let mut html = String::from(
        r#"<table class="risk-matrix"><thead><tr><th>Likelihood \ Severity</th>"#,
    );
    for name in LEVEL_NAMES {
        html.push_str(&format!("<th>{}</th>", name));
    }
    html.push_str("</tr></thead><tbody>");
    for l in (0..3).rev() {
        html.push_str(&format!("<tr><th>{}</th>", LEVEL_NAMES[l]));
        for (s, labels) in cells[l].iter().enumerate() {
            let exposure = (l + 1) * (s + 1);
            let level = if exposure >= 6 {
                "high"
            } else if exposure >= 3 {
                "medium"
            } else {
                "low"
            };
            let body: String = labels
                .iter()
                .map(|label| format!(r#"<span class="risk-item">{}</span>"#, html_escape(label)))
                .collect();
            html.push_str(&format!(
                r#"<td class="risk-cell risk-{level}" data-count="{count}">{body}</td>"#,
                level = level,
                count = labels.len(),
                body = body,
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    if unplaced > 0 {
        html.push_str(&format!(
            r#"<p class="risk-unplaced">{} risk{} without a recognizable severity or likelihood</p>"#,
            unplaced,
            if unplaced == 1 { "" } else { "s" }
        ));
    }
    Ok(html)
}
