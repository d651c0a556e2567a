//! Score tiles, metric cards, progress bars and the KPI dashboard

use super::normalize::{item_label, item_score, item_trajectory, normalize_items, truncate};
use super::{empty_state, RenderOptions};
use crate::bands::ScoreBand;
use crate::charts::{render_donut, DonutConfig, DonutDatum};
use crate::datasource::ResolvedData;
use crate::html::html_escape;
use crate::recipe::Section;
use crate::value::{coerce_string, format_number, sanitize};
use anyhow::Result;
use serde_json::Value;

/// Band for an item: the IDM's own `score_band` label when present, else
/// classified from the score
fn item_band(item: &Value, score: f64, options: &RenderOptions) -> ScoreBand {
    item.get("score_band")
        .and_then(Value::as_str)
        .and_then(ScoreBand::parse)
        .unwrap_or_else(|| options.thresholds.classify(score))
}

fn display_score(score: f64) -> String {
    format_number(sanitize(score, 100.0).round())
}

fn tile(item: &Value, fallback_label: &str, section: &Section, options: &RenderOptions) -> Option<String> {
    let score = item_score(item, section)?;
    let band = item_band(item, score, options);
    let label = match item_label(item, section) {
        l if l.is_empty() || item.is_number() => fallback_label.to_string(),
        l => l,
    };
    let trajectory = item_trajectory(item, Some(score))
        .map(|t| {
            format!(
                r#"<div class="score-trajectory trajectory-{cls}">{arrow} {label}</div>"#,
                cls = t.label().to_ascii_lowercase(),
                arrow = t.arrow(),
                label = t.label(),
            )
        })
        .unwrap_or_default();
    Some(format!(
        r#"<div class="score-tile {band_class}"><div class="score-value" style="color:{color}">{score}</div><div class="score-label">{label}</div><div class="score-band">{band}</div>{trajectory}</div>"#,
        band_class = band.css_class(),
        color = band.color(),
        score = display_score(score),
        label = html_escape(&label),
        band = band.label(),
        trajectory = trajectory,
    ))
}

pub fn render_score_tile(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let item = normalize_items(data.primary(), section).into_iter().next();
    Ok(item
        .and_then(|item| tile(item, &section.title, section, options))
        .unwrap_or_else(|| empty_state("No score available")))
}

pub fn render_score_tiles(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let items = truncate(normalize_items(data.primary(), section), section);
    let tiles: Vec<String> = items
        .iter()
        .filter_map(|item| tile(item, "", section, options))
        .collect();
    if tiles.is_empty() {
        return Ok(empty_state("No scores available"));
    }
    Ok(format!(r#"<div class="score-tiles">{}</div>"#, tiles.concat()))
}

/// Headline value with optional unit and peer percentile
pub fn render_metric_card(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let Some(item) = normalize_items(data.primary(), section).into_iter().next() else {
        return Ok(empty_state("No data available"));
    };
    let value = match item_score(item, section) {
        Some(n) => format_number((n * 10.0).round() / 10.0),
        None if item.is_object() => return Ok(empty_state("No value available")),
        None => coerce_string(Some(item)),
    };
    let label = match item_label(item, section) {
        l if l.is_empty() || !item.is_object() => section.title.clone(),
        l => l,
    };
    let unit = section
        .option_str("unit")
        .map(|u| format!(r#"<span class="metric-unit">{}</span>"#, html_escape(u)))
        .unwrap_or_default();
    let percentile = item
        .pointer("/benchmark/peer_percentile")
        .and_then(Value::as_f64)
        .map(|p| {
            format!(
                r#"<div class="metric-context">Peer percentile: {}</div>"#,
                format_number(p.round())
            )
        })
        .unwrap_or_default();
    Ok(format!(
        r#"<div class="metric-card"><div class="metric-value">{value}{unit}</div><div class="metric-label">{label}</div>{percentile}</div>"#,
        value = html_escape(&value),
        unit = unit,
        label = html_escape(&label),
        percentile = percentile,
    ))
}

/// One labelled progress row per scored item
pub fn render_progress_bar(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let items = truncate(normalize_items(data.primary(), section), section);
    let rows: Vec<String> = items
        .iter()
        .filter_map(|item| {
            let score = sanitize(item_score(item, section)?, 100.0);
            let band = item_band(item, score, options);
            let label = match item_label(item, section) {
                l if l.is_empty() || item.is_number() => section.title.clone(),
                l => l,
            };
            Some(format!(
                r#"<div class="progress-row"><span class="progress-label">{label}</span><div class="progress-track"><div class="progress-fill {band_class}" style="width:{width}%;background:{color}"></div></div><span class="progress-value">{value}</span></div>"#,
                label = html_escape(&label),
                band_class = band.css_class(),
                width = format_number((score * 10.0).round() / 10.0),
                color = band.color(),
                value = display_score(score),
            ))
        })
        .collect();
    if rows.is_empty() {
        return Ok(empty_state("No scores available"));
    }
    Ok(format!(r#"<div class="progress-bars">{}</div>"#, rows.concat()))
}

/// Band distribution donut next to a grid of score tiles
pub fn render_kpi_dashboard(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let items = truncate(normalize_items(data.primary(), section), section);
    let scored: Vec<(&Value, f64)> = items
        .iter()
        .filter_map(|item| item_score(item, section).map(|s| (*item, sanitize(s, 100.0))))
        .collect();
    if scored.is_empty() {
        return Ok(empty_state("No KPIs available"));
    }

    let distribution: Vec<DonutDatum> = ScoreBand::ALL
        .iter()
        .map(|band| DonutDatum {
            label: band.label().to_string(),
            value: scored
                .iter()
                .filter(|(item, score)| item_band(item, *score, options) == *band)
                .count() as f64,
            color: Some(band.color().to_string()),
        })
        .collect();
    let average = scored.iter().map(|(_, s)| s).sum::<f64>() / scored.len() as f64;
    let donut = render_donut(
        &distribution,
        &DonutConfig::with_size(section.option_f64("donut_size").unwrap_or(200.0)),
        Some(&display_score(average)),
    );

    let tiles: String = scored
        .iter()
        .filter_map(|(item, _)| tile(item, "", section, options))
        .collect();
    Ok(format!(
        r#"<div class="kpi-dashboard"><div class="kpi-summary">{donut}<div class="kpi-caption">Average score across {n} KPIs</div></div><div class="score-tiles">{tiles}</div></div>"#,
        donut = donut,
        n = scored.len(),
        tiles = tiles,
    ))
}
