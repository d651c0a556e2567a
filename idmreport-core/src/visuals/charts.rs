//! Chart-backed visuals: radar, bar, donut and gap
//!
//! These adapt normalized items into chart series and hand off to the
//! geometry generators in [`crate::charts`].

use super::normalize::{item_label, item_score, normalize_items, truncate};
use super::{empty_state, RenderOptions};
use crate::charts::{
    render_bar_chart as bar_svg, render_donut, render_radar, render_waterfall, BarConfig,
    BarDatum, DonutConfig, DonutDatum, GapDatum, RadarAxis, RadarConfig, WaterfallConfig,
};
use crate::datasource::ResolvedData;
use crate::recipe::Section;
use crate::value::{as_number, coerce_string};
use anyhow::Result;
use serde_json::Value;

/// `(label, score)` pairs for every item that carries a score
fn scored_series(data: &ResolvedData, section: &Section) -> Vec<(String, f64)> {
    truncate(normalize_items(data.primary(), section), section)
        .into_iter()
        .filter_map(|item| Some((item_label(item, section), item_score(item, section)?)))
        .collect()
}

pub fn render_radar_chart(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let axes: Vec<RadarAxis> = scored_series(data, section)
        .into_iter()
        .map(|(label, score)| RadarAxis { label, score })
        .collect();
    if axes.is_empty() {
        return Ok(empty_state("No scores available"));
    }
    let mut cfg = RadarConfig::with_size(section.option_f64("size").unwrap_or(options.radar_size));
    cfg.industry_average = section
        .option_f64("industry_average")
        .unwrap_or(options.industry_average);
    cfg.top_quartile = section
        .option_f64("top_quartile")
        .unwrap_or(options.top_quartile);
    cfg.thresholds = options.thresholds;
    Ok(render_radar(&axes, &cfg, &options.brand.primary_color))
}

pub fn render_bar_chart(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let bars: Vec<BarDatum> = scored_series(data, section)
        .into_iter()
        .map(|(label, value)| BarDatum { label, value })
        .collect();
    if bars.is_empty() {
        return Ok(empty_state("No scores available"));
    }
    let mut cfg = BarConfig::with_width(section.option_f64("width").unwrap_or(options.bar_width));
    cfg.thresholds = options.thresholds;
    Ok(bar_svg(&bars, &cfg))
}

/// Donut over item values, or over item counts grouped by the `group_by`
/// field (e.g. findings by `type`)
pub fn render_donut_chart(
    data: &ResolvedData,
    section: &Section,
    _options: &RenderOptions,
) -> Result<String> {
    let items = normalize_items(data.primary(), section);
    let slices: Vec<DonutDatum> = match section.option_str("group_by") {
        Some(field) => {
            let mut groups: Vec<(String, f64)> = Vec::new();
            for item in &items {
                let key = match item.get(field) {
                    Some(v) if !v.is_null() => coerce_string(Some(v)),
                    _ => "Other".to_string(),
                };
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, count)) => *count += 1.0,
                    None => groups.push((key, 1.0)),
                }
            }
            groups
                .into_iter()
                .map(|(label, value)| DonutDatum {
                    label,
                    value,
                    color: None,
                })
                .collect()
        }
        None => truncate(items, section)
            .into_iter()
            .filter_map(|item| {
                Some(DonutDatum {
                    label: item_label(item, section),
                    value: item_score(item, section)?,
                    color: item.get("color").and_then(Value::as_str).map(str::to_string),
                })
            })
            .collect(),
    };
    if !slices.iter().any(|s| s.value.is_finite() && s.value > 0.0) {
        return Ok(empty_state("No data available"));
    }
    let cfg = DonutConfig::with_size(section.option_f64("size").unwrap_or(220.0));
    Ok(render_donut(&slices, &cfg, section.option_str("center_label")))
}

/// Gap-to-target waterfall
///
/// Targets come from the `target_field` of each item when set, else the
/// `target` option, else the excellence threshold.
pub fn render_gap_chart(
    data: &ResolvedData,
    section: &Section,
    options: &RenderOptions,
) -> Result<String> {
    let items = truncate(normalize_items(data.primary(), section), section);
    let target_field = section.option_str("target_field").unwrap_or("target");
    let gaps: Vec<GapDatum> = items
        .into_iter()
        .filter_map(|item| {
            Some(GapDatum {
                label: item_label(item, section),
                current: item_score(item, section)?,
                target: as_number(item.get(target_field)),
            })
        })
        .collect();
    if gaps.is_empty() {
        return Ok(empty_state("No scores available"));
    }
    let mut cfg = WaterfallConfig::with_width(section.option_f64("width").unwrap_or(640.0));
    cfg.default_target = section
        .option_f64("target")
        .unwrap_or(options.thresholds.excellence);
    Ok(render_waterfall(&gaps, &cfg, &options.brand.primary_color))
}
