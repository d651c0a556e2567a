//! Horizontal bar chart on a 0-100 scale

use super::{clamp_score, fmt, svg_open};
use crate::bands::{BandThresholds, ScoreBand};
use crate::html::html_escape;
use crate::value::format_number;

#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarConfig {
    /// Total canvas width
    pub width: f64,
    pub bar_height: f64,
    pub gap: f64,
    /// Space reserved on the left for category labels
    pub label_width: f64,
    /// Space reserved on the right for the value label
    pub value_width: f64,
    pub thresholds: BandThresholds,
}

impl Default for BarConfig {
    fn default() -> Self {
        BarConfig::with_width(520.0)
    }
}

impl BarConfig {
    pub fn with_width(width: f64) -> Self {
        let width = if width.is_finite() && width >= 100.0 { width } else { 520.0 };
        BarConfig {
            width,
            bar_height: 22.0,
            gap: 10.0,
            label_width: (width * 0.3).min(180.0),
            value_width: 44.0,
            thresholds: BandThresholds::default(),
        }
    }

    /// Horizontal space a 100-point bar occupies
    pub fn chart_width(&self) -> f64 {
        (self.width - self.label_width - self.value_width).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarRect {
    pub label: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub band: ScoreBand,
    /// Anchor for the value label placed after the bar
    pub value_x: f64,
}

/// Lay out one bar per datum, top to bottom
pub fn bar_geometry(data: &[BarDatum], cfg: &BarConfig) -> Vec<BarRect> {
    let chart_width = cfg.chart_width();
    data.iter()
        .enumerate()
        .map(|(i, d)| {
            let value = clamp_score(d.value);
            let width = value / 100.0 * chart_width;
            let x = cfg.label_width;
            BarRect {
                label: d.label.clone(),
                value,
                x,
                y: cfg.gap + i as f64 * (cfg.bar_height + cfg.gap),
                width,
                height: cfg.bar_height,
                band: cfg.thresholds.classify(value),
                value_x: x + width + 6.0,
            }
        })
        .collect()
}

/// Render a horizontal bar chart
pub fn render_bar_chart(data: &[BarDatum], cfg: &BarConfig) -> String {
    let bars = bar_geometry(data, cfg);
    let height = cfg.gap + bars.len() as f64 * (cfg.bar_height + cfg.gap);
    let mut svg = svg_open(cfg.width, height, "bar-chart", "Bar chart");

    // Track behind each bar shows the full 0-100 range
    for bar in &bars {
        let mid = bar.y + bar.height / 2.0;
        svg.push_str(&format!(
            r##"<text class="bar-label" x="{lx}" y="{my}" text-anchor="end" dominant-baseline="middle" font-size="12" fill="#374151">{label}</text><rect class="bar-track" x="{x}" y="{y}" width="{tw}" height="{h}" rx="3" fill="#f3f4f6"/><rect class="bar {band}" x="{x}" y="{y}" width="{w}" height="{h}" rx="3" fill="{fill}"/><text class="bar-value" x="{vx}" y="{my}" dominant-baseline="middle" font-size="12" font-weight="600" fill="#111827">{value}</text>"##,
            lx = fmt(bar.x - 8.0),
            my = fmt(mid),
            label = html_escape(&bar.label),
            x = fmt(bar.x),
            y = fmt(bar.y),
            tw = fmt(cfg.chart_width()),
            h = fmt(bar.height),
            band = bar.band.css_class(),
            w = fmt(bar.width),
            fill = bar.band.color(),
            vx = fmt(bar.value_x),
            value = format_number(bar.value.round()),
        ));
    }

    svg.push_str("</svg>");
    svg
}
