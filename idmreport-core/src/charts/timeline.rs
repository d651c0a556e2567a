//! Horizontal phase timeline
//!
//! Phases get equal-width blocks along a single track, bracketed by start and
//! end markers.

use super::{fmt, svg_open};
use crate::html::html_escape;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePhase {
    pub label: String,
    /// Secondary line under the label, e.g. a time horizon
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineConfig {
    pub width: f64,
    pub height: f64,
    /// Horizontal inset reserved for the start/end markers
    pub padding: f64,
    pub start_label: String,
    pub end_label: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig::with_width(720.0)
    }
}

impl TimelineConfig {
    pub fn with_width(width: f64) -> Self {
        let width = if width.is_finite() && width >= 200.0 { width } else { 720.0 };
        TimelineConfig {
            width,
            height: 120.0,
            padding: 28.0,
            start_label: "Start".to_string(),
            end_label: "Target".to_string(),
        }
    }

    pub fn track_y(&self) -> f64 {
        self.height * 0.4
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseBlock {
    pub index: usize,
    pub label: String,
    pub caption: Option<String>,
    pub x: f64,
    pub width: f64,
}

impl PhaseBlock {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Equal-width blocks spanning the track between the markers
pub fn timeline_blocks(phases: &[TimelinePhase], cfg: &TimelineConfig) -> Vec<PhaseBlock> {
    if phases.is_empty() {
        return Vec::new();
    }
    let track = (cfg.width - 2.0 * cfg.padding).max(0.0);
    let width = track / phases.len() as f64;
    phases
        .iter()
        .enumerate()
        .map(|(i, p)| PhaseBlock {
            index: i,
            label: p.label.clone(),
            caption: p.caption.clone(),
            x: cfg.padding + i as f64 * width,
            width,
        })
        .collect()
}

/// Render the timeline with a palette alternating between brand colors
pub fn render_timeline(
    phases: &[TimelinePhase],
    cfg: &TimelineConfig,
    primary_color: &str,
    accent_color: &str,
) -> String {
    let blocks = timeline_blocks(phases, cfg);
    let ty = cfg.track_y();
    let mut svg = svg_open(cfg.width, cfg.height, "timeline-chart", "Timeline");

    svg.push_str(&format!(
        r##"<line class="timeline-track" x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="#d1d5db" stroke-width="4" stroke-linecap="round"/>"##,
        x1 = fmt(cfg.padding),
        x2 = fmt(cfg.width - cfg.padding),
        y = fmt(ty),
    ));

    for b in &blocks {
        let fill = if b.index % 2 == 0 {
            primary_color
        } else {
            accent_color
        };
        svg.push_str(&format!(
            r##"<g class="timeline-phase"><rect x="{x}" y="{y}" width="{w}" height="18" rx="4" fill="{fill}" stroke="#ffffff" stroke-width="2"/><text x="{cx}" y="{ly}" text-anchor="middle" font-size="12" font-weight="600" fill="#111827">{label}</text>"##,
            x = fmt(b.x),
            y = fmt(ty - 9.0),
            w = fmt(b.width),
            fill = html_escape(fill),
            cx = fmt(b.center_x()),
            ly = fmt(ty + 30.0),
            label = html_escape(&b.label),
        ));
        if let Some(caption) = &b.caption {
            svg.push_str(&format!(
                r##"<text x="{cx}" y="{y}" text-anchor="middle" font-size="10" fill="#6b7280">{c}</text>"##,
                cx = fmt(b.center_x()),
                y = fmt(ty + 46.0),
                c = html_escape(caption),
            ));
        }
        svg.push_str("</g>");
    }

    for (x, label, class) in [
        (cfg.padding, &cfg.start_label, "timeline-start"),
        (cfg.width - cfg.padding, &cfg.end_label, "timeline-end"),
    ] {
        svg.push_str(&format!(
            r##"<circle class="{class}" cx="{x}" cy="{y}" r="8" fill="#ffffff" stroke="{stroke}" stroke-width="3"/><text x="{x}" y="{ly}" text-anchor="middle" font-size="10" fill="#6b7280">{label}</text>"##,
            class = class,
            x = fmt(x),
            y = fmt(ty),
            stroke = html_escape(primary_color),
            ly = fmt(ty - 16.0),
            label = html_escape(label),
        ));
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phases(n: usize) -> Vec<TimelinePhase> {
        (0..n)
            .map(|i| TimelinePhase {
                label: format!("Phase {}", i + 1),
                caption: None,
            })
            .collect()
    }

    #[test]
    fn test_blocks_are_equal_width_and_cover_track() {
        let cfg = TimelineConfig::default();
        let blocks = timeline_blocks(&phases(3), &cfg);
        assert_eq!(blocks.len(), 3);
        assert!((blocks[0].width - blocks[2].width).abs() < 1e-9);
        assert_eq!(blocks[0].x, cfg.padding);
        let end = blocks[2].x + blocks[2].width;
        assert!((end - (cfg.width - cfg.padding)).abs() < 1e-9);
    }

    #[test]
    fn test_markers_present() {
        let svg = render_timeline(&phases(2), &TimelineConfig::default(), "#111", "#222");
        assert!(svg.contains("timeline-start"));
        assert!(svg.contains("timeline-end"));
        assert_eq!(svg.matches("timeline-phase").count(), 2);
    }

    #[test]
    fn test_no_phases_still_draws_track() {
        let svg = render_timeline(&[], &TimelineConfig::default(), "#111", "#222");
        assert!(svg.contains("timeline-track"));
        assert!(!svg.contains("timeline-phase"));
    }
}
