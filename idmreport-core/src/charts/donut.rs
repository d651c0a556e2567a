//! Donut chart
//!
//! Segments are laid out by a cumulative angle walk starting at -90° (12
//! o'clock), clockwise. Each segment is a closed ring slice: outer arc, line
//! to the inner radius, inner arc back.

use super::{fmt, non_negative, svg_open, Point};
use crate::html::html_escape;

/// Palette cycled for segments without an explicit color
pub const PALETTE: [&str; 8] = [
    "#212653", "#969423", "#0d6efd", "#28a745", "#ffc107", "#dc3545", "#6f42c1", "#20c997",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DonutDatum {
    pub label: String,
    pub value: f64,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DonutConfig {
    pub size: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
}

impl Default for DonutConfig {
    fn default() -> Self {
        DonutConfig::with_size(220.0)
    }
}

impl DonutConfig {
    pub fn with_size(size: f64) -> Self {
        let size = if size.is_finite() && size >= 60.0 { size } else { 220.0 };
        DonutConfig {
            size,
            outer_radius: size * 0.45,
            inner_radius: size * 0.28,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.size / 2.0,
            y: self.size / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcSegment {
    pub label: String,
    pub value: f64,
    /// Share of the total, 0-100
    pub percent: f64,
    /// Degrees, starting at -90
    pub start_angle: f64,
    pub end_angle: f64,
    pub sweep: f64,
    pub color: String,
    pub path: String,
}

fn ring_slice(c: Point, ro: f64, ri: f64, start_deg: f64, end_deg: f64) -> String {
    let (a0, a1) = (start_deg.to_radians(), end_deg.to_radians());
    let large_arc = if end_deg - start_deg > 180.0 { 1 } else { 0 };
    let o0 = Point::polar(c, ro, a0);
    let o1 = Point::polar(c, ro, a1);
    let i1 = Point::polar(c, ri, a1);
    let i0 = Point::polar(c, ri, a0);
    format!(
        "M {} {} A {} {} 0 {} 1 {} {} L {} {} A {} {} 0 {} 0 {} {} Z",
        fmt(o0.x),
        fmt(o0.y),
        fmt(ro),
        fmt(ro),
        large_arc,
        fmt(o1.x),
        fmt(o1.y),
        fmt(i1.x),
        fmt(i1.y),
        fmt(ri),
        fmt(ri),
        large_arc,
        fmt(i0.x),
        fmt(i0.y),
    )
}

/// Compute donut segments; zero and invalid values produce no segment
pub fn donut_segments(data: &[DonutDatum], cfg: &DonutConfig) -> Vec<ArcSegment> {
    let total: f64 = data.iter().map(|d| non_negative(d.value)).sum();
    if total <= 0.0 || !total.is_finite() {
        return Vec::new();
    }
    let center = cfg.center();
    let (ro, ri) = (
        non_negative(cfg.outer_radius),
        non_negative(cfg.inner_radius),
    );

    let mut angle = -90.0;
    let mut segments = Vec::new();
    for (i, d) in data.iter().enumerate() {
        let value = non_negative(d.value);
        if value == 0.0 {
            continue;
        }
        let sweep = value / total * 360.0;
        let start = angle;
        let end = angle + sweep;
        // A lone full-circle arc has identical endpoints and would not draw;
        // split it into two halves.
        let path = if sweep >= 359.999 {
            format!(
                "{} {}",
                ring_slice(center, ro, ri, start, start + 180.0),
                ring_slice(center, ro, ri, start + 180.0, end)
            )
        } else {
            ring_slice(center, ro, ri, start, end)
        };
        segments.push(ArcSegment {
            label: d.label.clone(),
            value,
            percent: value / total * 100.0,
            start_angle: start,
            end_angle: end,
            sweep,
            color: d
                .color
                .clone()
                .unwrap_or_else(|| PALETTE[i % PALETTE.len()].to_string()),
            path,
        });
        angle = end;
    }
    segments
}

/// Render a donut with an optional center caption and a legend
pub fn render_donut(data: &[DonutDatum], cfg: &DonutConfig, center_label: Option<&str>) -> String {
    let segments = donut_segments(data, cfg);
    let legend_rows = segments.len().max(1) as f64;
    let height = cfg.size.max(legend_rows * 18.0 + 10.0);
    let width = cfg.size + 180.0;
    let c = cfg.center();
    let mut svg = svg_open(width, height, "donut-chart", "Donut chart");

    if segments.is_empty() {
        svg.push_str(&format!(
            r##"<circle class="donut-empty" cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="#e5e7eb" stroke-width="{w}"/>"##,
            cx = fmt(c.x),
            cy = fmt(c.y),
            r = fmt((cfg.outer_radius + cfg.inner_radius) / 2.0),
            w = fmt(non_negative(cfg.outer_radius - cfg.inner_radius)),
        ));
    }

    for s in &segments {
        svg.push_str(&format!(
            r##"<path class="donut-segment" d="{d}" fill="{fill}" stroke="#ffffff" stroke-width="1"><title>{label}: {pct}%</title></path>"##,
            d = s.path,
            fill = html_escape(&s.color),
            label = html_escape(&s.label),
            pct = fmt(s.percent),
        ));
    }

    if let Some(text) = center_label {
        svg.push_str(&format!(
            r##"<text class="donut-center" x="{x}" y="{y}" text-anchor="middle" dominant-baseline="middle" font-size="20" font-weight="700" fill="#111827">{t}</text>"##,
            x = fmt(c.x),
            y = fmt(c.y),
            t = html_escape(text),
        ));
    }

    for (i, s) in segments.iter().enumerate() {
        let y = 10.0 + i as f64 * 18.0;
        svg.push_str(&format!(
            r##"<rect x="{x}" y="{y}" width="10" height="10" fill="{fill}"/><text x="{tx}" y="{ty}" font-size="11" dominant-baseline="middle" fill="#374151">{label} ({pct}%)</text>"##,
            x = fmt(cfg.size + 10.0),
            y = fmt(y),
            fill = html_escape(&s.color),
            tx = fmt(cfg.size + 26.0),
            ty = fmt(y + 5.0),
            label = html_escape(&s.label),
            pct = crate::value::format_number(s.percent.round()),
        ));
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum(label: &str, value: f64) -> DonutDatum {
        DonutDatum {
            label: label.to_string(),
            value,
            color: None,
        }
    }

    #[test]
    fn test_segment_angles_sum_to_full_circle() {
        let cfg = DonutConfig::default();
        for values in [vec![1.0], vec![3.0, 1.0], vec![0.1, 7.3, 2.2, 19.0, 4.4]] {
            let data: Vec<DonutDatum> = values.iter().map(|v| datum("x", *v)).collect();
            let segs = donut_segments(&data, &cfg);
            let total: f64 = segs.iter().map(|s| s.sweep).sum();
            assert!((total - 360.0).abs() < 1e-9, "sum was {}", total);
            assert_eq!(segs[0].start_angle, -90.0);
            assert!((segs.last().unwrap().end_angle - 270.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_large_arc_flag() {
        let cfg = DonutConfig::default();
        let segs = donut_segments(&[datum("big", 3.0), datum("small", 1.0)], &cfg);
        assert_eq!(segs[0].sweep, 270.0);
        assert!(segs[0].path.contains(" 0 1 1 "));
        assert!(segs[1].path.contains(" 0 0 1 "));
    }

    #[test]
    fn test_segments_are_contiguous() {
        let segs = donut_segments(
            &[datum("a", 2.0), datum("b", 5.0), datum("c", 3.0)],
            &DonutConfig::default(),
        );
        for pair in segs.windows(2) {
            assert_eq!(pair[0].end_angle, pair[1].start_angle);
        }
    }

    #[test]
    fn test_invalid_and_zero_values_are_skipped() {
        let segs = donut_segments(
            &[datum("a", f64::NAN), datum("b", 0.0), datum("c", -2.0), datum("d", 4.0)],
            &DonutConfig::default(),
        );
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].label, "d");
        assert!((segs[0].percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_donut_renders_placeholder_ring() {
        let svg = render_donut(&[datum("a", 0.0)], &DonutConfig::default(), Some("0"));
        assert!(svg.contains("donut-empty"));
        assert!(!svg.contains("donut-segment"));
    }
}
