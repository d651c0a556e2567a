//! Radar (spider) chart
//!
//! Axis `i` of `n` sits at angle `i * 2π/n - π/2`, so the first axis points
//! straight up. A score `s` maps to radius `s / 100 * max_radius`.

use super::{clamp_score, fmt, svg_open, Point};
use crate::bands::{BandThresholds, ScoreBand};
use crate::html::html_escape;
use std::f64::consts::{FRAC_PI_2, PI};

#[derive(Debug, Clone, PartialEq)]
pub struct RadarAxis {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarConfig {
    /// Square canvas edge length
    pub size: f64,
    pub max_radius: f64,
    /// Concentric grid rings
    pub levels: usize,
    /// Distance of axis labels beyond `max_radius`
    pub label_offset: f64,
    pub industry_average: f64,
    pub top_quartile: f64,
    pub thresholds: BandThresholds,
}

impl Default for RadarConfig {
    fn default() -> Self {
        RadarConfig::with_size(400.0)
    }
}

impl RadarConfig {
    /// Derive radius and label offset from the canvas size
    pub fn with_size(size: f64) -> Self {
        let size = if size.is_finite() && size >= 100.0 { size } else { 400.0 };
        RadarConfig {
            size,
            max_radius: size * 0.34,
            levels: 5,
            label_offset: 18.0,
            industry_average: 60.0,
            top_quartile: 75.0,
            thresholds: BandThresholds::default(),
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
pub struct RadarVertex {
    pub point: Point,
    pub angle: f64,
    pub score: f64,
    pub band: ScoreBand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarLabel {
    pub point: Point,
    pub anchor: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarGeometry {
    pub center: Point,
    pub max_radius: f64,
    pub ring_radii: Vec<f64>,
    /// Outer end of each axis spoke
    pub spokes: Vec<Point>,
    pub vertices: Vec<RadarVertex>,
    pub labels: Vec<RadarLabel>,
    pub industry_radius: f64,
    pub top_quartile_radius: f64,
}

impl RadarGeometry {
    /// Closed score polygon `M p0 L p1 ... Z`; empty when there are no axes
    pub fn polygon_path(&self) -> String {
        if self.vertices.is_empty() {
            return String::new();
        }
        let mut d = String::new();
        for (i, v) in self.vertices.iter().enumerate() {
            let cmd = if i == 0 { "M" } else { " L" };
            d.push_str(&format!("{}{} {}", cmd, fmt(v.point.x), fmt(v.point.y)));
        }
        d.push_str(" Z");
        d
    }
}

pub fn axis_angle(i: usize, n: usize) -> f64 {
    if n == 0 {
        return -FRAC_PI_2;
    }
    i as f64 * (2.0 * PI / n as f64) - FRAC_PI_2
}

fn label_anchor(x: f64, cx: f64) -> &'static str {
    if (x - cx).abs() < 1.0 {
        "middle"
    } else if x > cx {
        "start"
    } else {
        "end"
    }
}

/// Compute radar geometry for `axes`
pub fn radar_geometry(axes: &[RadarAxis], cfg: &RadarConfig) -> RadarGeometry {
    let center = cfg.center();
    let max_radius = if cfg.max_radius.is_finite() && cfg.max_radius > 0.0 {
        cfg.max_radius
    } else {
        0.0
    };
    let n = axes.len();
    let levels = cfg.levels.max(1);
    let to_radius = |score: f64| clamp_score(score) / 100.0 * max_radius;

    let ring_radii = (1..=levels)
        .map(|l| max_radius * l as f64 / levels as f64)
        .collect();

    let mut spokes = Vec::with_capacity(n);
    let mut vertices = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for (i, axis) in axes.iter().enumerate() {
        let angle = axis_angle(i, n);
        let score = clamp_score(axis.score);
        spokes.push(Point::polar(center, max_radius, angle));
        vertices.push(RadarVertex {
            point: Point::polar(center, to_radius(score), angle),
            angle,
            score,
            band: cfg.thresholds.classify(score),
        });
        let point = Point::polar(center, max_radius + cfg.label_offset, angle);
        labels.push(RadarLabel {
            point,
            anchor: label_anchor(point.x, center.x),
            text: axis.label.clone(),
        });
    }

    RadarGeometry {
        center,
        max_radius,
        ring_radii,
        spokes,
        vertices,
        labels,
        industry_radius: to_radius(cfg.industry_average),
        top_quartile_radius: to_radius(cfg.top_quartile),
    }
}

/// Render a radar chart as an SVG fragment
pub fn render_radar(axes: &[RadarAxis], cfg: &RadarConfig, primary_color: &str) -> String {
    let g = radar_geometry(axes, cfg);
    let (cx, cy) = (fmt(g.center.x), fmt(g.center.y));
    let mut svg = svg_open(cfg.size, cfg.size + 28.0, "radar-chart", "Radar chart");

    for r in &g.ring_radii {
        svg.push_str(&format!(
            r##"<circle class="radar-ring" cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="#e5e7eb" stroke-width="1"/>"##,
            cx = cx,
            cy = cy,
            r = fmt(*r),
        ));
    }
    for p in &g.spokes {
        svg.push_str(&format!(
            r##"<line class="radar-spoke" x1="{cx}" y1="{cy}" x2="{x}" y2="{y}" stroke="#e5e7eb" stroke-width="1"/>"##,
            cx = cx,
            cy = cy,
            x = fmt(p.x),
            y = fmt(p.y),
        ));
    }

    svg.push_str(&format!(
        r##"<circle class="radar-ref radar-ref-industry" cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="#6b7280" stroke-width="1.5" stroke-dasharray="6 4"/>"##,
        cx = cx,
        cy = cy,
        r = fmt(g.industry_radius),
    ));
    svg.push_str(&format!(
        r##"<circle class="radar-ref radar-ref-top-quartile" cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="#28a745" stroke-width="1.5" stroke-dasharray="2 3"/>"##,
        cx = cx,
        cy = cy,
        r = fmt(g.top_quartile_radius),
    ));

    if !g.vertices.is_empty() {
        svg.push_str(&format!(
            r#"<path class="radar-score" d="{d}" fill="{c}" fill-opacity="0.18" stroke="{c}" stroke-width="2"/>"#,
            d = g.polygon_path(),
            c = html_escape(primary_color),
        ));
    }
    for v in &g.vertices {
        svg.push_str(&format!(
            r##"<circle class="radar-point {band}" cx="{x}" cy="{y}" r="4.5" fill="{fill}" stroke="#ffffff" stroke-width="1.5"><title>{score}</title></circle>"##,
            band = v.band.css_class(),
            x = fmt(v.point.x),
            y = fmt(v.point.y),
            fill = v.band.color(),
            score = crate::value::format_number(v.score.round()),
        ));
    }
    for l in &g.labels {
        svg.push_str(&format!(
            r##"<text class="radar-label" x="{x}" y="{y}" text-anchor="{a}" dominant-baseline="middle" font-size="11" fill="#374151">{t}</text>"##,
            x = fmt(l.point.x),
            y = fmt(l.point.y),
            a = l.anchor,
            t = html_escape(&l.text),
        ));
    }

    // Legend for the two reference circles
    let ly = fmt(cfg.size + 16.0);
    svg.push_str(&format!(
        r##"<g class="radar-legend" font-size="10" fill="#6b7280"><line x1="10" y1="{ly}" x2="30" y2="{ly}" stroke="#6b7280" stroke-dasharray="6 4"/><text x="34" y="{ly}" dominant-baseline="middle">Industry average ({ia})</text><line x1="{x2}" y1="{ly}" x2="{x3}" y2="{ly}" stroke="#28a745" stroke-dasharray="2 3"/><text x="{x4}" y="{ly}" dominant-baseline="middle">Top quartile ({tq})</text></g>"##,
        ly = ly,
        ia = crate::value::format_number(clamp_score(cfg.industry_average).round()),
        tq = crate::value::format_number(clamp_score(cfg.top_quartile).round()),
        x2 = fmt(cfg.size / 2.0),
        x3 = fmt(cfg.size / 2.0 + 20.0),
        x4 = fmt(cfg.size / 2.0 + 24.0),
    ));

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(label: &str, score: f64) -> RadarAxis {
        RadarAxis {
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn test_full_score_vertex_sits_on_max_radius() {
        let cfg = RadarConfig::default();
        let g = radar_geometry(&[axis("Strategy", 100.0)], &cfg);
        let d = g.vertices[0].point.distance(&g.center);
        assert!((d - cfg.max_radius).abs() < 1e-9);
        // First axis points straight up
        assert!((g.vertices[0].point.x - g.center.x).abs() < 1e-9);
        assert!(g.vertices[0].point.y < g.center.y);
    }

    #[test]
    fn test_radius_is_proportional_to_score() {
        let cfg = RadarConfig::default();
        let g = radar_geometry(&[axis("A", 50.0), axis("B", 25.0), axis("C", 0.0)], &cfg);
        let radii: Vec<f64> = g.vertices.iter().map(|v| v.point.distance(&g.center)).collect();
        assert!((radii[0] - cfg.max_radius * 0.5).abs() < 1e-9);
        assert!((radii[1] - cfg.max_radius * 0.25).abs() < 1e-9);
        assert!(radii[2].abs() < 1e-9);
    }

    #[test]
    fn test_invalid_scores_are_clamped() {
        let cfg = RadarConfig::default();
        let g = radar_geometry(&[axis("A", f64::NAN), axis("B", 250.0), axis("C", -4.0)], &cfg);
        assert_eq!(g.vertices[0].score, 0.0);
        assert_eq!(g.vertices[1].score, 100.0);
        assert_eq!(g.vertices[2].score, 0.0);
        assert!(!render_radar(&[axis("A", f64::NAN)], &cfg, "#000").contains("NaN"));
    }

    #[test]
    fn test_rings_and_reference_radii() {
        let cfg = RadarConfig::default();
        let g = radar_geometry(&[axis("A", 10.0)], &cfg);
        assert_eq!(g.ring_radii.len(), 5);
        assert!((g.ring_radii[4] - cfg.max_radius).abs() < 1e-9);
        assert!((g.industry_radius - cfg.max_radius * 0.60).abs() < 1e-9);
        assert!((g.top_quartile_radius - cfg.max_radius * 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_label_anchors_follow_horizontal_half() {
        let cfg = RadarConfig::default();
        let axes: Vec<RadarAxis> = (0..4).map(|i| axis(&format!("A{}", i), 50.0)).collect();
        let g = radar_geometry(&axes, &cfg);
        let anchors: Vec<&str> = g.labels.iter().map(|l| l.anchor).collect();
        assert_eq!(anchors, vec!["middle", "start", "middle", "end"]);
    }

    #[test]
    fn test_polygon_path_is_closed() {
        let cfg = RadarConfig::default();
        let g = radar_geometry(&[axis("A", 80.0), axis("B", 60.0), axis("C", 40.0)], &cfg);
        let d = g.polygon_path();
        assert!(d.starts_with('M'));
        assert_eq!(d.matches(" L").count(), 2);
        assert!(d.ends_with('Z'));
        assert_eq!(g.vertices[0].band, ScoreBand::Excellence);
        assert_eq!(g.vertices[2].band, ScoreBand::Attention);
    }

    #[test]
    fn test_svg_has_two_distinct_reference_circles() {
        let svg = render_radar(&[axis("Strategy", 100.0)], &RadarConfig::default(), "#212653");
        assert_eq!(svg.matches("class=\"radar-ref ").count(), 2);
        assert!(svg.contains("radar-ref-industry"));
        assert!(svg.contains("radar-ref-top-quartile"));
        assert!(svg.contains("class=\"radar-score\""));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_no_axes_renders_grid_only() {
        let svg = render_radar(&[], &RadarConfig::default(), "#212653");
        assert!(!svg.contains("radar-score"));
        assert!(svg.contains("radar-ring"));
    }
}
