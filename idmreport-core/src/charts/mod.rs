//! SVG chart geometry
//!
//! Every generator is a pure function from numeric series to SVG markup.
//! Geometry is computed separately from serialization (`*_geometry` /
//! `*_segments` / `*_blocks`) so it can be inspected without parsing SVG.
//!
//! Global invariants enforced:
//! - NaN, infinite and negative inputs are treated as 0 before any geometry
//! - Scores are clamped to 100
//! - No shared state; generators are safe to call from any thread

pub mod bar;
pub mod donut;
pub mod radar;
pub mod timeline;
pub mod waterfall;

pub use bar::{bar_geometry, render_bar_chart, BarConfig, BarDatum, BarRect};
pub use donut::{donut_segments, render_donut, ArcSegment, DonutConfig, DonutDatum};
pub use radar::{radar_geometry, render_radar, RadarAxis, RadarConfig, RadarGeometry};
pub use timeline::{render_timeline, timeline_blocks, PhaseBlock, TimelineConfig, TimelinePhase};
pub use waterfall::{render_waterfall, waterfall_geometry, GapDatum, WaterfallConfig};

use crate::value::sanitize;

/// Cartesian point in SVG user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Point at `radius` from `center` along `angle` (radians, SVG y-down)
    pub fn polar(center: Point, radius: f64, angle: f64) -> Point {
        Point {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Clamp a score into `[0, 100]`, mapping invalid values to 0
pub fn clamp_score(v: f64) -> f64 {
    sanitize(v, 100.0)
}

/// Non-negative finite value, invalid values become 0
pub fn non_negative(v: f64) -> f64 {
    sanitize(v, f64::MAX)
}

/// Fixed two-decimal coordinate formatting; `-0.00` prints as `0.00`
pub(crate) fn fmt(v: f64) -> String {
    let v = if v.is_finite() { v } else { 0.0 };
    let s = format!("{:.2}", v);
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

pub(crate) fn svg_open(width: f64, height: f64, class: &str, title: &str) -> String {
    format!(
        r#"<svg class="chart {class}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img" aria-label="{title}">"#,
        class = class,
        w = fmt(width),
        h = fmt(height),
        title = crate::html::html_escape(title),
    )
}
