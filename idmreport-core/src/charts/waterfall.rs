//! Gap-to-target waterfall
//!
//! The first column is the current overall score ("now"). Each following
//! column floats one dimension's share of the remaining gap, stacked upward,
//! so the last step ends exactly on the dashed target line. Shares are
//! proportional to each dimension's own shortfall against its target.

use super::{clamp_score, fmt, svg_open};
use crate::html::html_escape;
use crate::value::format_number;

#[derive(Debug, Clone, PartialEq)]
pub struct GapDatum {
    pub label: String,
    pub current: f64,
    /// Falls back to [`WaterfallConfig::default_target`]
    pub target: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterfallConfig {
    pub width: f64,
    pub height: f64,
    pub default_target: f64,
    /// Space below the plot for column labels
    pub label_band: f64,
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        WaterfallConfig::with_width(640.0)
    }
}

impl WaterfallConfig {
    pub fn with_width(width: f64) -> Self {
        let width = if width.is_finite() && width >= 200.0 { width } else { 640.0 };
        WaterfallConfig {
            width,
            height: 260.0,
            default_target: 80.0,
            label_band: 36.0,
        }
    }

    fn plot_height(&self) -> f64 {
        (self.height - self.label_band - 12.0).max(0.0)
    }

    /// Y coordinate of a score on the 0-100 axis
    pub fn y_of(&self, score: f64) -> f64 {
        12.0 + self.plot_height() * (1.0 - clamp_score(score) / 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallStep {
    pub label: String,
    pub shortfall: f64,
    /// Portion of the overall gap attributed to this dimension
    pub contribution: f64,
    /// Stack range on the score axis
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallGeometry {
    pub now: f64,
    pub target: f64,
    pub gap: f64,
    pub steps: Vec<WaterfallStep>,
}

/// Compute the stacked gap contributions
pub fn waterfall_geometry(data: &[GapDatum], cfg: &WaterfallConfig) -> WaterfallGeometry {
    if data.is_empty() {
        return WaterfallGeometry {
            now: 0.0,
            target: clamp_score(cfg.default_target),
            gap: 0.0,
            steps: Vec::new(),
        };
    }
    let n = data.len() as f64;
    let currents: Vec<f64> = data.iter().map(|d| clamp_score(d.current)).collect();
    let targets: Vec<f64> = data
        .iter()
        .map(|d| clamp_score(d.target.unwrap_or(cfg.default_target)))
        .collect();
    let now = currents.iter().sum::<f64>() / n;
    let target = targets.iter().sum::<f64>() / n;
    let gap = (target - now).max(0.0);

    let shortfalls: Vec<f64> = currents
        .iter()
        .zip(&targets)
        .map(|(c, t)| (t - c).max(0.0))
        .collect();
    let total_shortfall: f64 = shortfalls.iter().sum();

    let mut level = now;
    let steps = data
        .iter()
        .zip(&shortfalls)
        .map(|(d, shortfall)| {
            let contribution = if total_shortfall > 0.0 {
                gap * shortfall / total_shortfall
            } else {
                0.0
            };
            let from = level;
            level += contribution;
            WaterfallStep {
                label: d.label.clone(),
                shortfall: *shortfall,
                contribution,
                from,
                to: level,
            }
        })
        .collect();

    WaterfallGeometry {
        now,
        target,
        gap,
        steps,
    }
}

/// Render the waterfall as SVG
pub fn render_waterfall(data: &[GapDatum], cfg: &WaterfallConfig, primary_color: &str) -> String {
    let g = waterfall_geometry(data, cfg);
    let columns = g.steps.len() as f64 + 1.0;
    let col_width = cfg.width / columns;
    let bar_width = col_width * 0.6;
    let base_y = cfg.y_of(0.0);
    let label_y = base_y + 16.0;
    let mut svg = svg_open(cfg.width, cfg.height, "gap-chart", "Gap to target");

    let now_x = (col_width - bar_width) / 2.0;
    svg.push_str(&format!(
        r##"<rect class="gap-now" x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}"/><text x="{cx}" y="{vy}" text-anchor="middle" font-size="11" font-weight="600" fill="#111827">{v}</text><text x="{cx}" y="{ly}" text-anchor="middle" font-size="11" fill="#374151">Now</text>"##,
        x = fmt(now_x),
        y = fmt(cfg.y_of(g.now)),
        w = fmt(bar_width),
        h = fmt(base_y - cfg.y_of(g.now)),
        fill = html_escape(primary_color),
        cx = fmt(col_width / 2.0),
        vy = fmt(cfg.y_of(g.now) - 4.0),
        v = format_number(g.now.round()),
        ly = fmt(label_y),
    ));

    for (i, step) in g.steps.iter().enumerate() {
        let cx = col_width * (i as f64 + 1.5);
        let top = cfg.y_of(step.to);
        let bottom = cfg.y_of(step.from);
        svg.push_str(&format!(
            r##"<rect class="gap-step" x="{x}" y="{y}" width="{w}" height="{h}" fill="#ffc107" fill-opacity="0.85"><title>{label}: +{c}</title></rect><text x="{cx}" y="{ly}" text-anchor="middle" font-size="10" fill="#374151">{label}</text>"##,
            x = fmt(cx - bar_width / 2.0),
            y = fmt(top),
            w = fmt(bar_width),
            h = fmt(bottom - top),
            label = html_escape(&step.label),
            c = fmt(step.contribution),
            cx = fmt(cx),
            ly = fmt(label_y),
        ));
    }

    let target_y = fmt(cfg.y_of(g.target));
    svg.push_str(&format!(
        r##"<line class="gap-target" x1="0" y1="{y}" x2="{x2}" y2="{y}" stroke="#28a745" stroke-width="2" stroke-dasharray="6 4"/><text x="{x2}" y="{ty}" text-anchor="end" font-size="10" fill="#28a745">Target {t}</text>"##,
        y = target_y,
        x2 = fmt(cfg.width),
        ty = fmt(cfg.y_of(g.target) - 4.0),
        t = format_number(g.target.round()),
    ));
    svg.push_str(&format!(
        r##"<line class="gap-axis" x1="0" y1="{y}" x2="{x2}" y2="{y}" stroke="#d1d5db" stroke-width="1"/>"##,
        y = fmt(base_y),
        x2 = fmt(cfg.width),
    ));

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum(label: &str, current: f64, target: Option<f64>) -> GapDatum {
        GapDatum {
            label: label.to_string(),
            current,
            target,
        }
    }

    #[test]
    fn test_steps_stack_from_now_to_target() {
        let cfg = WaterfallConfig::default();
        let data = [
            datum("STR", 60.0, None),
            datum("SAL", 40.0, None),
            datum("OPS", 80.0, None),
        ];
        let g = waterfall_geometry(&data, &cfg);
        assert!((g.now - 60.0).abs() < 1e-9);
        assert!((g.target - 80.0).abs() < 1e-9);
        assert!((g.gap - 20.0).abs() < 1e-9);
        // shortfalls 20 / 40 / 0 -> contributions in the same ratio
        assert!((g.steps[0].contribution - 20.0 / 3.0).abs() < 1e-9);
        assert!((g.steps[1].contribution - 40.0 / 3.0).abs() < 1e-9);
        assert_eq!(g.steps[2].contribution, 0.0);
        let last = g.steps.last().unwrap();
        assert!((last.to - g.target).abs() < 1e-9);
        for pair in g.steps.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
    }

    #[test]
    fn test_above_target_has_no_gap() {
        let g = waterfall_geometry(
            &[datum("A", 95.0, Some(80.0)), datum("B", 90.0, Some(80.0))],
            &WaterfallConfig::default(),
        );
        assert_eq!(g.gap, 0.0);
        assert!(g.steps.iter().all(|s| s.contribution == 0.0));
    }

    #[test]
    fn test_invalid_input_renders_clean_svg() {
        let svg = render_waterfall(
            &[datum("A", f64::NAN, Some(f64::INFINITY))],
            &WaterfallConfig::default(),
            "#212653",
        );
        assert!(!svg.contains("NaN"));
        assert!(svg.contains("gap-target"));
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_empty_input() {
        let g = waterfall_geometry(&[], &WaterfallConfig::default());
        assert!(g.steps.is_empty());
        assert_eq!(g.gap, 0.0);
    }
}
