//! Visual renderer registry
//!
//! Maps a section's `visual_type` tag to a renderer. Every renderer shares one
//! signature and receives the section's whole [`ResolvedData`], so adding a
//! visual is a matter of registering one more function.
//!
//! Global invariants enforced:
//! - Unknown tags never fail; they render a visible placeholder
//! - Renderers never see absent data as an error; they draw an empty state
//! - Every interpolated string is HTML-escaped

pub mod charts;
pub mod lists;
pub mod narrative;
pub mod normalize;
pub mod plan;
pub mod scores;
pub mod table;

use crate::bands::BandThresholds;
use crate::datasource::ResolvedData;
use crate::html::html_escape;
use crate::recipe::{Brand, Section};
use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Renderer signature shared by every visual
pub type RenderFn = fn(&ResolvedData, &Section, &RenderOptions) -> Result<String>;

/// Built-in visual types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualType {
    ScoreTile,
    ScoreTiles,
    RadarChart,
    BarChart,
    ProgressBar,
    Table,
    Checklist,
    Timeline,
    RiskMatrix,
    RoadmapTimeline,
    KpiDashboard,
    TextBlock,
    NarrativeBlock,
    BulletList,
    NumberedList,
    CalloutBox,
    MetricCard,
    ComparisonTable,
    /// Renders nothing; the section shows only its heading
    NoOp,
    DonutChart,
    GapChart,
}

impl VisualType {
    pub const ALL: [VisualType; 21] = [
        VisualType::ScoreTile,
        VisualType::ScoreTiles,
        VisualType::RadarChart,
        VisualType::BarChart,
        VisualType::ProgressBar,
        VisualType::Table,
        VisualType::Checklist,
        VisualType::Timeline,
        VisualType::RiskMatrix,
        VisualType::RoadmapTimeline,
        VisualType::KpiDashboard,
        VisualType::TextBlock,
        VisualType::NarrativeBlock,
        VisualType::BulletList,
        VisualType::NumberedList,
        VisualType::CalloutBox,
        VisualType::MetricCard,
        VisualType::ComparisonTable,
        VisualType::NoOp,
        VisualType::DonutChart,
        VisualType::GapChart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualType::ScoreTile => "score_tile",
            VisualType::ScoreTiles => "score_tiles",
            VisualType::RadarChart => "radar_chart",
            VisualType::BarChart => "bar_chart",
            VisualType::ProgressBar => "progress_bar",
            VisualType::Table => "table",
            VisualType::Checklist => "checklist",
            VisualType::Timeline => "timeline",
            VisualType::RiskMatrix => "risk_matrix",
            VisualType::RoadmapTimeline => "roadmap_timeline",
            VisualType::KpiDashboard => "kpi_dashboard",
            VisualType::TextBlock => "text_block",
            VisualType::NarrativeBlock => "narrative_block",
            VisualType::BulletList => "bullet_list",
            VisualType::NumberedList => "numbered_list",
            VisualType::CalloutBox => "callout_box",
            VisualType::MetricCard => "metric_card",
            VisualType::ComparisonTable => "comparison_table",
            VisualType::NoOp => "none",
            VisualType::DonutChart => "donut_chart",
            VisualType::GapChart => "gap_chart",
        }
    }

    /// Built-in renderer for this tag
    pub fn renderer(&self) -> RenderFn {
        match self {
            VisualType::ScoreTile => scores::render_score_tile,
            VisualType::ScoreTiles => scores::render_score_tiles,
            VisualType::RadarChart => charts::render_radar_chart,
            VisualType::BarChart => charts::render_bar_chart,
            VisualType::ProgressBar => scores::render_progress_bar,
            VisualType::Table => table::render_table,
            VisualType::Checklist => lists::render_checklist,
            VisualType::Timeline => plan::render_timeline,
            VisualType::RiskMatrix => plan::render_risk_matrix,
            VisualType::RoadmapTimeline => plan::render_roadmap_timeline,
            VisualType::KpiDashboard => scores::render_kpi_dashboard,
            VisualType::TextBlock => narrative::render_text_block,
            VisualType::NarrativeBlock => narrative::render_narrative_block,
            VisualType::BulletList => lists::render_bullet_list,
            VisualType::NumberedList => lists::render_numbered_list,
            VisualType::CalloutBox => narrative::render_callout_box,
            VisualType::MetricCard => scores::render_metric_card,
            VisualType::ComparisonTable => table::render_comparison_table,
            VisualType::NoOp => render_nothing,
            VisualType::DonutChart => charts::render_donut_chart,
            VisualType::GapChart => charts::render_gap_chart,
        }
    }
}

impl fmt::Display for VisualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        VisualType::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown visual type: {}", s))
    }
}

/// Render-time settings shared by every section of a report
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub brand: Brand,
    pub thresholds: BandThresholds,
    pub radar_size: f64,
    pub bar_width: f64,
    pub industry_average: f64,
    pub top_quartile: f64,
    /// Column cap for inferred tables
    pub max_columns: usize,
    pub footer_text: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            brand: Brand::default(),
            thresholds: BandThresholds::default(),
            radar_size: 400.0,
            bar_width: 520.0,
            industry_average: 60.0,
            top_quartile: 75.0,
            max_columns: 6,
            footer_text: "Generated by IDM Report".to_string(),
        }
    }
}

/// Tag-to-renderer mapping
#[derive(Debug, Clone)]
pub struct RendererRegistry {
    renderers: HashMap<String, RenderFn>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        RendererRegistry::with_builtins()
    }
}

impl RendererRegistry {
    /// Registry with no renderers at all
    pub fn empty() -> Self {
        RendererRegistry {
            renderers: HashMap::new(),
        }
    }

    /// Registry with every [`VisualType`] registered
    pub fn with_builtins() -> Self {
        let mut registry = RendererRegistry::empty();
        for visual in VisualType::ALL {
            registry.register(visual.as_str(), visual.renderer());
        }
        registry
    }

    /// Add or replace the renderer for `tag`
    pub fn register(&mut self, tag: impl Into<String>, renderer: RenderFn) {
        self.renderers.insert(tag.into(), renderer);
    }

    pub fn get(&self, tag: &str) -> Option<RenderFn> {
        self.renderers.get(tag).copied()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.renderers.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Render `section` with the renderer registered for its visual type
    pub fn render(
        &self,
        data: &ResolvedData,
        section: &Section,
        options: &RenderOptions,
    ) -> Result<String> {
        match self.get(&section.visual_type) {
            Some(renderer) => renderer(data, section, options),
            None => Ok(unsupported(&section.visual_type)),
        }
    }
}

/// Placeholder for tags with no registered renderer
pub fn unsupported(tag: &str) -> String {
    format!(
        r#"<div class="placeholder unsupported">[Unsupported visual type: {}]</div>"#,
        html_escape(tag)
    )
}

/// Empty-state message shown when a section has nothing to draw
pub(crate) fn empty_state(message: &str) -> String {
    format!(r#"<p class="empty-state">{}</p>"#, html_escape(message))
}

fn render_nothing(_: &ResolvedData, _: &Section, _: &RenderOptions) -> Result<String> {
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(visual_type: &str) -> Section {
        Section {
            id: "s".to_string(),
            title: "S".to_string(),
            visual_type: visual_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_builtin_round_trips_its_tag() {
        for visual in VisualType::ALL {
            assert_eq!(visual.as_str().parse::<VisualType>().unwrap(), visual);
        }
        assert!("sparkline".parse::<VisualType>().is_err());
    }

    #[test]
    fn test_builtins_registered() {
        let registry = RendererRegistry::with_builtins();
        assert_eq!(registry.tags().len(), VisualType::ALL.len());
        assert!(registry.contains("radar_chart"));
        assert!(registry.contains("none"));
    }

    #[test]
    fn test_unknown_tag_renders_placeholder() {
        let registry = RendererRegistry::default();
        let out = registry
            .render(
                &ResolvedData::default(),
                &section("sparkline<x>"),
                &RenderOptions::default(),
            )
            .unwrap();
        assert!(out.contains("Unsupported visual type: sparkline&lt;x&gt;"));
    }

    #[test]
    fn test_register_custom_renderer() {
        fn shout(data: &ResolvedData, _: &Section, _: &RenderOptions) -> Result<String> {
            Ok(format!("<b>{}</b>", data.len()))
        }
        let mut registry = RendererRegistry::empty();
        registry.register("shout", shout);
        let out = registry
            .render(
                &ResolvedData::single(json!(1)),
                &section("shout"),
                &RenderOptions::default(),
            )
            .unwrap();
        assert_eq!(out, "<b>1</b>");
        // Built-ins are not present in an empty registry
        let out = registry
            .render(&ResolvedData::default(), &section("table"), &RenderOptions::default())
            .unwrap();
        assert!(out.contains("Unsupported visual type"));
    }

    #[test]
    fn test_none_renders_nothing() {
        let out = RendererRegistry::default()
            .render(
                &ResolvedData::single(json!({"a": 1})),
                &section("none"),
                &RenderOptions::default(),
            )
            .unwrap();
        assert!(out.is_empty());
    }
}
