//! Report recipes
//!
//! A recipe declares which sections a report variant contains, which visual
//! renders each section and how each section binds to IDM data. Recipes are
//! static configuration: loaded once, never mutated during a render.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// Complete report recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub report_id: String,
    pub name: String,
    #[serde(default)]
    pub brand_config: BrandOverrides,
    pub sections: Vec<Section>,
}

/// One report section; renders to exactly one block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Renderer tag; unknown tags render a placeholder instead of failing
    pub visual_type: String,
    #[serde(default, deserialize_with = "lenient_data_sources")]
    pub data_sources: Vec<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hints: Option<LayoutHints>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tone_tags: Vec<String>,
    /// Renderer-specific knobs (`label_field`, `value_field`, `max_items`, ...)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
    /// Why this entry could not be loaded; such a section renders a placeholder
    #[serde(skip)]
    pub load_error: Option<String>,
}

impl Section {
    /// Deserialize one recipe entry, salvaging `id`, `title` and
    /// `visual_type` from an entry that does not fit the section shape
    pub fn from_value_lenient(index: usize, raw: Value) -> Section {
        let text = |field: &str| raw.get(field).and_then(Value::as_str).map(str::to_string);
        let id = text("id").unwrap_or_else(|| format!("section-{}", index + 1));
        let title = text("title").unwrap_or_default();
        let visual_type = text("visual_type").unwrap_or_default();
        let description = text("description");
        match serde_json::from_value::<Section>(raw) {
            Ok(section) => section,
            Err(err) => {
                warn!(section = %id, error = %err, "recipe section has an invalid shape");
                Section {
                    id,
                    title,
                    description,
                    visual_type,
                    load_error: Some(err.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    pub fn option_f64(&self, key: &str) -> Option<f64> {
        self.options
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn option_usize(&self, key: &str) -> Option<usize> {
        self.options
            .get(key)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
    }

    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(Value::as_bool)
    }
}

/// Named declarative query against the IDM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Why this entry could not be loaded; such a source resolves to nothing
    #[serde(skip)]
    pub load_error: Option<String>,
}

impl DataSource {
    /// Deserialize one data-source entry, keeping its `id` when the rest of
    /// the entry does not fit
    pub fn from_value_lenient(index: usize, raw: Value) -> DataSource {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("source-{}", index + 1));
        match serde_json::from_value::<DataSource>(raw) {
            Ok(source) => source,
            Err(err) => {
                warn!(source = %id, error = %err, "recipe data source has an invalid shape");
                DataSource {
                    id,
                    load_error: Some(err.to_string()),
                    ..Default::default()
                }
            }
        }
    }
}

fn lenient_data_sources<'de, D>(deserializer: D) -> std::result::Result<Vec<DataSource>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let entries = match raw {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| DataSource::from_value_lenient(i, entry))
        .collect())
}

/// Filter entry. Every recognized key that is set must hold; an entry with
/// no recognized keys never excludes anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_codes: Option<Vec<String>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Comparison operator of the generic `{field, operator, value}` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn factor(self) -> f64 {
        match self {
            SortDirection::Asc => 1.0,
            SortDirection::Desc => -1.0,
        }
    }
}

/// Presentation hints mapped onto container CSS classes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutHints {
    #[serde(default)]
    pub page_break_before: bool,
    #[serde(default)]
    pub page_break_after: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u8>,
    #[serde(default)]
    pub full_width: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<String>,
}

impl LayoutHints {
    /// CSS classes for the section container, in a fixed order
    pub fn css_classes(&self) -> Vec<String> {
        let mut classes = Vec::new();
        if self.page_break_before {
            classes.push("page-break-before".to_string());
        }
        if self.page_break_after {
            classes.push("page-break-after".to_string());
        }
        if let Some(cols) = self.columns.filter(|c| (2..=4).contains(c)) {
            classes.push(format!("cols-{}", cols));
        }
        if self.full_width {
            classes.push("full-width".to_string());
        }
        if let Some(emphasis) = &self.emphasis {
            let slug: String = emphasis
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_ascii_lowercase();
            if !slug.is_empty() {
                classes.push(format!("emphasis-{}", slug));
            }
        }
        classes
    }
}

/// Brand values as written in a recipe; any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_text: Option<String>,
}

/// Fully-populated brand used by the document shell
#[derive(Debug, Clone, PartialEq)]
pub struct Brand {
    pub primary_color: String,
    pub accent_color: String,
    pub font_heading: String,
    pub font_body: String,
    pub logo_text: Option<String>,
}

impl Default for Brand {
    fn default() -> Self {
        Brand {
            primary_color: "#212653".to_string(),
            accent_color: "#969423".to_string(),
            font_heading: "'Montserrat', sans-serif".to_string(),
            font_body: "'Open Sans', sans-serif".to_string(),
            logo_text: None,
        }
    }
}

impl Brand {
    /// Layer overrides on top of this brand
    pub fn merged(&self, overrides: &BrandOverrides) -> Brand {
        Brand {
            primary_color: overrides
                .primary_color
                .clone()
                .unwrap_or_else(|| self.primary_color.clone()),
            accent_color: overrides
                .accent_color
                .clone()
                .unwrap_or_else(|| self.accent_color.clone()),
            font_heading: overrides
                .font_heading
                .clone()
                .unwrap_or_else(|| self.font_heading.clone()),
            font_body: overrides
                .font_body
                .clone()
                .unwrap_or_else(|| self.font_body.clone()),
            logo_text: overrides.logo_text.clone().or_else(|| self.logo_text.clone()),
        }
    }
}

/// Minimal top-level validation of a raw recipe document
///
/// Checks only what the engine cannot degrade around: `report_id`, `name`
/// and a `sections` array must be present.
pub fn validate_recipe_value(raw: &Value) -> Result<()> {
    let obj = raw
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("recipe must be a JSON object"))?;
    for field in ["report_id", "name"] {
        match obj.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(_) => anyhow::bail!("recipe field '{}' must be a non-empty string", field),
            None => anyhow::bail!("recipe is missing required field '{}'", field),
        }
    }
    match obj.get("sections") {
        Some(Value::Array(_)) => Ok(()),
        Some(_) => anyhow::bail!("recipe field 'sections' must be an array"),
        None => anyhow::bail!("recipe is missing required field 'sections'"),
    }
}

/// Parse and validate a recipe from JSON text
///
/// Sections are loaded one by one: an entry that does not fit the section
/// shape becomes a section carrying its load error instead of rejecting the
/// whole recipe.
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    let mut raw: Value = serde_json::from_str(content).context("recipe is not valid JSON")?;
    validate_recipe_value(&raw)?;
    let entries = match raw.get_mut("sections").map(Value::take) {
        Some(Value::Array(entries)) => entries,
        _ => Vec::new(),
    };
    raw["sections"] = Value::Array(Vec::new());
    let mut recipe: Recipe = serde_json::from_value(raw).context("recipe has an invalid shape")?;
    recipe.sections = entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| Section::from_value_lenient(i, entry))
        .collect();
    Ok(recipe)
}

/// Load a recipe from a file
pub fn load_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read recipe file: {}", path.display()))?;
    parse_recipe(&content).with_context(|| format!("invalid recipe in: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_recipe() {
        let recipe = parse_recipe(r#"{"report_id": "exec", "name": "Executive", "sections": []}"#)
            .unwrap();
        assert_eq!(recipe.report_id, "exec");
        assert!(recipe.sections.is_empty());
        assert_eq!(recipe.brand_config, BrandOverrides::default());
    }

    #[test]
    fn test_reject_missing_required_fields() {
        assert!(parse_recipe(r#"{"name": "x", "sections": []}"#).is_err());
        assert!(parse_recipe(r#"{"report_id": "x", "sections": []}"#).is_err());
        assert!(parse_recipe(r#"{"report_id": "x", "name": "y"}"#).is_err());
        assert!(parse_recipe(r#"{"report_id": "", "name": "y", "sections": []}"#).is_err());
        assert!(parse_recipe(r#"{"report_id": "x", "name": "y", "sections": {}}"#).is_err());
        assert!(parse_recipe("[]").is_err());
    }

    #[test]
    fn test_parse_full_section() {
        let recipe = parse_recipe(
            r##"{
            "report_id": "owner",
            "name": "Owner Report",
            "brand_config": {"primary_color": "#000000"},
            "sections": [{
                "id": "dims",
                "title": "Dimensions",
                "visual_type": "bar_chart",
                "data_sources": [{
                    "id": "dimensions",
                    "from": "dimensions",
                    "filters": [{"chapter_codes": ["GE"]}, {"field": "score_overall", "operator": "gte", "value": 60}],
                    "sort": {"field": "score_overall"},
                    "limit": 5
                }],
                "layout_hints": {"page_break_before": true, "columns": 2},
                "tone_tags": ["direct"],
                "options": {"max_items": 8}
            }]
        }"##,
        )
        .unwrap();
        let section = &recipe.sections[0];
        assert_eq!(section.option_usize("max_items"), Some(8));
        let source = &section.data_sources[0];
        assert_eq!(source.filters.len(), 2);
        assert_eq!(source.filters[1].operator, Some(Operator::Gte));
        assert_eq!(source.sort.as_ref().unwrap().direction, SortDirection::Desc);
        assert_eq!(source.limit, Some(5));
    }

    #[test]
    fn test_malformed_section_is_kept_with_load_error() {
        let recipe = parse_recipe(
            r#"{"report_id": "r", "name": "R", "sections": [
                {"id": "good", "title": "Good", "visual_type": "table"},
                {"id": "untitled", "visual_type": "table"},
                {"title": "No id", "visual_type": 7},
                {"id": "after", "title": "After", "visual_type": "bullet_list"}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<&str> = recipe.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "untitled", "section-3", "after"]);
        assert!(recipe.sections[0].load_error.is_none());
        assert!(recipe.sections[1].load_error.as_deref().unwrap().contains("title"));
        assert_eq!(recipe.sections[2].title, "No id");
        assert!(recipe.sections[2].visual_type.is_empty());
        assert!(recipe.sections[2].load_error.is_some());
        assert!(recipe.sections[3].load_error.is_none());
    }

    #[test]
    fn test_malformed_data_source_does_not_fail_section() {
        let section = Section::from_value_lenient(
            0,
            json!({"id": "s", "title": "S", "visual_type": "table", "data_sources": [
                {"id": "bad_limit", "from": "dimensions", "limit": "5"},
                {"id": "bad_codes", "from": "dimensions", "filters": [{"dimension_codes": "STR"}]},
                {"id": "bad_sort", "from": "dimensions", "sort": {"field": "x", "direction": "ascending"}},
                {"id": "ok", "from": "dimensions", "limit": 2}
            ]}),
        );
        assert!(section.load_error.is_none());
        let errors: Vec<bool> = section
            .data_sources
            .iter()
            .map(|d| d.load_error.is_some())
            .collect();
        assert_eq!(errors, vec![true, true, true, false]);
        assert_eq!(section.data_sources[0].id, "bad_limit");
        assert_eq!(section.data_sources[3].limit, Some(2));
    }

    #[test]
    fn test_unknown_operator_deserializes() {
        let filter: Filter =
            serde_json::from_value(json!({"field": "x", "operator": "regex", "value": "a"}))
                .unwrap();
        assert_eq!(filter.operator, Some(Operator::Unknown));
    }

    #[test]
    fn test_layout_hint_classes() {
        let hints = LayoutHints {
            page_break_before: true,
            page_break_after: true,
            columns: Some(3),
            full_width: false,
            emphasis: Some("High!".into()),
        };
        assert_eq!(
            hints.css_classes(),
            vec!["page-break-before", "page-break-after", "cols-3", "emphasis-high"]
        );
        let single_column = LayoutHints {
            columns: Some(1),
            ..Default::default()
        };
        assert!(single_column.css_classes().is_empty());
    }

    #[test]
    fn test_brand_merge_keeps_defaults() {
        let brand = Brand::default().merged(&BrandOverrides {
            accent_color: Some("#ff0000".into()),
            ..Default::default()
        });
        assert_eq!(brand.accent_color, "#ff0000");
        assert_eq!(brand.primary_color, "#212653");
    }

    #[test]
    fn test_load_recipe_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = load_recipe_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
