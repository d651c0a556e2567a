//! Configuration file support for IDM Report
//!
//! Loads render settings from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.idmreportrc.json` in the working directory
//! 3. `idmreport.config.json` in the working directory
//!
//! All fields are optional. A recipe's own `brand_config` takes precedence
//! over the configured brand.

use crate::bands::BandThresholds;
use crate::recipe::{Brand, BrandOverrides};
use crate::visuals::RenderOptions;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default include pattern for recipe discovery
const DEFAULT_INCLUDE: &str = "**/*.json";

const DEFAULT_FOOTER: &str = "Generated by IDM Report";

/// IDM Report configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdmReportConfig {
    /// Score band thresholds
    #[serde(default)]
    pub bands: Option<BandConfig>,

    /// Radar reference circles
    #[serde(default)]
    pub benchmarks: Option<BenchmarkConfig>,

    /// Fallback brand merged under each recipe's `brand_config`
    #[serde(default)]
    pub brand: Option<BrandOverrides>,

    /// Chart canvas sizes
    #[serde(default)]
    pub charts: Option<ChartConfig>,

    /// Inferred table settings
    #[serde(default)]
    pub table: Option<TableConfig>,

    /// Glob filters for recipe discovery
    #[serde(default)]
    pub recipes: Option<RecipeDiscoveryConfig>,

    /// Document footer (default: "Generated by IDM Report")
    #[serde(default)]
    pub footer_text: Option<String>,
}

/// Inclusive lower bounds of the upper three score bands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandConfig {
    /// Excellence threshold (default: 80)
    pub excellence: Option<f64>,
    /// Proficiency threshold (default: 60)
    pub proficiency: Option<f64>,
    /// Attention threshold (default: 40)
    pub attention: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkConfig {
    /// Industry average score (default: 60)
    pub industry_average: Option<f64>,
    /// Top quartile score (default: 75)
    pub top_quartile: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    /// Radar canvas size in px (default: 400)
    pub radar_size: Option<f64>,
    /// Bar chart width in px (default: 520)
    pub bar_width: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Column cap for inferred tables (default: 6)
    pub max_columns: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeDiscoveryConfig {
    /// Glob patterns for recipe files to include (default: `**/*.json`)
    #[serde(default)]
    pub include: Vec<String>,
    /// Glob patterns for recipe files to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Resolved configuration with defaults applied and globs compiled
#[derive(Debug)]
pub struct ResolvedConfig {
    pub thresholds: BandThresholds,
    pub industry_average: f64,
    pub top_quartile: f64,
    pub brand: Brand,
    pub radar_size: f64,
    pub bar_width: f64,
    pub max_columns: usize,
    /// Compiled recipe include patterns
    pub include: GlobSet,
    /// Compiled recipe exclude patterns
    pub exclude: GlobSet,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub footer_text: String,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        anyhow::bail!("{} must be between {} and {} (got {})", name, min, max, value);
    }
    Ok(())
}

impl IdmReportConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        // Band thresholds must be positive, at most 100 and strictly ordered
        if let Some(ref b) = self.bands {
            let excellence = b.excellence.unwrap_or(80.0);
            let proficiency = b.proficiency.unwrap_or(60.0);
            let attention = b.attention.unwrap_or(40.0);

            for (name, value) in [
                ("bands.excellence", excellence),
                ("bands.proficiency", proficiency),
                ("bands.attention", attention),
            ] {
                if value <= 0.0 {
                    anyhow::bail!("{} must be positive (got {})", name, value);
                }
                check_range(name, value, 0.0, 100.0)?;
            }
            if attention >= proficiency {
                anyhow::bail!(
                    "bands.attention ({}) must be less than bands.proficiency ({})",
                    attention,
                    proficiency
                );
            }
            if proficiency >= excellence {
                anyhow::bail!(
                    "bands.proficiency ({}) must be less than bands.excellence ({})",
                    proficiency,
                    excellence
                );
            }
        }

        if let Some(ref bm) = self.benchmarks {
            let average = bm.industry_average.unwrap_or(60.0);
            let top = bm.top_quartile.unwrap_or(75.0);
            check_range("benchmarks.industry_average", average, 0.0, 100.0)?;
            check_range("benchmarks.top_quartile", top, 0.0, 100.0)?;
            if average >= top {
                anyhow::bail!(
                    "benchmarks.industry_average ({}) must be less than benchmarks.top_quartile ({})",
                    average,
                    top
                );
            }
        }

        if let Some(ref c) = self.charts {
            if let Some(size) = c.radar_size {
                check_range("charts.radar_size", size, 100.0, 2000.0)?;
            }
            if let Some(width) = c.bar_width {
                check_range("charts.bar_width", width, 100.0, 2000.0)?;
            }
        }

        if let Some(max) = self.table.as_ref().and_then(|t| t.max_columns) {
            if !(1..=20).contains(&max) {
                anyhow::bail!("table.max_columns must be between 1 and 20 (got {})", max);
            }
        }

        if let Some(ref brand) = self.brand {
            for (name, value) in [
                ("brand.primary_color", &brand.primary_color),
                ("brand.accent_color", &brand.accent_color),
                ("brand.font_heading", &brand.font_heading),
                ("brand.font_body", &brand.font_body),
            ] {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    anyhow::bail!("{} must not be empty", name);
                }
            }
        }

        // Validate glob patterns compile
        if let Some(ref r) = self.recipes {
            for pattern in &r.include {
                Glob::new(pattern)
                    .with_context(|| format!("invalid include pattern: {}", pattern))?;
            }
            for pattern in &r.exclude {
                Glob::new(pattern)
                    .with_context(|| format!("invalid exclude pattern: {}", pattern))?;
            }
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let thresholds = match &self.bands {
            Some(b) => BandThresholds {
                excellence: b.excellence.unwrap_or(80.0),
                proficiency: b.proficiency.unwrap_or(60.0),
                attention: b.attention.unwrap_or(40.0),
            },
            None => BandThresholds::default(),
        };

        let (industry_average, top_quartile) = match &self.benchmarks {
            Some(bm) => (
                bm.industry_average.unwrap_or(60.0),
                bm.top_quartile.unwrap_or(75.0),
            ),
            None => (60.0, 75.0),
        };

        let (radar_size, bar_width) = match &self.charts {
            Some(c) => (c.radar_size.unwrap_or(400.0), c.bar_width.unwrap_or(520.0)),
            None => (400.0, 520.0),
        };

        let discovery = self.recipes.clone().unwrap_or_default();
        let include_patterns = if discovery.include.is_empty() {
            vec![DEFAULT_INCLUDE.to_string()]
        } else {
            discovery.include
        };
        let exclude_patterns = discovery.exclude;

        let include = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &include_patterns {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };
        let exclude = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &exclude_patterns {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };

        let brand = match &self.brand {
            Some(overrides) => Brand::default().merged(overrides),
            None => Brand::default(),
        };

        Ok(ResolvedConfig {
            thresholds,
            industry_average,
            top_quartile,
            brand,
            radar_size,
            bar_width,
            max_columns: self.table.as_ref().and_then(|t| t.max_columns).unwrap_or(6),
            include,
            exclude,
            include_patterns,
            exclude_patterns,
            footer_text: self
                .footer_text
                .clone()
                .unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if a recipe path should be rendered based on include/exclude patterns
    pub fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        // Check exclude first
        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        self.include.is_match(path_str.as_ref())
    }

    /// Settings handed to the report assembler
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            brand: self.brand.clone(),
            thresholds: self.thresholds,
            radar_size: self.radar_size,
            bar_width: self.bar_width,
            industry_average: self.industry_average,
            top_quartile: self.top_quartile,
            max_columns: self.max_columns,
            footer_text: self.footer_text.clone(),
        }
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        IdmReportConfig::default().resolve()
    }
}

/// Discover and load a config file from a directory
///
/// Search order:
/// 1. `.idmreportrc.json`
/// 2. `idmreport.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(IdmReportConfig, PathBuf)>> {
    for name in [".idmreportrc.json", "idmreport.config.json"] {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<IdmReportConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: IdmReportConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `root`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (IdmReportConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = IdmReportConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert_eq!(resolved.thresholds, BandThresholds::default());
        assert_eq!(resolved.industry_average, 60.0);
        assert_eq!(resolved.top_quartile, 75.0);
        assert_eq!(resolved.radar_size, 400.0);
        assert_eq!(resolved.bar_width, 520.0);
        assert_eq!(resolved.max_columns, 6);
        assert_eq!(resolved.footer_text, "Generated by IDM Report");
        assert_eq!(resolved.brand, Brand::default());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r##"{
            "bands": {"excellence": 85, "proficiency": 65, "attention": 45},
            "benchmarks": {"industry_average": 55, "top_quartile": 78},
            "brand": {"primary_color": "#003366", "logo_text": "ACME"},
            "charts": {"radar_size": 480, "bar_width": 600},
            "table": {"max_columns": 4},
            "recipes": {"include": ["recipes/**/*.json"], "exclude": ["**/draft-*.json"]},
            "footer_text": "Confidential"
        }"##;
        let config: IdmReportConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.thresholds.excellence, 85.0);
        assert_eq!(resolved.thresholds.attention, 45.0);
        assert_eq!(resolved.industry_average, 55.0);
        assert_eq!(resolved.brand.primary_color, "#003366");
        assert_eq!(resolved.brand.accent_color, "#969423");
        assert_eq!(resolved.brand.logo_text.as_deref(), Some("ACME"));
        assert_eq!(resolved.max_columns, 4);

        let options = resolved.render_options();
        assert_eq!(options.radar_size, 480.0);
        assert_eq!(options.bar_width, 600.0);
        assert_eq!(options.footer_text, "Confidential");
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"unknown_field": true}"#;
        let result: Result<IdmReportConfig, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown fields should be rejected");
        let nested = r#"{"bands": {"legendary": 95}}"#;
        assert!(serde_json::from_str::<IdmReportConfig>(nested).is_err());
    }

    #[test]
    fn test_reject_unordered_bands() {
        let json = r#"{"bands": {"excellence": 70, "proficiency": 75}}"#;
        let config: IdmReportConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_out_of_range_bands() {
        for json in [
            r#"{"bands": {"attention": -1}}"#,
            r#"{"bands": {"excellence": 120}}"#,
        ] {
            let config: IdmReportConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "{} should be rejected", json);
        }
    }

    #[test]
    fn test_reject_inverted_benchmarks() {
        let json = r#"{"benchmarks": {"industry_average": 80, "top_quartile": 70}}"#;
        let config: IdmReportConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_bad_chart_and_table_sizes() {
        for json in [
            r#"{"charts": {"radar_size": 10}}"#,
            r#"{"charts": {"bar_width": 5000}}"#,
            r#"{"table": {"max_columns": 0}}"#,
            r#"{"table": {"max_columns": 21}}"#,
            r#"{"brand": {"primary_color": "  "}}"#,
        ] {
            let config: IdmReportConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "{} should be rejected", json);
        }
    }

    #[test]
    fn test_reject_invalid_glob_pattern() {
        let json = r#"{"recipes": {"include": ["[invalid"]}}"#;
        let config: IdmReportConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_include_defaults() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert!(resolved.should_include(Path::new("recipes/owner.json")));
        assert!(!resolved.should_include(Path::new("recipes/README.md")));
    }

    #[test]
    fn test_should_include_custom_patterns() {
        let config: IdmReportConfig = serde_json::from_str(
            r#"{"recipes": {
                "include": ["recipes/**/*.json"],
                "exclude": ["**/draft-*.json"]
            }}"#,
        )
        .unwrap();
        let resolved = config.resolve().unwrap();
        assert!(resolved.should_include(Path::new("recipes/owner.json")));
        assert!(!resolved.should_include(Path::new("other/owner.json")));
        assert!(!resolved.should_include(Path::new("recipes/draft-owner.json")));
    }

    #[test]
    fn test_discover_idmreportrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".idmreportrc.json");
        fs::write(&config_path, r#"{"footer_text": "rc"}"#).unwrap();

        let result = discover_config(dir.path()).unwrap();
        assert!(result.is_some());
        let (config, path) = result.unwrap();
        assert_eq!(config.footer_text.as_deref(), Some("rc"));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();

        // Create both config files - .idmreportrc.json should win
        fs::write(dir.path().join(".idmreportrc.json"), r#"{"footer_text": "rc"}"#).unwrap();
        fs::write(
            dir.path().join("idmreport.config.json"),
            r#"{"footer_text": "config"}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.footer_text.as_deref(),
            Some("rc"),
            ".idmreportrc.json should take priority"
        );
    }

    #[test]
    fn test_discover_config_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("idmreport.config.json"),
            r#"{"table": {"max_columns": 3}}"#,
        )
        .unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.max_columns, 3);
        assert!(resolved.config_path.is_some());
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"bands": {"excellence": 90}}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.thresholds.excellence, 90.0);
        assert_eq!(resolved.thresholds.proficiency, 60.0);
        assert_eq!(resolved.config_path, Some(config_path));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("bad.json");
        fs::write(&config_path, r#"{"table": {"max_columns": 99}}"#).unwrap();
        let err = load_config_file(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.json"));
        assert!(format!("{:#}", err).contains("max_columns"));
    }
}
