//! IDM Report core library - declarative recipe rendering over Integrated Diagnostic Model documents

// Global invariants enforced in this crate:
// - Rendering never mutates the IDM or the recipe
// - No global mutable state; the renderer registry is read-only after construction
// - No randomness, clocks (outside debug timing), threads, or async
// - Sections render in recipe order
// - A failing section degrades to a placeholder, never aborts the report
// - Identical input yields byte-for-byte identical output

pub mod bands;
pub mod charts;
pub mod config;
pub mod datasource;
pub mod html;
pub mod path;
pub mod pipeline;
pub mod recipe;
pub mod value;
pub mod visuals;

pub use bands::{BandThresholds, ScoreBand, Trajectory};
pub use config::ResolvedConfig;
pub use datasource::{resolve_data_source, ResolvedData};
pub use path::resolve_path;
pub use recipe::{load_recipe_file, parse_recipe, Brand, DataSource, Recipe, Section};
pub use visuals::{RenderFn, RenderOptions, RendererRegistry, VisualType};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Render a recipe with the built-in renderers and the given configuration
pub fn render(recipe: &Recipe, doc: &Value, config: &ResolvedConfig) -> String {
    let registry = RendererRegistry::with_builtins();
    html::render_report(recipe, doc, &registry, &config.render_options())
}

/// Load an IDM document from a JSON file
///
/// The document must be a JSON object; everything below the root is
/// resolved leniently at render time.
pub fn load_idm_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read IDM file: {}", path.display()))?;
    let doc: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse IDM file: {}", path.display()))?;
    if !doc.is_object() {
        anyhow::bail!("IDM document must be a JSON object: {}", path.display());
    }
    Ok(doc)
}
