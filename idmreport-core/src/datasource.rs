//! Data source resolution
//!
//! Composes the path resolver and the pipeline into named bindings. A
//! section's bindings are collected into [`ResolvedData`], built fresh for
//! every section render and dropped afterwards.

use crate::path::resolve_path;
use crate::pipeline::{apply_pipeline, PipelineSpec};
use crate::recipe::DataSource;
use serde_json::Value;
use tracing::warn;

/// Resolve one data source against the document. Misses yield `None`.
pub fn resolve_data_source(doc: &Value, source: &DataSource) -> Option<Value> {
    if let Some(err) = &source.load_error {
        warn!(source = %source.id, error = %err, "skipping data source that failed to load");
        return None;
    }
    let resolved = resolve_path(doc, &source.from)?.clone();
    let spec = PipelineSpec {
        filters: &source.filters,
        sort: source.sort.as_ref(),
        limit: source.limit,
        offset: source.offset,
    };
    Some(apply_pipeline(resolved, &spec))
}

/// Values bound for one section, in data-source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedData {
    entries: Vec<(String, Option<Value>)>,
}

impl ResolvedData {
    /// Resolve every data source of a section
    pub fn resolve(doc: &Value, sources: &[DataSource]) -> Self {
        let entries = sources
            .iter()
            .map(|source| (source.id.clone(), resolve_data_source(doc, source)))
            .collect();
        ResolvedData { entries }
    }

    /// Build from already-resolved values
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<Value>)>,
        S: Into<String>,
    {
        ResolvedData {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Single unnamed binding, mostly useful for tests and previews
    pub fn single(value: Value) -> Self {
        Self::from_entries([("data", Some(value))])
    }

    /// Value bound under `id`. Absent ids and misses both yield `None`.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .and_then(|(_, v)| v.as_ref())
    }

    /// The first binding; what single-input renderers draw
    pub fn primary(&self) -> Option<&Value> {
        self.entries.first().and_then(|(_, v)| v.as_ref())
    }

    /// The `n`th binding in recipe order
    pub fn nth(&self, n: usize) -> Option<&Value> {
        self.entries.get(n).and_then(|(_, v)| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}
