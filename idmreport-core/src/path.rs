//! Path expressions over IDM documents
//!
//! Grammar: `segment ('.' segment)*`, where at most one segment may carry a
//! bracket filter `segment '[' key '=' value ']'`.
//!
//! Expressions are parsed into a [`PathExpr`] (plain keys/indices before the
//! bracket, the bracket filter, and the remaining segments) and then walked
//! against the document. Only the first bracket group is recognized: a second
//! bracket segment such as `a[x=1].b[y=2]` stays in the remainder and is looked
//! up as the literal key `b[y=2]`, which misses.
//!
//! Resolution never fails. Anything that does not exist resolves to `None`.

use crate::value::coerce_string;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// One traversal step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object property (also matches numeric keys on objects)
    Key(String),
    /// Numeric segment; indexes sequences, falls back to a key lookup on objects
    Index(usize),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(i) if raw == i.to_string() => Segment::Index(i),
            _ => Segment::Key(raw.to_string()),
        }
    }

    fn step<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (self, value) {
            (Segment::Key(k), Value::Object(map)) => map.get(k),
            (Segment::Index(i), Value::Array(items)) => items.get(*i),
            (Segment::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            _ => None,
        }
    }
}

/// `[key=value]` selector applied to a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketFilter {
    pub key: String,
    pub value: String,
}

impl BracketFilter {
    /// Select the first element whose coerced `key` field equals `value`
    fn select<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        value
            .as_array()?
            .iter()
            .find(|item| coerce_string(item.get(&self.key)) == self.value)
    }
}

/// Parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    pub base: Vec<Segment>,
    pub filter: Option<BracketFilter>,
    pub remainder: Vec<Segment>,
    /// Bracket group present but without `=`; such a path never matches.
    malformed_filter: bool,
}

fn bracket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([^\[]+)\[([^\]]+)\](.*)$").unwrap_or_else(|e| panic!("bracket regex: {e}"))
    })
}

fn split_segments(path: &str) -> Vec<Segment> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(Segment::parse)
        .collect()
}

impl PathExpr {
    /// Parse a path expression. Parsing is total; odd input yields a path
    /// that simply resolves to nothing.
    pub fn parse(path: &str) -> Self {
        let path = path.trim();
        let Some(caps) = bracket_pattern().captures(path) else {
            return PathExpr {
                base: split_segments(path),
                filter: None,
                remainder: Vec::new(),
                malformed_filter: false,
            };
        };

        let base = split_segments(&caps[1]);
        let filter_expr = &caps[2];
        let remainder = split_segments(&caps[3]);

        match filter_expr.split_once('=') {
            Some((key, value)) => PathExpr {
                base,
                filter: Some(BracketFilter {
                    key: key.to_string(),
                    value: value.to_string(),
                }),
                remainder,
                malformed_filter: false,
            },
            None => PathExpr {
                base,
                filter: None,
                remainder,
                malformed_filter: true,
            },
        }
    }

    /// Walk the expression against a document
    pub fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        if self.base.is_empty() || self.malformed_filter {
            return None;
        }
        let mut current = walk(doc, &self.base)?;
        if let Some(filter) = &self.filter {
            current = filter.select(current)?;
        }
        walk(current, &self.remainder)
    }
}

fn walk<'a>(start: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(start, |current, segment| segment.step(current))
}

/// Resolve `path` against `doc`
pub fn resolve_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let expr = PathExpr::parse(path);
    let resolved = expr.resolve(doc);
    if resolved.is_none() {
        tracing::debug!(path, "path resolved to nothing");
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "dimensions": [
                {"dimension_code": "STR", "score_overall": 72, "benchmark": {"peer_percentile": 64}},
                {"dimension_code": "SAL", "score_overall": 55}
            ],
            "roadmap": {"phases": [{"name": "Stabilize"}, {"name": "Scale"}]},
            "scores_summary": {"overall_health_score": 68.5}
        })
    }

    #[test]
    fn test_parse_plain_path() {
        let expr = PathExpr::parse("roadmap.phases.1.name");
        assert_eq!(
            expr.base,
            vec![
                Segment::Key("roadmap".into()),
                Segment::Key("phases".into()),
                Segment::Index(1),
                Segment::Key("name".into()),
            ]
        );
        assert!(expr.filter.is_none());
    }

    #[test]
    fn test_parse_bracket_path() {
        let expr = PathExpr::parse("dimensions[dimension_code=STR].benchmark.peer_percentile");
        assert_eq!(expr.base, vec![Segment::Key("dimensions".into())]);
        assert_eq!(
            expr.filter,
            Some(BracketFilter {
                key: "dimension_code".into(),
                value: "STR".into()
            })
        );
        assert_eq!(expr.remainder.len(), 2);
    }

    #[test]
    fn test_bracket_selects_first_match() {
        let doc = sample();
        let found = resolve_path(&doc, "dimensions[dimension_code=STR]").unwrap();
        assert_eq!(found["score_overall"], json!(72));
        assert!(resolve_path(&doc, "dimensions[dimension_code=ZZZ]").is_none());
    }

    #[test]
    fn test_bracket_with_remainder() {
        let doc = sample();
        assert_eq!(
            resolve_path(&doc, "dimensions[dimension_code=STR].benchmark.peer_percentile"),
            Some(&json!(64))
        );
    }

    #[test]
    fn test_bracket_matches_coerced_numbers() {
        let doc = sample();
        let found = resolve_path(&doc, "dimensions[score_overall=55]").unwrap();
        assert_eq!(found["dimension_code"], json!("SAL"));
    }

    #[test]
    fn test_index_segments_on_sequences() {
        let doc = sample();
        assert_eq!(resolve_path(&doc, "roadmap.phases.0.name"), Some(&json!("Stabilize")));
        assert!(resolve_path(&doc, "roadmap.phases.9.name").is_none());
    }

    #[test]
    fn test_misses_resolve_to_none() {
        let doc = sample();
        assert!(resolve_path(&doc, "").is_none());
        assert!(resolve_path(&doc, "nope.deeper").is_none());
        assert!(resolve_path(&doc, "scores_summary.overall_health_score.x").is_none());
        assert!(resolve_path(&doc, "scores_summary[a=b]").is_none());
        assert!(resolve_path(&doc, "dimensions[dimension_code]").is_none());
    }

    #[test]
    fn test_bracket_filter_compares_verbatim() {
        let doc = json!({"a": [{"k": " x", "n": 1}, {"k": "x", "n": 2}]});
        assert_eq!(resolve_path(&doc, "a[k= x].n"), Some(&json!(1)));
        assert_eq!(resolve_path(&doc, "a[k=x].n"), Some(&json!(2)));
        assert!(resolve_path(&doc, "a[k =x]").is_none());
    }

    #[test]
    fn test_only_canonical_numbers_index() {
        let doc = json!({"a": ["zero", "one"], "m": {"01": "padded", "1": "plain"}});
        assert_eq!(resolve_path(&doc, "a.1"), Some(&json!("one")));
        assert!(resolve_path(&doc, "a.01").is_none());
        assert_eq!(resolve_path(&doc, "m.01"), Some(&json!("padded")));
        assert_eq!(resolve_path(&doc, "m.1"), Some(&json!("plain")));
    }

    #[test]
    fn test_second_bracket_is_not_interpreted() {
        let doc = json!({"a": [{"x": "1", "b": [{"y": "2", "v": true}]}]});
        assert!(resolve_path(&doc, "a[x=1].b[y=2].v").is_none());
        assert_eq!(resolve_path(&doc, "a[x=1].b.0.v"), Some(&json!(true)));
    }
}
