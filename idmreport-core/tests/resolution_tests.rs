//! Integration tests for path resolution and the data-source pipeline

use idmreport_core::recipe::{DataSource, Filter, Operator, SortDirection, SortSpec};
use idmreport_core::{load_idm_file, resolve_data_source, resolve_path, ResolvedData};
use serde_json::{json, Value};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn sample_idm() -> Value {
    load_idm_file(&fixture_path("idm/sample_idm.json")).unwrap()
}

fn source(from: &str) -> DataSource {
    DataSource {
        id: "d".to_string(),
        from: from.to_string(),
        ..Default::default()
    }
}

fn scores(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().or_else(|| v["score_overall"].as_f64()).unwrap())
        .collect()
}

#[test]
fn test_bracket_filter_selects_dimension() {
    let doc = sample_idm();
    let strategy = resolve_path(&doc, "dimensions[dimension_code=STR]").unwrap();
    assert_eq!(strategy["name"], "Strategy");
    assert!(resolve_path(&doc, "dimensions[dimension_code=ZZZ]").is_none());
}

#[test]
fn test_bracket_filter_then_continues_path() {
    let doc = sample_idm();
    let subs = resolve_path(&doc, "dimensions[dimension_code=STR].sub_indicators").unwrap();
    assert_eq!(subs.as_array().unwrap().len(), 2);
    let score = resolve_path(&doc, "dimensions[dimension_code=FIN].score_overall").unwrap();
    assert_eq!(score, &json!(80));
}

#[test]
fn test_plain_and_indexed_paths() {
    let doc = sample_idm();
    assert_eq!(
        resolve_path(&doc, "meta.company_name").unwrap(),
        "Northwind Provisions"
    );
    assert_eq!(resolve_path(&doc, "roadmap.phases.1.name").unwrap(), "Build");
    assert!(resolve_path(&doc, "meta.missing.deeper").is_none());
    assert!(resolve_path(&doc, "").is_none());
}

#[test]
fn test_gte_filter_keeps_order() {
    let doc = json!({"scores": [{"score_overall": 72}, {"score_overall": 55}, {"score_overall": 80}, {"score_overall": 40}, {"score_overall": 65}]});
    let mut ds = source("scores");
    ds.filters = vec![Filter {
        field: Some("score_overall".to_string()),
        operator: Some(Operator::Gte),
        value: Some(json!(60)),
        ..Default::default()
    }];
    let out = resolve_data_source(&doc, &ds).unwrap();
    assert_eq!(scores(&out), vec![72.0, 80.0, 65.0]);
}

#[test]
fn test_sort_then_limit_takes_lowest() {
    let doc = sample_idm();
    let mut ds = source("dimensions");
    ds.filters = vec![Filter {
        min_score: Some(60.0),
        ..Default::default()
    }];
    ds.sort = Some(SortSpec {
        field: "score_overall".to_string(),
        direction: SortDirection::Asc,
    });
    let sorted = resolve_data_source(&doc, &ds).unwrap();
    assert_eq!(scores(&sorted), vec![65.0, 72.0, 80.0]);

    ds.limit = Some(2);
    let limited = resolve_data_source(&doc, &ds).unwrap();
    assert_eq!(scores(&limited), vec![65.0, 72.0]);
}

#[test]
fn test_numeric_sort_is_not_lexicographic() {
    let doc = json!({"items": [{"n": 2}, {"n": 10}, {"n": 1}]});
    let mut ds = source("items");
    ds.sort = Some(SortSpec {
        field: "n".to_string(),
        direction: SortDirection::Asc,
    });
    let out = resolve_data_source(&doc, &ds).unwrap();
    let ns: Vec<i64> = out
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["n"].as_i64().unwrap())
        .collect();
    assert_eq!(ns, vec![1, 2, 10]);
}

#[test]
fn test_offset_past_end_is_empty() {
    let doc = sample_idm();
    let mut ds = source("dimensions");
    ds.offset = Some(50);
    assert_eq!(resolve_data_source(&doc, &ds), Some(json!([])));
}

#[test]
fn test_type_and_code_filters() {
    let doc = sample_idm();
    let mut gaps = source("findings");
    gaps.filters = vec![Filter {
        kind: Some("gap".to_string()),
        ..Default::default()
    }];
    let out = resolve_data_source(&doc, &gaps).unwrap();
    assert_eq!(out.as_array().unwrap().len(), 2);

    let mut growth = source("dimensions");
    growth.filters = vec![Filter {
        chapter_codes: Some(vec!["GE".to_string()]),
        ..Default::default()
    }];
    let out = resolve_data_source(&doc, &growth).unwrap();
    let codes: Vec<&str> = out
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["dimension_code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["STR", "SAL"]);
}

#[test]
fn test_pipeline_is_noop_on_objects() {
    let doc = sample_idm();
    let mut ds = source("scores_summary");
    ds.limit = Some(1);
    ds.filters = vec![Filter {
        min_score: Some(99.0),
        ..Default::default()
    }];
    let out = resolve_data_source(&doc, &ds).unwrap();
    assert_eq!(out, doc["scores_summary"]);
}

#[test]
fn test_resolution_does_not_mutate_document() {
    let doc = sample_idm();
    let before = doc.clone();
    let mut ds = source("dimensions");
    ds.sort = Some(SortSpec {
        field: "name".to_string(),
        direction: SortDirection::Desc,
    });
    let _ = resolve_data_source(&doc, &ds);
    let _ = ResolvedData::resolve(&doc, &[ds, source("missing")]);
    assert_eq!(doc, before);
}

#[test]
fn test_resolved_data_keeps_misses() {
    let doc = sample_idm();
    let data = ResolvedData::resolve(&doc, &[source("missing.path"), source("chapters")]);
    assert_eq!(data.len(), 2);
    assert!(data.nth(0).is_none());
    assert!(data.nth(1).is_some());
}
