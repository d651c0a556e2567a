//! HTML report assembly
//!
//! Generates self-contained HTML reports with embedded CSS and inline SVG.
//! Reports carry no scripts, work offline and print cleanly.

use crate::datasource::ResolvedData;
use crate::recipe::{Brand, Recipe, Section};
use crate::visuals::{RenderOptions, RendererRegistry};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

/// Render a recipe over an IDM document as a complete HTML document
///
/// Sections render in recipe order. A section whose renderer fails or panics
/// degrades to a placeholder; the rest of the report is unaffected.
pub fn render_report(
    recipe: &Recipe,
    doc: &Value,
    registry: &RendererRegistry,
    options: &RenderOptions,
) -> String {
    let options = RenderOptions {
        brand: options.brand.merged(&recipe.brand_config),
        ..options.clone()
    };
    let started = Instant::now();
    let sections: String = recipe
        .sections
        .iter()
        .map(|section| render_section(section, doc, registry, &options))
        .collect();
    debug!(
        report = %recipe.report_id,
        sections = recipe.sections.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "assembled report"
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {header}
        <main>{sections}</main>
        {footer}
    </div>
</body>
</html>"#,
        title = html_escape(&recipe.name),
        css = inline_css(&options.brand),
        header = render_header(recipe, doc, &options.brand),
        sections = sections,
        footer = render_footer(&options.footer_text),
    )
}

/// Resolve, render and compose one section
pub fn render_section(
    section: &Section,
    doc: &Value,
    registry: &RendererRegistry,
    options: &RenderOptions,
) -> String {
    if let Some(err) = &section.load_error {
        warn!(section = %section.id, error = %err, "section failed to load, degraded");
        return compose_section(
            section,
            &placeholder(&format!("Section could not be rendered: {}", err)),
        );
    }
    let started = Instant::now();
    let data = ResolvedData::resolve(doc, &section.data_sources);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        registry.render(&data, section, options)
    }));
    let fragment = match outcome {
        Ok(Ok(fragment)) => fragment,
        Ok(Err(err)) => {
            warn!(
                section = %section.id,
                visual_type = %section.visual_type,
                error = %err,
                "section degraded"
            );
            placeholder(&format!("Section could not be rendered: {}", err))
        }
        Err(payload) => {
            warn!(
                section = %section.id,
                visual_type = %section.visual_type,
                panic = %panic_message(payload.as_ref()),
                "renderer panicked, section degraded"
            );
            placeholder("Section could not be rendered")
        }
    };
    debug!(
        section = %section.id,
        elapsed_us = started.elapsed().as_micros() as u64,
        "rendered section"
    );
    compose_section(section, &fragment)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Visible stand-in for a section that failed to render
pub fn placeholder(message: &str) -> String {
    format!(
        r#"<div class="placeholder">[{}]</div>"#,
        html_escape(message)
    )
}

/// Wrap a rendered fragment with the section heading and layout classes
pub fn compose_section(section: &Section, fragment: &str) -> String {
    let mut classes = vec!["report-section".to_string()];
    let visual: String = section
        .visual_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if !visual.is_empty() {
        classes.push(format!("visual-{}", visual));
    }
    if let Some(hints) = &section.layout_hints {
        classes.extend(hints.css_classes());
    }
    let description = section
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!(r#"<p class="section-description">{}</p>"#, html_escape(d)))
        .unwrap_or_default();

    format!(
        r#"<section class="{classes}" id="{id}">
    <h2>{title}</h2>
    {description}
    <div class="section-body">{fragment}</div>
</section>
"#,
        classes = classes.join(" "),
        id = html_escape(&section.id),
        title = html_escape(&section.title),
        description = description,
        fragment = fragment,
    )
}

/// Render header section
fn render_header(recipe: &Recipe, doc: &Value, brand: &Brand) -> String {
    let logo = brand
        .logo_text
        .as_deref()
        .map(|l| format!(r#"<div class="logo">{}</div>"#, html_escape(l)))
        .unwrap_or_default();
    let mut meta = vec![format!(
        r#"<span>Report: <code class="monospace">{}</code></span>"#,
        html_escape(&recipe.report_id)
    )];
    if let Some(run) = doc.pointer("/meta/assessment_run_id").and_then(Value::as_str) {
        meta.push(format!(
            r#"<span>Assessment: <code class="monospace">{}</code></span>"#,
            html_escape(run)
        ));
    }
    if let Some(created) = doc.pointer("/meta/created_at").and_then(Value::as_str) {
        meta.push(format!("<span>Created: {}</span>", html_escape(created)));
    }

    format!(
        r#"<header>
    {logo}
    <h1>{name}</h1>
    <div class="meta">{meta}</div>
</header>"#,
        logo = logo,
        name = html_escape(&recipe.name),
        meta = meta.join(" &bull; "),
    )
}

fn render_footer(text: &str) -> String {
    format!(
        r#"<footer>
    <p>{}</p>
</footer>"#,
        html_escape(text)
    )
}

/// Strip characters that could end a CSS declaration or the style element
fn css_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '<' | '>' | '{' | '}' | ';' | '\\'))
        .collect()
}

/// Inline CSS: brand variables followed by the static stylesheet
fn inline_css(brand: &Brand) -> String {
    format!(
        r#"
:root {{
    --brand-primary: {primary};
    --brand-accent: {accent};
    --font-heading: {heading};
    --font-body: {body};
}}
{rest}"#,
        primary = css_value(&brand.primary_color),
        accent = css_value(&brand.accent_color),
        heading = css_value(&brand.font_heading),
        body = css_value(&brand.font_body),
        rest = STATIC_CSS,
    )
}

const STATIC_CSS: &str = r#"
/* Reset & Base */
* {
    box-sizing: border-box;
    margin: 0;
    padding: 0;
}

body {
    font-family: var(--font-body);
    line-height: 1.6;
    color: #111827;
    background: #ffffff;
}

h1, h2, h3 {
    font-family: var(--font-heading);
    color: var(--brand-primary);
}

/* Container */
.container {
    max-width: 1100px;
    margin: 0 auto;
    padding: 2rem;
}

/* Header */
header {
    margin-bottom: 2rem;
    padding-bottom: 1rem;
    border-bottom: 3px solid var(--brand-accent);
}

header h1 {
    font-size: 2rem;
    font-weight: 700;
    margin-bottom: 0.5rem;
}

header .logo {
    font-family: var(--font-heading);
    font-weight: 700;
    letter-spacing: 0.05em;
    text-transform: uppercase;
    color: var(--brand-accent);
}

header .meta {
    color: #6b7280;
    font-size: 0.875rem;
}

/* Sections */
main {
    display: grid;
    grid-template-columns: repeat(4, 1fr);
    gap: 1.5rem;
}

.report-section {
    grid-column: span 4;
    margin-bottom: 1rem;
}

.report-section h2 {
    font-size: 1.5rem;
    font-weight: 700;
    margin-bottom: 0.5rem;
}

.section-description {
    color: #4b5563;
    margin-bottom: 1rem;
}

.cols-2 .section-body { column-count: 2; column-gap: 2rem; }
.cols-3 .section-body { column-count: 3; column-gap: 2rem; }
.cols-4 .section-body { column-count: 4; column-gap: 2rem; }
.full-width { grid-column: 1 / -1; }
.emphasis-high, .emphasis-strong {
    border-left: 4px solid var(--brand-accent);
    padding-left: 1rem;
}

.placeholder {
    padding: 1rem;
    border: 1px dashed #d1d5db;
    border-radius: 0.5rem;
    color: #6b7280;
    font-style: italic;
}

.empty-state {
    color: #6b7280;
    font-style: italic;
}

/* Charts */
svg.chart {
    max-width: 100%;
    height: auto;
}

/* Score tiles */
.score-tiles {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
    gap: 1rem;
}

.score-tile, .metric-card {
    background: #f9fafb;
    padding: 1rem;
    border-radius: 0.5rem;
    border-left: 4px solid var(--brand-primary);
    break-inside: avoid;
}

.score-value, .metric-value {
    font-size: 2rem;
    font-weight: 700;
}

.score-label, .metric-label {
    font-weight: 600;
    color: #374151;
}

.score-band, .score-trajectory, .metric-context {
    font-size: 0.8rem;
    color: #6b7280;
}

.metric-unit {
    font-size: 1rem;
    margin-left: 0.25rem;
}

.band-excellence { border-left-color: #28a745; }
.band-proficiency { border-left-color: #0d6efd; }
.band-attention { border-left-color: #ffc107; }
.band-critical { border-left-color: #dc3545; }

/* Progress bars */
.progress-row {
    display: grid;
    grid-template-columns: 180px 1fr 3rem;
    gap: 0.75rem;
    align-items: center;
    margin-bottom: 0.5rem;
}

.progress-track {
    background: #f3f4f6;
    border-radius: 999px;
    height: 0.75rem;
    overflow: hidden;
}

.progress-fill {
    height: 100%;
}

.progress-value {
    font-weight: 600;
    text-align: right;
}

/* KPI dashboard */
.kpi-dashboard {
    display: grid;
    grid-template-columns: auto 1fr;
    gap: 1.5rem;
    align-items: start;
}

.kpi-caption {
    font-size: 0.8rem;
    color: #6b7280;
    text-align: center;
}

/* Table */
table {
    width: 100%;
    border-collapse: collapse;
    background: #ffffff;
}

thead {
    background: #f9fafb;
}

th {
    padding: 0.75rem;
    text-align: left;
    font-weight: 600;
    font-size: 0.875rem;
    color: #374151;
    border-bottom: 2px solid #e5e7eb;
}

td {
    padding: 0.75rem;
    border-bottom: 1px solid #e5e7eb;
    font-size: 0.875rem;
    vertical-align: top;
}

tr:last-child td {
    border-bottom: none;
}

.rank {
    width: 3rem;
    color: #6b7280;
}

.rank-score {
    float: right;
    font-weight: 600;
}

/* Risk matrix */
.risk-matrix td {
    height: 4rem;
}

.risk-low { background: #f0fdf4; }
.risk-medium { background: #fffbeb; }
.risk-high { background: #fef2f2; }

.risk-item {
    display: inline-block;
    margin: 0.125rem;
    padding: 0.125rem 0.5rem;
    border-radius: 999px;
    background: #ffffff;
    border: 1px solid #e5e7eb;
    font-size: 0.75rem;
}

.risk-unplaced {
    font-size: 0.8rem;
    color: #6b7280;
    margin-top: 0.5rem;
}

/* Lists */
.bullet-list, .numbered-list, .checklist, .narrative-block ul {
    padding-left: 1.5rem;
}

.checklist {
    list-style: none;
    padding-left: 0;
}

.checklist-steps {
    list-style: none;
    padding-left: 1.5rem;
}

.checklist-item.checked {
    color: #6b7280;
}

/* Narrative */
.text-block p, .narrative-block p, .callout p {
    margin-bottom: 0.75rem;
}

.narrative-headline {
    display: flex;
    gap: 1rem;
    align-items: baseline;
    margin-bottom: 1rem;
}

.narrative-headline .descriptor {
    font-weight: 600;
    color: var(--brand-primary);
}

.narrative-block h3 {
    font-size: 1.1rem;
    margin: 1rem 0 0.5rem;
}

.trajectory-improving { color: #28a745; }
.trajectory-flat { color: #6b7280; }
.trajectory-declining { color: #dc3545; }

/* Callouts */
.callout {
    padding: 1rem 1.25rem;
    border-radius: 0.5rem;
    border-left: 4px solid var(--brand-primary);
    background: #f9fafb;
}

.callout-heading {
    font-weight: 700;
    margin-bottom: 0.5rem;
}

.callout-warning { border-left-color: #ffc107; background: #fffbeb; }
.callout-danger, .callout-critical { border-left-color: #dc3545; background: #fef2f2; }
.callout-success, .callout-positive { border-left-color: #28a745; background: #f0fdf4; }

/* Roadmap */
.roadmap-phases {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
    gap: 1rem;
    margin-top: 1rem;
}

.roadmap-step {
    display: inline-block;
    width: 1.75rem;
    height: 1.75rem;
    border-radius: 50%;
    background: var(--brand-primary);
    color: #ffffff;
    text-align: center;
    font-size: 0.9rem;
    line-height: 1.75rem;
}

.roadmap-horizon, .roadmap-linked {
    font-size: 0.8rem;
    color: #6b7280;
    font-weight: 400;
}

/* Code/Monospace */
.monospace {
    font-family: 'Monaco', 'Courier New', monospace;
    font-size: 0.875rem;
}

/* Footer */
footer {
    margin-top: 3rem;
    padding-top: 1rem;
    border-top: 1px solid #e5e7eb;
    text-align: center;
    color: #6b7280;
    font-size: 0.875rem;
}

/* Mobile */
@media (max-width: 768px) {
    .container {
        padding: 1rem;
    }

    header h1 {
        font-size: 1.5rem;
    }

    .cols-2 .section-body, .cols-3 .section-body, .cols-4 .section-body {
        column-count: 1;
    }

    .kpi-dashboard {
        grid-template-columns: 1fr;
    }
}

/* Print */
@media print {
    .container {
        max-width: none;
        padding: 0;
    }

    .page-break-before { break-before: page; }
    .page-break-after { break-after: page; }

    .report-section {
        break-inside: avoid;
    }
}
"#;

/// Escape text for HTML element content and attribute values
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
