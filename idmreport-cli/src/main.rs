//! IDM Report CLI - render IDM documents into self-contained HTML reports

// Global invariants enforced:
// - Recipes render independently; one recipe's output never depends on another
// - Output files are written atomically
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Parser, Subcommand};
use idmreport_core::config::{self, ResolvedConfig};
use idmreport_core::html::render_report;
use idmreport_core::recipe::{load_recipe_file, DataSource, Recipe};
use idmreport_core::{load_idm_file, resolve_data_source, resolve_path, RendererRegistry};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "idmreport")]
#[command(about = "Render IDM documents into self-contained HTML reports using declarative recipes")]
#[command(version = env!("IDMREPORT_VERSION"))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one HTML report per recipe
    Render {
        /// Path to the IDM document (JSON)
        #[arg(long)]
        idm: PathBuf,

        /// Recipe file (repeatable)
        #[arg(long)]
        recipe: Vec<PathBuf>,

        /// Directory searched recursively for recipes (filtered by config globs)
        #[arg(long)]
        recipes_dir: Option<PathBuf>,

        /// Output directory; each report is written to <out-dir>/<report_id>.html
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the value a path expression or data source resolves to
    Resolve {
        /// Path to the IDM document (JSON)
        #[arg(long)]
        idm: PathBuf,

        /// Path expression, e.g. `dimensions[dimension_code=STR].score_overall`
        #[arg(long, conflicts_with = "source", required_unless_present = "source")]
        path: Option<String>,

        /// Full data source as JSON, e.g. `{"id":"d","from":"dimensions","limit":2}`
        #[arg(long)]
        source: Option<String>,
    },
    /// Recipe utilities
    Recipe {
        #[command(subcommand)]
        action: RecipeAction,
    },
    /// Validate or inspect a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum RecipeAction {
    /// Validate a recipe file without rendering
    Validate {
        /// Path to the recipe file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without rendering
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Render {
            idm,
            recipe,
            recipes_dir,
            out_dir,
            config: config_path,
        } => {
            let project_root = std::env::current_dir()?;
            let resolved_config = config::load_and_resolve(&project_root, config_path.as_deref())
                .context("failed to load configuration")?;

            if let Some(config_path) = &resolved_config.config_path {
                eprintln!("Using config: {}", config_path.display());
            }

            let doc = load_idm_file(&idm)?;

            let mut recipe_paths = recipe;
            if let Some(dir) = recipes_dir {
                recipe_paths.extend(discover_recipes(&dir, &resolved_config)?);
            }
            if recipe_paths.is_empty() {
                anyhow::bail!("no recipes given (use --recipe or --recipes-dir)");
            }

            let recipes = load_recipes(&recipe_paths)?;
            let written = render_all(&recipes, &doc, &resolved_config, &out_dir)?;
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
        Commands::Resolve { idm, path, source } => {
            let doc = load_idm_file(&idm)?;
            let resolved = match (path, source) {
                (_, Some(source)) => {
                    let source: DataSource = serde_json::from_str(&source)
                        .context("--source is not a valid data source")?;
                    resolve_data_source(&doc, &source)
                }
                (Some(path), None) => resolve_path(&doc, &path).cloned(),
                (None, None) => anyhow::bail!("either --path or --source is required"),
            };

            match resolved {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => {
                    eprintln!("Nothing resolved.");
                    println!("null");
                }
            }
        }
        Commands::Recipe { action } => match action {
            RecipeAction::Validate { file } => match load_recipe_file(&file) {
                Ok(recipe) => {
                    let registry = RendererRegistry::with_builtins();
                    println!(
                        "Recipe valid: {} ({} sections)",
                        file.display(),
                        recipe.sections.len()
                    );
                    for section in &recipe.sections {
                        if let Some(err) = &section.load_error {
                            eprintln!("  warning: section '{}' could not be loaded: {}", section.id, err);
                            continue;
                        }
                        for source in section.data_sources.iter().filter(|d| d.load_error.is_some()) {
                            eprintln!(
                                "  warning: section '{}' data source '{}' could not be loaded: {}",
                                section.id,
                                source.id,
                                source.load_error.as_deref().unwrap_or_default()
                            );
                        }
                        if !registry.contains(&section.visual_type) {
                            eprintln!(
                                "  warning: section '{}' uses unsupported visual type '{}'",
                                section.id, section.visual_type
                            );
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Recipe validation failed: {:#}", e);
                    std::process::exit(1);
                }
            },
        },
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

/// Install the stderr log subscriber; quiet unless -v is given
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_config(resolved: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Bands:");
    println!("  excellence: {}", resolved.thresholds.excellence);
    println!("  proficiency: {}", resolved.thresholds.proficiency);
    println!("  attention: {}", resolved.thresholds.attention);
    println!();
    println!("Benchmarks:");
    println!("  industry_average: {}", resolved.industry_average);
    println!("  top_quartile: {}", resolved.top_quartile);
    println!();
    println!("Brand:");
    println!("  primary_color: {}", resolved.brand.primary_color);
    println!("  accent_color: {}", resolved.brand.accent_color);
    println!("  font_heading: {}", resolved.brand.font_heading);
    println!("  font_body: {}", resolved.brand.font_body);
    println!(
        "  logo_text: {}",
        resolved.brand.logo_text.as_deref().unwrap_or("none")
    );
    println!();
    println!("Charts:");
    println!("  radar_size: {}", resolved.radar_size);
    println!("  bar_width: {}", resolved.bar_width);
    println!();
    println!("Table:");
    println!("  max_columns: {}", resolved.max_columns);
    println!();
    println!("Recipes:");
    println!("  include: {}", resolved.include_patterns.join(", "));
    if resolved.exclude_patterns.is_empty() {
        println!("  exclude: none");
    } else {
        println!("  exclude: {}", resolved.exclude_patterns.join(", "));
    }
    println!();
    println!("Footer: {}", resolved.footer_text);
}

/// Recursively collect recipe files under `dir`, sorted for stable output
///
/// Paths are matched against the include/exclude globs relative to `dir`.
fn discover_recipes(dir: &Path, config: &ResolvedConfig) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Recipes directory does not exist: {}", dir.display());
    }

    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory: {}", current.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let relative = path.strip_prefix(dir).unwrap_or(&path);
            if config.should_include(relative) {
                found.push(path);
            } else {
                debug!(path = %relative.display(), "recipe skipped by filters");
            }
        }
    }
    found.sort();
    info!(dir = %dir.display(), count = found.len(), "discovered recipes");
    Ok(found)
}

/// Load every recipe, rejecting two recipes that would write the same file
fn load_recipes(paths: &[PathBuf]) -> anyhow::Result<Vec<Recipe>> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    let mut recipes = Vec::with_capacity(paths.len());
    for path in paths {
        let recipe = load_recipe_file(path)?;
        if let Some(first) = seen.insert(recipe.report_id.clone(), path) {
            anyhow::bail!(
                "duplicate report_id '{}' in {} and {}",
                recipe.report_id,
                first.display(),
                path.display()
            );
        }
        recipes.push(recipe);
    }
    Ok(recipes)
}

/// Render recipes in parallel and write `<out_dir>/<report_id>.html`
fn render_all(
    recipes: &[Recipe],
    doc: &serde_json::Value,
    config: &ResolvedConfig,
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let registry = RendererRegistry::with_builtins();
    let options = config.render_options();

    let progress = ProgressBar::new(recipes.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let written = recipes
        .par_iter()
        .map(|recipe| -> anyhow::Result<PathBuf> {
            let html = render_report(recipe, doc, &registry, &options);
            let path = out_dir.join(format!("{}.html", file_stem(&recipe.report_id)));
            write_html_report(&path, &html)?;
            progress.set_message(recipe.report_id.clone());
            progress.inc(1);
            Ok(path)
        })
        .collect::<anyhow::Result<Vec<PathBuf>>>();

    progress.finish_and_clear();
    written
}

/// Report id reduced to a safe file name
fn file_stem(report_id: &str) -> String {
    let stem: String = report_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    match stem.trim_matches('.') {
        "" => "report".to_string(),
        s => s.to_string(),
    }
}

/// Write HTML report to file with atomic write pattern
fn write_html_report(path: &Path, html: &str) -> anyhow::Result<()> {
    use std::fs;

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Atomic write (temp + rename pattern)
    let temp_path = path.with_extension("html.tmp");
    fs::write(&temp_path, html)
        .with_context(|| format!("Failed to write temporary file: {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temporary file to: {}", path.display()))?;

    Ok(())
}
