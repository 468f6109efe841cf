//! CLI command implementations for mldash.
//!
//! Provides subcommand handlers for:
//! - `mldash info`: model metadata
//! - `mldash classify --feature name=value ...`: one classification
//! - `mldash history`: recent classifications (table, json or csv)
//! - `mldash compare`: per-model evaluation metrics
//! - `mldash eda [NAME]`: list EDA charts or show one chart's URL
//! - `mldash health`: backend reachability and config sources
//! - `mldash config show|path|init|set|reset`: configuration management
//!
//! Table output goes through the same [`Dashboard`] controller the web page
//! uses, drawn on a [`TerminalSurface`]. JSON and CSV output talk to the
//! backend directly so failures surface as a non-zero exit.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::http::HttpTransport;
use crate::api::{self, HistoryRecord, ModelComparison};
use crate::config::{self, DashConfig};
use crate::dashboard::{Dashboard, FormSubmission};
use crate::render::terminal::TerminalSurface;
use crate::render::view::{format_timestamp, format_title};

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Fail for commands whose output has no tabular shape.
fn reject_csv(format: OutputFormat, command: &str) -> Result<()> {
    if format == OutputFormat::Csv {
        anyhow::bail!("csv output is not supported by `mldash {command}`; use table or json");
    }
    Ok(())
}

fn terminal_dashboard(config: &DashConfig) -> Dashboard<HttpTransport, TerminalSurface> {
    Dashboard::new(
        HttpTransport::from_config(&config.api),
        TerminalSurface::stdout(),
        config.dashboard.clone(),
    )
}

// ---------------------------------------------------------------------------
// mldash info
// ---------------------------------------------------------------------------

/// Show the deployed model's metadata.
pub fn run_info(config: &DashConfig, format: OutputFormat) -> Result<()> {
    reject_csv(format, "info")?;
    match format {
        OutputFormat::Table => {
            let dash = terminal_dashboard(config);
            dash.load_model_info();
            dash.build_prediction_form();
        }
        OutputFormat::Json | OutputFormat::Csv => {
            let transport = HttpTransport::from_config(&config.api);
            let info = api::fetch_model_info(&transport)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// mldash classify
// ---------------------------------------------------------------------------

/// Classify one feature vector given as `name=value` pairs.
pub fn run_classify(config: &DashConfig, features: &[String], format: OutputFormat) -> Result<()> {
    reject_csv(format, "classify")?;
    let form = FormSubmission::from_assignments(features)?;
    if features.is_empty() {
        anyhow::bail!("no features given; pass --feature name=value for each model feature");
    }

    match format {
        OutputFormat::Table => {
            let dash = terminal_dashboard(config);
            dash.submit_prediction(&form);
        }
        OutputFormat::Json | OutputFormat::Csv => {
            let bad = form.non_numeric_fields();
            if config.dashboard.reject_non_numeric && !bad.is_empty() {
                anyhow::bail!("non-numeric values for: {}", bad.join(", "));
            }
            let transport = HttpTransport::from_config(&config.api);
            let result = api::classify(&transport, &form.to_feature_vector())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// mldash history
// ---------------------------------------------------------------------------

/// Show recent classifications, newest first.
pub fn run_history(config: &DashConfig, limit: Option<u32>, format: OutputFormat) -> Result<()> {
    let limit = limit.unwrap_or(config.dashboard.history_limit);

    if format == OutputFormat::Table {
        terminal_dashboard(config).load_history(limit);
        return Ok(());
    }

    let transport = HttpTransport::from_config(&config.api);
    let records = api::fetch_history(&transport, limit)?;
    match format {
        OutputFormat::Csv => print!("{}", history_csv(&records)),
        _ => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

fn history_csv(records: &[HistoryRecord]) -> String {
    let mut out = String::from("id,timestamp,predicted_class,confidence,model_used\n");
    for r in records {
        out.push_str(&format!(
            "{},{},{},{:.4},{}\n",
            r.id,
            csv_field(&format_timestamp(&r.timestamp)),
            csv_field(&r.predicted_class),
            r.confidence,
            csv_field(&r.model_used),
        ));
    }
    out
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

// ---------------------------------------------------------------------------
// mldash compare
// ---------------------------------------------------------------------------

/// Show the per-model evaluation table.
pub fn run_compare(config: &DashConfig, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Table {
        terminal_dashboard(config).load_model_comparison();
        return Ok(());
    }

    let transport = HttpTransport::from_config(&config.api);
    let comparison = api::fetch_model_comparison(&transport)?;
    match format {
        OutputFormat::Csv => print!("{}", comparison_csv(&comparison)),
        _ => println!("{}", serde_json::to_string_pretty(&comparison)?),
    }
    Ok(())
}

fn comparison_csv(comparison: &ModelComparison) -> String {
    let mut out = String::from("model_name,accuracy,precision,recall,f1_score,roc_auc,best\n");
    for m in &comparison.models {
        out.push_str(&format!(
            "{},{:.4},{:.4},{:.4},{:.4},{:.4},{}\n",
            csv_field(&m.model_name),
            m.accuracy,
            m.precision,
            m.recall,
            m.f1_score,
            m.roc_auc,
            m.model_name == comparison.best_model,
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// mldash eda
// ---------------------------------------------------------------------------

/// List the available EDA charts, or show where one of them is served.
pub fn run_eda(config: &DashConfig, name: Option<&str>) -> Result<()> {
    let dash = terminal_dashboard(config);

    match name {
        Some(name) => dash.show_image(name),
        None => {
            println!("{}", "Available EDA charts".bold().cyan());
            println!("{}", "=".repeat(50));
            for chart in dash.eda_charts() {
                println!("  {:<28} {}", chart, format_title(&chart).dimmed());
            }
            println!();
            println!(
                "  {} mldash eda <NAME> prints the image URL",
                "Hint:".dimmed()
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// mldash health
// ---------------------------------------------------------------------------

/// Check backend reachability and show where config comes from.
pub fn run_health(config: &DashConfig) -> Result<()> {
    println!("{}", "mldash Health Check".bold().cyan());
    println!("{}", "=".repeat(50));

    // 1. Config files
    let global = config::global_config_file();
    let global_exists = global.as_ref().is_some_and(|p| p.exists());
    print_health_item(
        "Global config",
        global_exists,
        &global
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "no home directory".to_string()),
    );
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    print_health_item(
        "Project config",
        project_exists,
        if project_exists { ".mldash.toml" } else { "not found (optional)" },
    );

    // 2. Backend
    let transport = HttpTransport::from_config(&config.api);
    let healthy = transport.is_healthy();
    print_health_item(
        "Prediction backend",
        healthy,
        &format!(
            "{} ({})",
            transport.base_url(),
            if healthy { "reachable" } else { "unreachable" }
        ),
    );

    // 3. Model metadata
    if healthy {
        match api::fetch_model_info(&transport) {
            Ok(info) => {
                let features = info.feature_names.as_ref().map_or(0, Vec::len);
                print_health_item(
                    "Model",
                    true,
                    &format!("{} ({features} features)", info.model_name),
                );
            }
            Err(e) => print_health_item("Model", false, &format!("{e:#}")),
        }
    }

    // 4. Timeout
    print_health_item(
        "Request timeout",
        true,
        &match transport.timeout() {
            Some(t) => format!("{} ms", t.as_millis()),
            None => "none".to_string(),
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// mldash config show | path | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective mldash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.mldash/config.toml");
    print_source(project_exists, ".mldash.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "MLDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Print the global config file path.
pub fn run_config_path() -> Result<()> {
    let path = config::global_config_file().context("could not determine home directory")?;
    println!("{}", path.display());
    Ok(())
}

/// Initialize a default config file at `~/.mldash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point mldash at your backend.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
