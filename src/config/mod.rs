/// Configuration system for mldash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::DashConfig::default()`]
/// 2. **User global config**: `~/.mldash/config.toml`
/// 3. **Project local config**: `.mldash.toml` in the current working directory
/// 4. **Environment variables**: `MLDASH_*` overrides (highest precedence)
///
/// Later layers override earlier ones at the key level: each file is merged
/// into the accumulated TOML tree before the result is deserialized, so a
/// file that only sets `dashboard.history_limit` leaves every other key
/// untouched.
///
/// # Usage
///
/// ```rust,ignore
/// use mldash::config;
///
/// let cfg = config::load();
/// println!("backend at {}", cfg.api.base_url);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// A resolved configuration plus the problems met while resolving it.
///
/// Config is read before logging is set up, so problems are collected here
/// and logged by the caller once a subscriber exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub config: DashConfig,
    pub warnings: Vec<String>,
}

impl Loaded {
    /// Emit every collected warning through `tracing`.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{warning}");
        }
    }
}

/// Load the fully resolved mldash configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Problems are logged immediately.
pub fn load() -> DashConfig {
    let loaded = load_reporting();
    loaded.log_warnings();
    loaded.config
}

/// Like [`load`], but returns problems instead of logging them.
pub fn load_reporting() -> Loaded {
    let layers = [global_config_path(), project_config_path()];
    let mut loaded = load_layers_reporting(layers.iter().flatten().map(PathBuf::as_path));
    apply_env_overrides(&mut loaded.config);
    loaded
}

/// Merge the given TOML files over the built-in defaults, logging problems.
pub fn load_layers<'a>(paths: impl IntoIterator<Item = &'a Path>) -> DashConfig {
    let loaded = load_layers_reporting(paths);
    loaded.log_warnings();
    loaded.config
}

/// Merge the given TOML files over the built-in defaults.
///
/// Missing files are skipped. Malformed files are skipped with a warning so
/// a bad project file never stops the dashboard from starting.
pub fn load_layers_reporting<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Loaded {
    let mut warnings = Vec::new();
    let mut merged = match toml::Value::try_from(DashConfig::default()) {
        Ok(value) => value,
        Err(e) => {
            warnings.push(format!("could not encode default config: {e}"));
            return Loaded {
                config: DashConfig::default(),
                warnings,
            };
        }
    };

    for path in paths {
        match load_toml_file(path) {
            Ok(Some(layer)) => merge_toml(&mut merged, layer),
            Ok(None) => {}
            Err(e) => warnings.push(format!(
                "ignoring malformed config file {}: {e}",
                path.display()
            )),
        }
    }

    let config = match merged.try_into() {
        Ok(config) => config,
        Err(e) => {
            warnings.push(format!("merged config has invalid values, using defaults: {e}"));
            DashConfig::default()
        }
    };
    Loaded { config, warnings }
}

/// Read a TOML file into an untyped value tree. `Ok(None)` if it is absent.
fn load_toml_file(path: &Path) -> Result<Option<toml::Value>, toml::de::Error> {
    let Ok(content) = fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str(&content).map(Some)
}

/// Deep-merge `overlay` into `base`. Tables merge key by key; any other
/// value in the overlay replaces the base value.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.mldash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mldash").join("config.toml"))
}

/// Path to the project local config: `.mldash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".mldash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `MLDASH_API_URL`: backend base URL
/// - `MLDASH_TIMEOUT_MS`: request timeout, `0` for none
/// - `MLDASH_HISTORY_LIMIT`: history rows per refresh
/// - `MLDASH_REJECT_NON_NUMERIC`: refuse NaN features (`1`/`true`)
/// - `MLDASH_BIND`: web dashboard bind address
/// - `MLDASH_LOG`: tracing filter
fn apply_env_overrides(config: &mut DashConfig) {
    if let Ok(val) = std::env::var("MLDASH_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("MLDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("MLDASH_HISTORY_LIMIT")
        && let Ok(limit) = val.parse::<u32>()
    {
        config.dashboard.history_limit = limit;
    }
    if let Ok(val) = std::env::var("MLDASH_REJECT_NON_NUMERIC") {
        config.dashboard.reject_non_numeric = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("MLDASH_BIND")
        && !val.is_empty()
    {
        config.server.bind = val;
    }
    if let Ok(val) = std::env::var("MLDASH_LOG")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.mldash/config.toml`.
///
/// Creates the `~/.mldash/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.mldash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `api.base_url`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Refuse to write a file that would no longer deserialize.
    let _: DashConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw_value
                .split(',')
                .map(|s| toml::Value::String(s.trim().to_string()))
                .collect(),
        ),
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
