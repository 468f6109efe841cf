/// Configuration schema and defaults for mldash.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[dashboard]`, `[server]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level mldash configuration.
///
/// Maps directly to the `~/.mldash/config.toml` and `.mldash.toml` file
/// schemas. Missing sections and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Where the classification backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the prediction backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` disables the timeout, so a
    /// hung request keeps its slot in the loading state.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Controller behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of history records requested on each refresh.
    pub history_limit: u32,
    /// Path prefix under which the backend serves EDA images.
    pub eda_prefix: String,
    /// Image shown when an EDA image fails to load.
    pub fallback_image: String,
    /// Chart names offered when the backend's `/eda` catalog is unavailable.
    pub eda_images: Vec<String>,
    /// Reject non-numeric form input instead of sending NaN (`null`).
    pub reject_non_numeric: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            eda_prefix: "/eda".to_string(),
            fallback_image: "/static/images/not-found.png".to_string(),
            eda_images: vec![
                "target_distribution".to_string(),
                "correlation_matrix".to_string(),
                "feature_target_analysis".to_string(),
                "confusion_matrix".to_string(),
                "roc_curve".to_string(),
            ],
            reject_non_numeric: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Embedded web dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the dashboard binds to.
    pub bind: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:9750".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter: `"error"`, `"warn"`, `"info"`, `"debug"`,
    /// or any `EnvFilter` directive.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DashConfig {
    /// The annotated config written by `mldash config init`.
    pub fn default_toml() -> String {
        r#"# mldash Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (MLDASH_*)
#   2. Project config (.mldash.toml in current directory)
#   3. User global config (~/.mldash/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:8000"   # prediction backend
timeout_ms = 0                       # 0 = wait forever

[dashboard]
history_limit = 50
eda_prefix = "/eda"
fallback_image = "/static/images/not-found.png"
eda_images = ["target_distribution", "correlation_matrix", "feature_target_analysis", "confusion_matrix", "roc_curve"]
reject_non_numeric = false           # true = refuse to send NaN features

[server]
bind = "127.0.0.1:9750"
open_browser = true

[logging]
level = "info"                       # error | warn | info | debug | EnvFilter directive
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
