use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mldash::{cli, config, web};

#[derive(Debug, Parser)]
#[command(name = "mldash")]
#[command(about = "Dashboard for an ML classification backend")]
struct App {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Override the backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the web dashboard
    Serve {
        /// Address to bind, e.g. 127.0.0.1:9750
        #[arg(long)]
        bind: Option<String>,
        /// Don't open a browser window
        #[arg(long)]
        no_open: bool,
    },
    /// Show model metadata
    Info {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Classify one feature vector
    Classify {
        /// Feature value as name=value; repeat for each feature
        #[arg(short, long = "feature", value_name = "NAME=VALUE")]
        features: Vec<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show recent classifications
    History {
        /// Number of records to fetch (default: dashboard.history_limit)
        #[arg(long)]
        limit: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Compare evaluation metrics across trained models
    Compare {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List EDA charts, or show where one is served
    Eda {
        /// Chart name, e.g. roc_curve
        name: Option<String>,
    },
    /// Check backend reachability and config sources
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the global config file path
    Path,
    /// Write a default global config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `api.base_url http://host:8000`
    Set { key: String, value: String },
    /// Reset the global config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    let loaded = config::load_reporting();
    let mut cfg = loaded.config.clone();
    if let Some(url) = app.api_url {
        cfg.api.base_url = url;
    }

    let level = if app.verbose {
        "debug"
    } else {
        cfg.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();
    loaded.log_warnings();

    match app.command {
        Commands::Serve { bind, no_open } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            if no_open {
                cfg.server.open_browser = false;
            }
            web::serve(&cfg)
        }
        Commands::Info { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_info(&cfg, fmt)
        }
        Commands::Classify { features, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_classify(&cfg, &features, fmt)
        }
        Commands::History { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&cfg, limit, fmt)
        }
        Commands::Compare { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_compare(&cfg, fmt)
        }
        Commands::Eda { name } => cli::run_eda(&cfg, name.as_deref()),
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Path => cli::run_config_path(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
