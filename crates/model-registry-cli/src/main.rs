//! `mrctl` - Model Registry and Model Catalog command-line client

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use model_registry_core::{CatalogOrderBy, OrderBy, PreviewFilter, SortOrder};

#[derive(Parser, Debug)]
#[command(name = "mrctl", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model Registry base URL
    #[arg(long, env = "MODEL_REGISTRY_URL", global = true)]
    pub registry_url: Option<String>,

    /// Model Catalog base URL
    #[arg(long, env = "CATALOG_URL", global = true)]
    pub catalog_url: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll a service until it answers
    WaitReady(WaitReadyArgs),

    /// Browse the model catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Registered models and versions
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },

    /// Experiments and runs
    Experiments {
        #[command(subcommand)]
        command: ExperimentCommands,
    },
}

#[derive(Args, Debug)]
pub struct WaitReadyArgs {
    /// URL to probe; defaults to the catalog base URL
    pub url: Option<String>,

    /// Exact status to wait for instead of any non-5xx
    #[arg(long)]
    pub expected_status: Option<u16>,

    /// Overall timeout in seconds (overrides CATALOG_POLL_TIMEOUT)
    #[arg(long)]
    pub timeout: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List catalog sources
    Sources {
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Search catalog models
    Models(CatalogModelsArgs),

    /// Show one model
    Model { source: String, name: String },

    /// List artifacts of one model
    Artifacts {
        source: String,
        name: String,

        /// Raw filterQuery expression
        #[arg(long)]
        filter: Option<String>,

        #[arg(long = "type")]
        artifact_type: Option<String>,
    },

    /// Show filterable fields
    FilterOptions,

    /// Evaluate a source config file (JSON) without saving it
    Preview {
        config_file: PathBuf,

        #[arg(long)]
        filter_status: Option<PreviewFilter>,

        #[arg(long)]
        page_size: Option<u32>,
    },
}

#[derive(Args, Debug)]
pub struct CatalogModelsArgs {
    /// Free-text search
    #[arg(short, long)]
    pub query: Option<String>,

    #[arg(long)]
    pub source: Option<String>,

    /// NAME, ACCURACY, CREATE_TIME or LAST_UPDATE_TIME
    #[arg(long)]
    pub order_by: Option<CatalogOrderBy>,

    #[arg(long, default_value = "ASC")]
    pub sort_order: SortOrder,

    /// Raw filterQuery expression
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub page_size: Option<u32>,

    /// Follow every page
    #[arg(long)]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum RegistryCommands {
    /// List registered models
    Models {
        #[arg(long)]
        filter: Option<String>,

        /// ID, NAME, CREATE_TIME or LAST_UPDATE_TIME
        #[arg(long)]
        order_by: Option<OrderBy>,

        #[arg(long, default_value = "ASC")]
        sort_order: SortOrder,

        #[arg(long)]
        page_size: Option<u32>,

        #[arg(long)]
        all: bool,
    },

    /// List versions of a registered model
    Versions {
        model_id: String,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Register a model, version and artifact (idempotent)
    Register(RegisterArgs),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long, env = "MODEL_SYNC_MODEL_NAME")]
    pub model_name: String,

    #[arg(long, env = "MODEL_SYNC_MODEL_VERSION")]
    pub version: String,

    /// Artifact URI
    #[arg(long, env = "MODEL_SYNC_DESTINATION_URI")]
    pub uri: String,

    #[arg(long, env = "MODEL_SYNC_MODEL_FORMAT_NAME")]
    pub format_name: Option<String>,

    #[arg(long, env = "MODEL_SYNC_MODEL_FORMAT_VERSION")]
    pub format_version: Option<String>,

    /// Existing registered model to attach to
    #[arg(long, env = "MODEL_SYNC_MODEL_ID")]
    pub model_id: Option<String>,

    /// Existing version to attach to
    #[arg(long, env = "MODEL_SYNC_MODEL_VERSION_ID")]
    pub version_id: Option<String>,

    /// Existing artifact to update in place
    #[arg(long, env = "MODEL_SYNC_MODEL_ARTIFACT_ID")]
    pub artifact_id: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ExperimentCommands {
    /// List experiments
    List {
        #[arg(long, value_enum, default_value_t = View::Active)]
        view: View,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// List runs of an experiment
    Runs {
        experiment_id: String,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Every recorded value of a metric
    MetricHistory { run_id: String, metric: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Active,
    Deleted,
    All,
}

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads env-backed flags
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let pretty = cli.pretty;

    let result = match commands::Context::from_env(&cli) {
        Ok(ctx) => ctx.run(cli.command).await,
        Err(e) => Err(e),
    };

    let output = result.and_then(|value| {
        if pretty {
            Ok(serde_json::to_string_pretty(&value)?)
        } else {
            Ok(serde_json::to_string(&value)?)
        }
    });

    match output {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
