//! delivery-docs: per-delivery change aggregation and DocBook release notes.

#![allow(clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use delivery_docs::{
    cli::{self, ProjectPaths, PROJECT_FILE},
    config::{self, AppConfig, Validatable},
    pipeline::{exit_codes, ComputationPlan},
    plugins::{self, PluginRegistry},
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "delivery-docs")]
#[command(version, long_about = None)]
#[command(about = "Per-delivery change aggregation and DocBook release notes")]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Some computations were rejected or stored error content
    2  A runtime failure occurred during computation
    3  Error occurred

EXAMPLES:
    # Start a project and record a delivery
    delivery-docs init product
    delivery-docs delivery add 1.0 --integrator ci

    # Describe where information comes from
    delivery-docs component add product core
    delivery-docs assign product.core commits vcs-commits .

    # Compute and export
    delivery-docs compute
    delivery-docs export -o release-notes.xml --merge")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project file
    #[arg(short, long, global = true, env = "DELIVERY_DOCS_PROJECT", default_value = PROJECT_FILE)]
    project: PathBuf,

    /// Directory strategies run in (defaults to the project file's directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty project file
    Init {
        /// Name of the root component
        name: String,

        /// Overwrite an existing project file
        #[arg(long)]
        force: bool,
    },

    /// Manage deliveries
    Delivery {
        #[command(subcommand)]
        action: DeliveryAction,
    },

    /// Manage components
    Component {
        #[command(subcommand)]
        action: ComponentAction,
    },

    /// Configure how a component obtains information for a data source
    Assign {
        /// Full component name, e.g. product.core
        component: String,

        /// Data source (version, notes, commits)
        source: String,

        /// Assignment strategy
        strategy: String,

        /// Strategy parameters
        #[arg(allow_hyphen_values = true)]
        parameters: Vec<String>,
    },

    /// Compute delivery information
    Compute {
        /// Deliveries to compute (default: the latest)
        #[arg(short, long = "delivery")]
        deliveries: Vec<String>,

        /// Data sources to compute (default: all)
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Restrict to a component subtree
        #[arg(short, long)]
        component: Option<String>,

        /// Worker threads (default: one per CPU)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Export a delivery as a DocBook document
    Export {
        /// Delivery to export (default: the latest)
        delivery: Option<String>,

        /// Output file
        #[arg(short, long, default_value = "delivery-notes.xml")]
        output: PathBuf,

        /// Extend an existing document instead of replacing it
        #[arg(long)]
        merge: bool,

        /// Only export customer-relevant components
        #[arg(long)]
        customer: bool,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// List data sources and assignment strategies
    Plugins,

    /// Print the JSON Schema of the configuration file
    ConfigSchema {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print an example configuration file
    ConfigExample {
        /// Include every option
        #[arg(long)]
        full: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum DeliveryAction {
    /// Record a delivery
    Add {
        /// Version label, e.g. 1.2.0
        id: String,

        #[arg(long)]
        integrator: Option<String>,

        /// Creation date (RFC 3339, default: now)
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    /// Remove a delivery and all information computed for it
    Remove { id: String },
    /// List deliveries oldest first
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ComponentAction {
    /// Add a component below a parent
    Add {
        /// Full name of the parent component
        parent: String,

        /// Name of the new component
        name: String,

        /// Exclude the component from customer documents
        #[arg(long)]
        internal: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let registry = plugins::global().get_or_init(PluginRegistry::with_builtins);
    let overrides = config_overrides(&cli.command);
    let (app_config, loaded_from) =
        AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
    if let Some(path) = &loaded_from {
        tracing::debug!(path = %path.display(), "Configuration loaded");
    }
    let paths = ProjectPaths::new(&cli.project, cli.root.clone());

    match cli.command {
        Commands::Init { name, force } => cli::run_init(&paths, &name, force),

        Commands::Delivery { action } => match action {
            DeliveryAction::Add {
                id,
                integrator,
                date,
            } => cli::run_delivery_add(&paths, &registry, &id, integrator, date),
            DeliveryAction::Remove { id } => cli::run_delivery_remove(&paths, &registry, &id),
            DeliveryAction::List { json } => cli::run_delivery_list(&paths, &registry, json),
        },

        Commands::Component { action } => match action {
            ComponentAction::Add {
                parent,
                name,
                internal,
            } => cli::run_component_add(&paths, &registry, &parent, &name, internal),
        },

        Commands::Assign {
            component,
            source,
            strategy,
            parameters,
        } => cli::run_assign(&paths, &registry, &component, &source, &strategy, parameters),

        Commands::Compute {
            deliveries,
            sources,
            component,
            ..
        } => {
            check_config(&app_config, &registry)?;
            let plan = ComputationPlan {
                deliveries,
                sources,
                component,
            };
            let exit_code = cli::run_compute(&paths, registry, Arc::new(app_config), plan)?;
            if exit_code != exit_codes::SUCCESS {
                std::process::exit(exit_code);
            }
            Ok(())
        }

        Commands::Export {
            delivery,
            output,
            merge,
            ..
        } => {
            check_config(&app_config, &registry)?;
            cli::run_export(&paths, &registry, &app_config, delivery.as_deref(), &output, merge)
        }

        Commands::Plugins => cli::run_plugins(&registry, &app_config),

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(())
        }

        Commands::ConfigExample { full } => {
            if full {
                print!("{}", config::generate_full_example_config());
            } else {
                print!("{}", config::generate_example_config());
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "delivery-docs", &mut io::stdout());
            Ok(())
        }
    }
}

/// Fail on an invalid configuration, listing every problem
/// Configuration values given on the command line.
fn config_overrides(command: &Commands) -> AppConfig {
    let mut builder = AppConfig::builder();
    match command {
        Commands::Compute {
            threads: Some(threads),
            ..
        } => builder = builder.threads(*threads),
        Commands::Export {
            customer, title, ..
        } => {
            builder = builder.customer_mode(*customer);
            if let Some(title) = title {
                builder = builder.title(title.as_str());
            }
        }
        _ => {}
    }
    builder.build()
}

fn check_config(config: &AppConfig, registry: &PluginRegistry) -> Result<()> {
    let mut errors = config.validate();
    errors.extend(config.validate_against(registry));
    if errors.is_empty() {
        return Ok(());
    }
    for error in &errors {
        eprintln!("config: {error}");
    }
    std::process::exit(exit_codes::ERROR);
}
