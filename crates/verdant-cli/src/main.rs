//! Verdant CLI - converge clouds, clusters and charts from a secret store

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use verdant_store::{HttpStore, KvStore};

mod commands;
mod error;
mod exit_codes;

use error::CliError;

#[derive(Parser)]
#[command(name = "verdant")]
#[command(author = "Verdant Contributors")]
#[command(version)]
#[command(about = "Converge clouds, clusters and charts from a secret store", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Simulate: plan and probe, never change anything
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Cloud operations
    Cloud {
        #[command(subcommand)]
        command: CloudCommands,
    },

    /// Cluster operations
    Cluster {
        #[command(subcommand)]
        command: ClusterCommands,
    },

    /// Chart operations
    Charts {
        #[command(subcommand)]
        command: ChartCommands,
    },
}

#[derive(Subcommand)]
enum CloudCommands {
    /// List clouds in the store
    List {
        /// Only clouds subscribed to this branch
        #[arg(long)]
        branch: Option<String>,
    },

    /// Converge one cloud toward its declared state
    Converge {
        /// Cloud name
        name: String,

        /// Directory holding the declarative cloud templates
        #[arg(long, default_value = "../terraform")]
        terraform_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ClusterCommands {
    /// List clusters in the store
    List {
        /// Only clusters on this cloud
        #[arg(long)]
        cloud: Option<String>,

        /// Only clusters subscribed to this chart branch
        #[arg(long)]
        branch: Option<String>,
    },

    /// Converge one cluster (credentials and deployment controller)
    Converge {
        /// Cluster name
        name: String,

        /// Converge the backing cloud first
        #[arg(long)]
        converge_cloud: bool,

        /// Directory holding the declarative cloud templates
        #[arg(long, default_value = "../terraform")]
        terraform_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ChartCommands {
    /// List the charts that apply to a cluster
    List {
        /// Cluster name
        #[arg(long)]
        cluster: String,

        /// Root of the chart source tree
        #[arg(long, default_value = ".")]
        charts_dir: PathBuf,

        /// Namespaces to include (default: all)
        #[arg(long)]
        namespaces: Vec<String>,
    },

    /// Converge a cluster's charts (and optionally its cloud and cluster)
    Converge {
        /// Cluster name
        #[arg(long)]
        cluster: String,

        /// Namespaces to deploy (default: all)
        #[arg(long)]
        namespaces: Vec<String>,

        /// Root of the chart source tree
        #[arg(long, default_value = ".")]
        charts_dir: PathBuf,

        /// Directory holding the declarative cloud templates
        #[arg(long, default_value = "../terraform")]
        terraform_dir: PathBuf,

        /// Converge the backing cloud first
        #[arg(long)]
        converge_cloud: bool,

        /// Converge the cluster before deploying
        #[arg(long)]
        converge_cluster: bool,

        /// Converge local tooling afterwards
        #[arg(long)]
        converge_localmachine: bool,
    },
}

fn main() {
    miette::set_panic_hook();
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(err) = dispatch(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "verdant=info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn store() -> Result<Arc<dyn KvStore>, CliError> {
    Ok(Arc::new(HttpStore::from_env()?))
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let dry_run = cli.dry_run;
    match cli.command {
        Commands::Cloud { command } => match command {
            CloudCommands::List { branch } => commands::cloud::list(store()?, branch),
            CloudCommands::Converge {
                name,
                terraform_dir,
            } => commands::cloud::converge(store()?.as_ref(), &name, &terraform_dir, dry_run),
        },

        Commands::Cluster { command } => match command {
            ClusterCommands::List { cloud, branch } => {
                commands::cluster::list(store()?, cloud, branch)
            }
            ClusterCommands::Converge {
                name,
                converge_cloud,
                terraform_dir,
            } => commands::cluster::converge(
                store()?.as_ref(),
                &name,
                converge_cloud,
                &terraform_dir,
                dry_run,
            ),
        },

        Commands::Charts { command } => match command {
            ChartCommands::List {
                cluster,
                charts_dir,
                namespaces,
            } => commands::charts::list(store()?.as_ref(), &cluster, &charts_dir, &namespaces),
            ChartCommands::Converge {
                cluster,
                namespaces,
                charts_dir,
                terraform_dir,
                converge_cloud,
                converge_cluster,
                converge_localmachine,
            } => commands::charts::converge(
                store()?.as_ref(),
                &cluster,
                commands::charts::ConvergeArgs {
                    namespaces,
                    charts_dir,
                    terraform_dir,
                    converge_cloud,
                    converge_cluster,
                    converge_localmachine,
                    dry_run,
                },
            ),
        },
    }
}
