use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::reconcile::{run_reconcile, run_schema_hash, ReconcileArgs};

#[derive(Parser)]
#[command(name = "ncr")]
#[command(about = "Nested-collection reconciliation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one resource and print the response JSON
    Reconcile {
        /// Schema definition YAML paths in merge order
        #[arg(long = "schemas", required = true)]
        schema_paths: Vec<String>,

        /// Resource type to reconcile (e.g. example_router)
        #[arg(long = "type")]
        resource_type: String,

        /// Prior state JSON (omit for a resource never reconciled)
        #[arg(long)]
        prior: Option<String>,

        /// Desired config JSON
        #[arg(long)]
        config: String,

        /// Engine policy YAML paths in merge order
        #[arg(long = "policy")]
        policy_paths: Vec<String>,

        /// Fail (instead of warn) on policy keys the engine does not read
        #[arg(long, default_value_t = false)]
        strict_policy_keys: bool,
    },

    /// Validate layered schema definitions, print hash + canonical JSON
    SchemaHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Dev-only: missing file is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reconcile {
            schema_paths,
            resource_type,
            prior,
            config,
            policy_paths,
            strict_policy_keys,
        } => run_reconcile(&ReconcileArgs {
            schema_paths: &schema_paths,
            resource_type: &resource_type,
            prior_path: prior.as_deref(),
            config_path: &config,
            policy_paths: &policy_paths,
            strict_policy_keys,
        }),

        Commands::SchemaHash { paths } => run_schema_hash(&paths),
    }
}

/// Logs go to stderr; stdout carries only command output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
