//! adaptest CLI: item bank tooling and adaptive test simulation.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Computerized adaptive testing engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an adaptive test against an item bank
    Simulate {
        /// Path to the item bank .toml file
        #[arg(long)]
        bank: PathBuf,

        /// True ability of the simulated learner
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        theta: f64,

        /// Random seed for the simulated learner
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Override the minimum number of items
        #[arg(long)]
        min_items: Option<usize>,

        /// Override the maximum number of items
        #[arg(long)]
        max_items: Option<usize>,

        /// Override the target standard error
        #[arg(long)]
        target_precision: Option<f64>,

        /// Output directory for the JSON simulation report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Summarize a saved simulation report
    Inspect {
        /// Simulation report JSON
        #[arg(long)]
        report: PathBuf,
    },

    /// Validate item bank TOML files
    Validate {
        /// Path to item bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create starter config and example item bank
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("adaptest=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            bank,
            theta,
            seed,
            min_items,
            max_items,
            target_precision,
            output,
            format,
            config,
        } => commands::simulate::execute(commands::simulate::SimulateArgs {
            bank,
            theta,
            seed,
            min_items,
            max_items,
            target_precision,
            output,
            format,
            config,
        }),
        Commands::Inspect { report } => commands::inspect::execute(report),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
