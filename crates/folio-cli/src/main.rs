use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Folio portfolio stack CLI")]
struct Cli {
    /// Stack configuration file.
    #[arg(
        short,
        long,
        global = true,
        env = "FOLIO_CONFIG",
        default_value = "folio.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the configuration and the stack built from it.
    Validate,

    /// Show resource dependencies in apply order.
    Graph {
        /// Emit Graphviz DOT instead of text.
        #[arg(long, default_value_t = false)]
        dot: bool,
    },

    /// Show what an apply would do against the saved state.
    Plan {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Apply the stack and save the resulting state.
    Apply,

    /// Print stack outputs from the saved state.
    Outputs {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Delete every resource recorded in state. Retained buckets are kept.
    Destroy {
        /// Confirm deletion.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate => commands::validate::validate(&cli.config),
        Command::Graph { dot } => commands::validate::graph(&cli.config, dot),
        Command::Plan { json } => commands::plan::plan(&cli.config, json),
        Command::Apply => commands::apply::apply(&cli.config).await,
        Command::Outputs { json } => commands::outputs::outputs(&cli.config, json),
        Command::Destroy { yes } => commands::apply::destroy(&cli.config, yes).await,
    }
}
