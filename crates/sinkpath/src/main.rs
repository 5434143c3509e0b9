//! Sinkpath command line
//!
//! Resolves where file output steps write, and inspects the cluster
//! registry they resolve against.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sinkpath_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "sinkpath", about = "Resolve output locations of file output steps")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.sinkpath/config.toml)
    #[arg(long, global = true, env = "SINKPATH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the URL a step writes to
    Resolve {
        /// Step definition file
        step: PathBuf,

        /// Resolve without the cluster registry, through the embedded copy
        #[arg(long)]
        offline: bool,

        /// Extra variable for `${NAME}` expansion (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = cli::context::parse_var)]
        vars: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the embedded XML fragment for a registered cluster
    Embed {
        /// Registered cluster name
        name: String,
    },

    /// List registered clusters
    Clusters,

    /// Re-save a step, refreshing its embedded cluster copy
    Save {
        /// Step definition file
        step: PathBuf,

        /// Write back to the step file instead of stdout
        #[arg(long)]
        in_place: bool,
    },
}

fn run_command(cli: Cli) -> Result<()> {
    let ctx = cli::context::CliContext::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Resolve {
            step,
            offline,
            vars,
            json,
        } => cli::resolve::run(
            &ctx,
            cli::resolve::ResolveArgs {
                step,
                offline,
                vars,
                json,
            },
        ),
        Commands::Embed { name } => cli::cluster::run_embed(&ctx, &name),
        Commands::Clusters => cli::cluster::run_list(&ctx),
        Commands::Save { step, in_place } => {
            cli::save::run(&ctx, cli::save::SaveArgs { step, in_place })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "sinkpath",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<cli::error::HelpfulError>() {
                Some(helpful) => eprint!("{}", helpful),
                None => eprintln!("{:?}", err),
            }
            ExitCode::from(1)
        }
    }
}
