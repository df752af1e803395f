//! protoform command-line tool
//!
//! Usage:
//!   protoform merge --schema person.toml --type api.Person cached.json
//!   protoform describe --schema person.toml

use anyhow::Result;
use clap::{Parser, Subcommand};
use protoform_cli::{describe, load_pool, run_merge, MergeRequest};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "protoform")]
#[command(about = "Schema-checked message snapshots")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge JSON snapshots into an empty message and print the result
    Merge {
        /// Schema file (.toml or .json)
        #[arg(short, long)]
        schema: PathBuf,

        /// Fully qualified message type name
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Builder config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,

        /// Snapshot files, applied in order ("-" for stdin)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
    },
    /// List message types and their fields
    Describe {
        #[arg(short, long)]
        schema: PathBuf,

        /// Only describe this type
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match args.command {
        Command::Merge {
            schema,
            type_name,
            config,
            compact,
            snapshots,
        } => {
            let plain = run_merge(&MergeRequest {
                schema,
                type_name,
                config,
                snapshots,
            })?;
            if compact {
                println!("{}", serde_json::to_string(&plain)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&plain)?);
            }
        }
        Command::Describe { schema, type_name } => {
            let pool = load_pool(&schema)?;
            print!("{}", describe(&pool, type_name.as_deref())?);
        }
    }
    Ok(())
}
