//! s2tiler CLI - Command-line interface
//!
//! Builds vector tiles from feature files and inspects S2 cell ids.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{cell, init, stats, tile};
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "s2tiler")]
#[command(version, about = "Vector tiles on the S2 cube, built on demand", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/s2tiler/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for the log file
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a feature file and print tiles as JSON
    Tile(tile::TileArgs),

    /// Inspect S2 cell ids
    Cell {
        #[command(subcommand)]
        action: cell::CellAction,
    },

    /// Build indexes and print tile counts per zoom
    Stats(stats::StatsArgs),

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        verbose: cli.verbose,
        log_dir: cli.log_dir,
    };

    let result = match cli.command {
        Commands::Tile(args) => tile::run(&options, args),
        Commands::Cell { action } => cell::run(action),
        Commands::Stats(args) => stats::run(&options, args),
        Commands::Init { force } => init::run(options.config.as_deref(), force),
    };

    if let Err(e) = result {
        e.exit();
    }
}
