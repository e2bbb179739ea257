//! Stats command - build indexes and report tile counts.

use clap::Args;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

use s2tiler::IndexStats;

use super::common::{write_output, IndexOverrides};
use crate::error::CliError;
use crate::runner::{build_index, CliRunner, GlobalOptions};

/// Arguments for the stats command.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Feature files; each is indexed independently
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub index: IndexOverrides,
}

/// Run the stats command.
///
/// Inputs are indexed in parallel. Every input is reported; the first
/// failure, if any, becomes the command's error.
pub fn run(options: &GlobalOptions, args: StatsArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("stats");

    let config = args.index.apply(runner.config().index.clone());
    let results: Vec<(PathBuf, Result<IndexStats, CliError>)> = args
        .inputs
        .par_iter()
        .map(|input| {
            let stats = build_index(input, config.clone()).map(|index| index.stats());
            (input.clone(), stats)
        })
        .collect();

    let mut succeeded = Vec::new();
    let mut first_error = None;
    for (input, result) in results {
        match result {
            Ok(stats) => succeeded.push((input, stats)),
            Err(e) => {
                eprintln!("Error: {}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    let content = if args.json {
        let by_input: BTreeMap<String, &IndexStats> = succeeded
            .iter()
            .map(|(input, stats)| (input.display().to_string(), stats))
            .collect();
        format!("{}\n", serde_json::to_string_pretty(&by_input)?)
    } else {
        format_table(&succeeded)
    };
    write_output(None, &content)?;

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn format_table(results: &[(PathBuf, IndexStats)]) -> String {
    let mut out = String::new();
    for (input, stats) in results {
        // writing to a String cannot fail
        let _ = writeln!(out, "{}", input.display());
        let _ = writeln!(
            out,
            "  tiles: {}  points: {}  retaining source: {}",
            stats.total_tiles, stats.total_points, stats.retained_sources
        );
        for (zoom, count) in &stats.tiles_per_zoom {
            let _ = writeln!(out, "  z{:<3} {:>8}", zoom, count);
        }
    }
    out
}
