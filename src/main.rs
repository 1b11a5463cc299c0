// src/main.rs
// =============================================================================
// This is the entry point of linkscope.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Collect the targets from -u and -l
// 3. Run fetch -> extract -> filter -> dedup over all targets
// 4. Append the results to the output file and print a summary
// 5. Exit with a proper code:
//      0 = run finished (even if every target failed or the output file
//          could not be written; that is reported on stderr)
//      1 = no target given, unreadable list file or invalid settings
// =============================================================================

mod cli;
mod config;
mod extract;
mod fetch;
mod harvest;
mod output;
mod targets;
mod telemetry;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::Cli;
use config::RunConfig;
use fetch::Fetcher;
use harvest::{ExtractionSet, Runner};
use std::path::Path;
use tracing::{debug, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    std::process::exit(exit_code(run(cli).await));
}

fn exit_code(outcome: Result<i32>) -> i32 {
    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    if !cli.has_targets() {
        Cli::command().print_help()?;
        println!();
        return Ok(1);
    }

    let config = RunConfig::from_cli(&cli);
    config.validate()?;

    if cli.same_domain {
        debug!("-d given; the same-domain rule is always applied");
    }

    let targets = targets::collect_targets(config.url.as_deref(), config.list.as_deref())?;
    info!(targets = targets.len(), js_only = config.js_only, "starting");

    let fetcher = Fetcher::new(&config.fetch)?;
    let runner = Runner::new(fetcher, config.link_filter(), config.concurrency);
    let extracted = runner.run(targets).await;

    write_results(extracted, &config.output);
    Ok(0)
}

/// Appends the run's links to `output` and prints the summary. A write
/// failure is reported but does not change the outcome of the run.
fn write_results(extracted: ExtractionSet, output: &Path) {
    if extracted.is_empty() {
        println!("No URLs extracted. Either no links were found or the filters were too restrictive.");
        return;
    }

    let count = extracted.len();
    match output::append_links(output, &extracted.drain()) {
        Ok(()) => println!(
            "--- [OUTPUT] {} extracted URL(s) written to {} ---",
            count,
            output.display()
        ),
        Err(e) => eprintln!("Error: {:#}", e),
    }
}
