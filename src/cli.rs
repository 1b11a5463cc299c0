// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The flags mirror the classic recon-tool layout: short single-letter flags
// for the common options, long flags for the rest.
//
//   linkscope -u example.com
//   linkscope -l targets.txt -o links.txt -j
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "linkscope",
    version,
    about = "Extract in-scope links and script references from web pages",
    long_about = "linkscope fetches one or more pages, pulls every <a href>, <script src> and \
                  <link href/src> out of the HTML, keeps the ones on the target's domain or its \
                  subdomains, and appends them to an output file."
)]
pub struct Cli {
    /// Single URL to fetch
    #[arg(short = 'u', value_name = "URL")]
    pub url: Option<String>,

    /// Text file containing a list of URLs, one per line
    #[arg(short = 'l', value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Output file for extracted URLs (appended to, never truncated)
    #[arg(short = 'o', value_name = "FILE", default_value = "extracted.txt")]
    pub output: PathBuf,

    /// Extract only links on the same domain as the target (always enforced)
    #[arg(short = 'd')]
    pub same_domain: bool,

    /// Extract only .js files
    #[arg(short = 'j')]
    pub js_only: bool,

    /// Do not send the Accept header
    #[arg(long = "no-accept")]
    pub no_accept: bool,

    /// Number of targets fetched at the same time
    #[arg(short = 'c', long, default_value_t = 1)]
    pub concurrency: usize,

    /// Log every rejected link (debug level)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn has_targets(&self) -> bool {
        self.url.is_some() || self.list.is_some()
    }
}
