// src/config.rs
// =============================================================================
// Turns parsed CLI flags into the settings the pipeline runs with.
//
// Cli is what the user typed; RunConfig is what the program needs. Keeping
// them apart lets tests build a RunConfig without going through clap.
// =============================================================================

use crate::cli::Cli;
use crate::extract::LinkFilter;
use crate::fetch::FetchConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url: Option<String>,
    pub list: Option<PathBuf>,
    pub output: PathBuf,
    pub js_only: bool,
    pub concurrency: usize,
    pub fetch: FetchConfig,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let mut fetch = FetchConfig::default();
        if cli.no_accept {
            fetch.accept = None;
        }

        Self {
            url: cli.url.clone(),
            list: cli.list.clone(),
            output: cli.output.clone(),
            js_only: cli.js_only,
            concurrency: cli.concurrency,
            fetch,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than 0");
        }
        if self.output.as_os_str().is_empty() {
            anyhow::bail!("output file must not be empty");
        }
        Ok(())
    }

    pub fn link_filter(&self) -> LinkFilter {
        LinkFilter::new(self.js_only)
    }
}
