// src/output.rs
// =============================================================================
// Writes extracted links to the output file.
//
// The file is opened in append mode: running the tool twice against the same
// file accumulates results instead of overwriting them.
// =============================================================================

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends one link per line, each terminated by '\n'.
pub fn append_links(path: &Path, links: &[String]) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open output file '{}'", path.display()))?;

    let mut writer = BufWriter::new(file);
    for link in links {
        writeln!(writer, "{}", link)
            .with_context(|| format!("failed to write to '{}'", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush '{}'", path.display()))?;

    Ok(())
}
