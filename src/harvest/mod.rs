// src/harvest/mod.rs
// =============================================================================
// Runs the whole pipeline over every target and collects the results.
//
// Submodules:
// - runner: fetch -> extract -> filter for each target
// - set: the deduplicating set shared by all targets
// =============================================================================

mod runner;
mod set;

pub use runner::Runner;
pub use set::ExtractionSet;
