// src/extract/mod.rs
// =============================================================================
// Link extraction: from an HTML body to the absolute URLs we keep.
//
// Submodules:
// - html: streams the body through a tokenizer and yields raw href/src values
// - scope: resolves raw values against the target and applies the filters
// =============================================================================

mod html;
mod scope;

pub use html::extract_links;
pub use scope::LinkFilter;
