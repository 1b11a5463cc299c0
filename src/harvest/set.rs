// src/harvest/set.rs
// =============================================================================
// The run-wide set of extracted links.
//
// One ExtractionSet lives for the whole run. Every target feeds into it, so a
// link found on three pages is reported and written once. Nothing is ever
// removed; at the end of the run the set is drained into the output file.
// =============================================================================

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ExtractionSet {
    links: HashSet<String>,
}

impl ExtractionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `link`. Returns true only the first time a link is seen.
    pub fn insert(&mut self, link: &str) -> bool {
        if self.links.contains(link) {
            return false;
        }
        self.links.insert(link.to_string())
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Consumes the set. Sorted so repeated runs write comparable files.
    pub fn drain(self) -> Vec<String> {
        let mut links: Vec<String> = self.links.into_iter().collect();
        links.sort();
        links
    }
}
