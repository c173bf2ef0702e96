//! Shared test utilities for integration tests.
//!
//! Provides an in-memory probe that records every path it is asked for,
//! standing in for a vendor client.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use forgeview::{Candidate, LinkRewriteContext, Probe};
use std::cell::RefCell;
use std::collections::HashMap;

/// Probe serving fixed files and logging each request in order.
pub struct RecordingProbe {
    files: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl RecordingProbe {
    /// Creates probe serving `files` as (path, text) pairs.
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, text)| (path.to_string(), text.to_string()))
                .collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Paths probed so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Probe for RecordingProbe {
    fn probe(&self, path: &str) -> Result<String> {
        self.calls.borrow_mut().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {path}"))
    }
}

/// Link context for `acme/widgets` on GitHub at `main`.
pub fn github_context() -> LinkRewriteContext {
    LinkRewriteContext::new("https://github.com", "acme/widgets", "main")
}

/// Builds candidates from textual (path, format) pairs.
///
/// # Panics
///
/// Panics on invalid entries; fixtures are expected to be valid.
pub fn candidates(entries: &[(&str, &str)]) -> Vec<Candidate> {
    entries
        .iter()
        .map(|(path, format)| Candidate::parse(path, format).expect("Fixture candidate should be valid"))
        .collect()
}
