// src/sources.rs
//! Immutable source registry: the mapping from source id to its fetch
//! invocation. Built once from config at startup and passed by reference to
//! the scheduler, fetch runner, and sweeper; no mutation after construction.

use crate::config::SourceConfig;

/// One external news origin: a stable key plus the command that fetches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: String,
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn from_config(sources: &[SourceConfig]) -> Self {
        let sources = sources
            .iter()
            .map(|s| SourceDescriptor {
                id: s.id.clone(),
                command: s.command.clone(),
                args: s.args.clone(),
            })
            .collect();
        Self { sources }
    }

    pub fn get(&self, id: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Iteration order is config order; ingestion and retention cycles walk
    /// sources in this order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
