// src/ingest/types.rs
use serde::Deserialize;

use crate::sources::SourceDescriptor;

/// Article as emitted by a fetch process: a single JSON array of these on
/// stdout. Only `title` and `link` are mandatory downstream; everything else
/// is optional and unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RawArticle {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    /// ISO-8601-parseable string, or absent for "unknown".
    pub published_at: Option<String>,
    pub author: Option<String>,
}

impl RawArticle {
    /// Scrapers emit `summary` or `description` interchangeably; `summary`
    /// wins when both are present.
    pub fn description(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .or(self.description.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Outcome counts of merging one batch into one source's store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub new: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl MergeReport {
    pub fn total(&self) -> usize {
        self.new + self.updated + self.skipped
    }
}

/// Why one source's fetch produced no batch. Fatal to that source's cycle
/// iteration only; the cycle carries on with the next source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The fetch process could not be started at all.
    #[error("failed to spawn fetch process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The fetch process exceeded the configured time bound and was killed.
    #[error("fetch process timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The fetch process signaled failure; stdout is not parsed in this case.
    #[error("fetch process exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// Exit status was zero but stdout was not a JSON article array.
    #[error("fetch output is not a JSON article array: {excerpt}")]
    MalformedOutput { excerpt: String },
}

/// Capability interface over "run one fetch for this source". The child
/// process mechanics live in an adapter so the pipeline stays testable with
/// an in-memory fake.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<RawArticle>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_article_accepts_wire_keys_and_ignores_extras() {
        let json = r#"{
            "title": "T",
            "link": "http://x/1",
            "summary": "S",
            "imageUrl": "http://x/img.png",
            "publishedAt": "2025-06-01T10:00:00Z",
            "scraperVersion": 3
        }"#;
        let a: RawArticle = serde_json::from_str(json).unwrap();
        assert_eq!(a.title.as_deref(), Some("T"));
        assert_eq!(a.image_url.as_deref(), Some("http://x/img.png"));
        assert_eq!(a.published_at.as_deref(), Some("2025-06-01T10:00:00Z"));
        assert_eq!(a.author, None);
    }

    #[test]
    fn summary_wins_over_description() {
        let a: RawArticle =
            serde_json::from_str(r#"{"summary": "s", "description": "d"}"#).unwrap();
        assert_eq!(a.description(), Some("s"));
        let b: RawArticle = serde_json::from_str(r#"{"description": "d"}"#).unwrap();
        assert_eq!(b.description(), Some("d"));
    }
}
