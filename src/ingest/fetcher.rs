// src/ingest/fetcher.rs
//! Child-process fetch runner: spawns a source's fetch program, drains its
//! output streams, and maps the outcome to a batch or a typed failure.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::ingest::types::{FetchError, Fetcher, RawArticle};
use crate::sources::SourceDescriptor;

/// How much stderr/stdout context travels inside a failure. Matches the
/// diagnostic excerpt the service has always logged.
const EXCERPT_LEN: usize = 500;

pub struct ProcessFetcher {
    timeout: Duration,
}

impl ProcessFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl Fetcher for ProcessFetcher {
    /// Run one fetch process to completion.
    ///
    /// Exactly one of batch/failure per invocation: a non-zero exit is never
    /// parsed, and a hung process is killed once the timeout expires.
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<RawArticle>, FetchError> {
        debug!(source = %source.id, command = %source.command, "spawning fetch process");

        let child = Command::new(&source.command)
            .args(&source.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(FetchError::Spawn)?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(FetchError::Spawn(e)),
            // Dropping the in-flight future kills the child (kill_on_drop).
            Err(_) => {
                return Err(FetchError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            return Err(FetchError::NonZeroExit {
                code: output.status.code(),
                stderr: excerpt(&output.stderr),
            });
        }

        serde_json::from_slice::<Vec<RawArticle>>(&output.stdout).map_err(|_| {
            FetchError::MalformedOutput {
                excerpt: excerpt(&output.stdout),
            }
        })
    }
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    text.chars().take(EXCERPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_source(id: &str, script: &str) -> SourceDescriptor {
        SourceDescriptor {
            id: id.to_string(),
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    fn fetcher() -> ProcessFetcher {
        ProcessFetcher::new(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn clean_exit_with_array_yields_batch() {
        let src = shell_source(
            "ok",
            r#"echo '[{"title":"A","link":"http://x/1","summary":"s"}]'"#,
        );
        let batch = fetcher().fetch(&src).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr_and_skips_parsing() {
        let src = shell_source("bad", r#"echo '[]'; echo 'driver crashed' >&2; exit 1"#);
        let err = fetcher().fetch(&src).await.unwrap_err();
        match err {
            FetchError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("driver crashed"));
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_stdout_is_malformed_output() {
        let src = shell_source("garbage", "echo 'not json'");
        let err = fetcher().fetch(&src).await.unwrap_err();
        match err {
            FetchError::MalformedOutput { excerpt } => assert!(excerpt.contains("not json")),
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn json_object_instead_of_array_is_malformed_output() {
        let src = shell_source("object", r#"echo '{"title":"A"}'"#);
        let err = fetcher().fetch(&src).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn missing_executable_is_spawn_failure() {
        let src = SourceDescriptor {
            id: "ghost".to_string(),
            command: "/nonexistent/fetcher-binary".to_string(),
            args: vec![],
        };
        let err = fetcher().fetch(&src).await.unwrap_err();
        assert!(matches!(err, FetchError::Spawn(_)));
    }

    #[tokio::test]
    async fn hung_process_times_out() {
        let src = shell_source("slow", "sleep 30");
        let err = ProcessFetcher::new(Duration::from_millis(200))
            .fetch(&src)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }
}
