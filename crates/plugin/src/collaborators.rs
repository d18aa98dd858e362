//! Capabilities the core consumes from its host.
//!
//! Each collaborator is a narrow trait so producers never hard-depend on a
//! concrete HTTP stack, process API or notes backend. Offline variants return
//! [`FetchError::Unavailable`]-style errors and are used when the host does
//! not provide a capability.

use std::sync::Mutex;

use async_trait::async_trait;
use runbar_api::HttpClient;
use runbar_types::Note;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Errors returned by a [`Fetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch capability unavailable")]
    Unavailable,
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Minimal request/response capability injected into plugin contexts.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and decode the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        HttpClient::get_json(self, url)
            .await
            .map_err(|error| FetchError::Request(format!("{error:#}")))
    }
}

/// Fetcher used when no network capability is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn get_json(&self, _url: &str) -> Result<Value, FetchError> {
        Err(FetchError::Unavailable)
    }
}

/// Captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("exec capability unavailable")]
    Unavailable,
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a program with arguments and captures its output.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, command: &str, args: &[String]) -> Result<ExecOutput, ExecError>;
}

/// Executor backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(&self, command: &str, args: &[String]) -> Result<ExecOutput, ExecError> {
        let output = tokio::process::Command::new(command)
            .args(args)
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                command: command.to_string(),
                source,
            })?;
        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineExecutor;

#[async_trait]
impl CommandExecutor for OfflineExecutor {
    async fn run(&self, _command: &str, _args: &[String]) -> Result<ExecOutput, ExecError> {
        Err(ExecError::Unavailable)
    }
}

/// User-facing failure callback (toast, status line, ...).
pub trait FailureReporter: Send + Sync {
    fn fail(&self, reason: &str);
}

/// Reports failures to the tracing log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFailures;

impl FailureReporter for LogFailures {
    fn fail(&self, reason: &str) {
        warn!(reason, "producer reported a failure");
    }
}

/// Keeps reported failures so hosts can drain them into their UI.
#[derive(Debug, Default)]
pub struct RecordedFailures {
    reasons: Mutex<Vec<String>>,
}

impl RecordedFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every failure reported so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.reasons.lock().expect("failure log lock poisoned"))
    }
}

impl FailureReporter for RecordedFailures {
    fn fail(&self, reason: &str) {
        warn!(reason, "producer reported a failure");
        self.reasons.lock().expect("failure log lock poisoned").push(reason.to_string());
    }
}

/// Failure raised by a local source collaborator (file search, notes listing).
#[derive(Debug, Error)]
#[error("{source_name} failed: {message}")]
pub struct SourceError {
    pub source_name: &'static str,
    pub message: String,
}

impl SourceError {
    pub fn new(source_name: &'static str, message: impl Into<String>) -> Self {
        Self {
            source_name,
            message: message.into(),
        }
    }
}

/// A filesystem or spotlight hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHit {
    pub display_name: String,
    pub path: String,
    pub content_type: Option<String>,
}

/// Filesystem/spotlight search.
#[async_trait]
pub trait FileSearch: Send + Sync {
    async fn search(&self, query: &str, extra_extensions: &[String], home_only: bool) -> Result<Vec<FileHit>, SourceError>;
}

/// Lists the user's notes.
#[async_trait]
pub trait NotesListing: Send + Sync {
    async fn list(&self) -> Result<Vec<Note>, SourceError>;
}

/// Notes listing backed by a fixed set of notes.
#[derive(Debug, Default)]
pub struct StaticNotes {
    notes: Mutex<Vec<Note>>,
}

impl StaticNotes {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes: Mutex::new(notes) }
    }

    pub fn replace(&self, notes: Vec<Note>) {
        *self.notes.lock().expect("notes lock poisoned") = notes;
    }
}

#[async_trait]
impl NotesListing for StaticNotes {
    async fn list(&self) -> Result<Vec<Note>, SourceError> {
        Ok(self.notes.lock().expect("notes lock poisoned").clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_fetcher_is_unavailable() {
        let result = OfflineFetcher.get_json("https://example.com").await;
        assert!(matches!(result, Err(FetchError::Unavailable)));
    }

    #[test]
    fn recorded_failures_drain_in_order() {
        let failures = RecordedFailures::new();
        failures.fail("first");
        failures.fail("second");
        assert_eq!(failures.take(), vec!["first", "second"]);
        assert!(failures.take().is_empty());
    }

    #[tokio::test]
    async fn process_executor_reports_spawn_errors() {
        let result = ProcessExecutor.run("runbar-definitely-missing-binary", &[]).await;
        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }
}
