//! The plugin capability contract.
//!
//! A plugin exposes up to four independent capability segments. Each segment
//! is its own trait; the plugin advertises the ones it implements through the
//! accessor methods on [`Plugin`], and callers only ever dispatch through the
//! segments that are present.

use async_trait::async_trait;
use runbar_types::{AppMode, ExecutableCommand, ValidationError};
use thiserror::Error;

use crate::collaborators::SourceError;
use crate::context::PluginContext;

/// Errors surfaced by plugin calls.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin constructed a command that violates the command invariants.
    #[error("invalid command: {0}")]
    Validation(#[from] ValidationError),
    /// The plugin could not produce a result (network, filesystem, ...).
    #[error("{message}")]
    Producer { message: String },
}

impl PluginError {
    pub fn producer(message: impl Into<String>) -> Self {
        Self::Producer { message: message.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<SourceError> for PluginError {
    fn from(error: SourceError) -> Self {
        Self::producer(error.to_string())
    }
}

/// Result of offering a command to a plugin for execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleOutcome {
    pub matched: bool,
}

impl HandleOutcome {
    pub const UNMATCHED: HandleOutcome = HandleOutcome { matched: false };
    pub const MATCHED: HandleOutcome = HandleOutcome { matched: true };
}

/// When the aggregator invokes a plugin's search results during a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// Awaited during the synchronous pass; must not perform I/O.
    Inline,
    /// Spawned on a zero-delay task after the first list is published.
    #[default]
    Deferred,
    /// Spawned after the filesystem debounce interval.
    Debounced,
}

#[async_trait]
pub trait RegisterHook: Send + Sync {
    /// One-time setup side effect.
    async fn on_register(&self, context: &PluginContext) -> Result<(), PluginError>;
}

#[async_trait]
pub trait CommandInterceptor: Send + Sync {
    async fn handle_command(&self, command: &ExecutableCommand, context: &PluginContext) -> Result<HandleOutcome, PluginError>;
}

#[async_trait]
pub trait AppModeContributor: Send + Sync {
    async fn add_app_modes(&self, context: &PluginContext) -> Result<Vec<AppMode>, PluginError>;
}

#[async_trait]
pub trait SearchResultsProvider: Send + Sync {
    async fn add_search_results(&self, query: &str, context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError>;
}

/// A pluggable producer. Every capability accessor defaults to `None`.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn dispatch(&self) -> Dispatch {
        Dispatch::Deferred
    }

    /// Modes in which the plugin's search results are requested.
    fn serves(&self, mode: &AppMode) -> bool {
        *mode == AppMode::Initial
    }

    fn register_hook(&self) -> Option<&dyn RegisterHook> {
        None
    }

    fn command_interceptor(&self) -> Option<&dyn CommandInterceptor> {
        None
    }

    fn app_mode_contributor(&self) -> Option<&dyn AppModeContributor> {
        None
    }

    fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
        None
    }
}
