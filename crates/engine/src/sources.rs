//! Local sources consumed by the aggregator: installed apps, OS shortcuts and
//! clipboard snapshots.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use runbar_plugin::{CommandExecutor, SourceError};
use runbar_types::{AppMode, CommandHandler, CommandMetadata, ExecutableCommand, Priority, ValidationError};

/// An installed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub name: String,
    pub path: String,
}

impl AppEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Display name without a trailing `.app` bundle suffix.
    pub fn display_name(&self) -> &str {
        self.name.strip_suffix(".app").unwrap_or(&self.name)
    }

    pub fn to_command(&self) -> Result<ExecutableCommand, ValidationError> {
        ExecutableCommand::builder(self.display_name(), self.path.clone(), CommandHandler::App)
            .metadata(CommandMetadata::with_path(self.path.clone()))
            .priority(Priority::MEDIUM)
            .build()
    }
}

/// Installed-application lookup.
#[async_trait]
pub trait AppIndex: Send + Sync {
    async fn find(&self) -> Result<Vec<AppEntry>, SourceError>;
}

/// App index over a fixed list.
#[derive(Debug, Default)]
pub struct StaticApps {
    apps: Mutex<Vec<AppEntry>>,
}

impl StaticApps {
    pub fn new(apps: Vec<AppEntry>) -> Self {
        Self { apps: Mutex::new(apps) }
    }

    pub fn replace(&self, apps: Vec<AppEntry>) {
        *self.apps.lock().expect("apps lock poisoned") = apps;
    }
}

#[async_trait]
impl AppIndex for StaticApps {
    async fn find(&self) -> Result<Vec<AppEntry>, SourceError> {
        Ok(self.apps.lock().expect("apps lock poisoned").clone())
    }
}

/// OS automation shortcuts.
#[async_trait]
pub trait ShortcutSource: Send + Sync {
    async fn list(&self) -> Result<Vec<String>, SourceError>;
}

/// Lists shortcuts with `shortcuts list`, one name per line.
pub struct ExecShortcuts {
    executor: Arc<dyn CommandExecutor>,
}

impl ExecShortcuts {
    pub const PROGRAM: &'static str = "shortcuts";

    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ShortcutSource for ExecShortcuts {
    async fn list(&self) -> Result<Vec<String>, SourceError> {
        let output = self
            .executor
            .run(Self::PROGRAM, &["list".to_string()])
            .await
            .map_err(|error| SourceError::new("shortcuts", error.to_string()))?;
        if !output.success() {
            return Err(SourceError::new(
                "shortcuts",
                format!("exited with {}: {}", output.exit_code, output.stderr.trim()),
            ));
        }
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

pub fn shortcut_command(name: &str) -> Result<ExecutableCommand, ValidationError> {
    ExecutableCommand::builder(name, name, CommandHandler::RunShortcut).build()
}

/// Text snapshots captured from the system clipboard, oldest first.
pub trait ClipboardHistory: Send + Sync {
    fn snapshots(&self) -> Vec<String>;

    /// Store `snapshot`; returns `false` when it repeats the latest one.
    fn add_snapshot(&self, snapshot: String) -> bool;

    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct InMemoryClipboardHistory {
    snapshots: Mutex<Vec<String>>,
}

impl InMemoryClipboardHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardHistory for InMemoryClipboardHistory {
    fn snapshots(&self) -> Vec<String> {
        self.snapshots.lock().expect("clipboard lock poisoned").clone()
    }

    fn add_snapshot(&self, snapshot: String) -> bool {
        let mut snapshots = self.snapshots.lock().expect("clipboard lock poisoned");
        if snapshots.last() == Some(&snapshot) {
            return false;
        }
        snapshots.push(snapshot);
        true
    }

    fn clear(&self) {
        self.snapshots.lock().expect("clipboard lock poisoned").clear();
    }
}

/// Newest-first copy commands for the non-blank snapshots.
pub fn clipboard_commands(snapshots: &[String]) -> Result<Vec<ExecutableCommand>, ValidationError> {
    snapshots
        .iter()
        .rev()
        .filter(|snapshot| !snapshot.trim().is_empty())
        .map(|snapshot| {
            ExecutableCommand::builder(snapshot.clone(), snapshot.clone(), CommandHandler::CopyToClipboard)
                .app_modes([AppMode::Clipboard])
                .build()
        })
        .collect()
}
