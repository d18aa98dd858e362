//! Run-history service on top of a [`HistoryStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use runbar_types::{CommandHandler, ExecutableCommand, HistoryEntry, Settings};
use runbar_util::{HistoryStore, HistoryStoreError};
use tracing::debug;

/// Handlers whose executions are never recorded.
const UNRECORDED: [CommandHandler; 2] = [CommandHandler::CreateNote, CommandHandler::System];

#[derive(Clone)]
pub struct CommandHistory {
    store: Arc<dyn HistoryStore>,
}

impl CommandHistory {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Record an executed command. Returns `false` when nothing was written:
    /// incognito mode, note creation and system commands are skipped.
    pub fn record(&self, command: &ExecutableCommand, settings: &Settings) -> Result<bool, HistoryStoreError> {
        self.record_at(command, settings, Utc::now())
    }

    pub fn record_at(
        &self,
        command: &ExecutableCommand,
        settings: &Settings,
        ran_at: DateTime<Utc>,
    ) -> Result<bool, HistoryStoreError> {
        if settings.incognito_enabled || UNRECORDED.contains(&command.handler) {
            debug!(handler = %command.handler, "history recording skipped");
            return Ok(false);
        }
        self.store.record(HistoryEntry::from_command(command, ran_at))?;
        Ok(true)
    }

    /// Listable commands, oldest first.
    pub fn commands(&self) -> Result<Vec<ExecutableCommand>, HistoryStoreError> {
        Ok(self.store.entries()?.iter().map(HistoryEntry::to_command).collect())
    }

    pub fn remove(&self, handler: &CommandHandler, value: &str) -> Result<bool, HistoryStoreError> {
        self.store.remove(handler, value)
    }

    pub fn remove_handler(&self, handler: &CommandHandler) -> Result<usize, HistoryStoreError> {
        self.store.remove_handler(handler)
    }

    pub fn clear(&self) -> Result<(), HistoryStoreError> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use runbar_types::Priority;
    use runbar_util::InMemoryHistoryStore;

    fn history() -> CommandHistory {
        CommandHistory::new(Arc::new(InMemoryHistoryStore::new()))
    }

    fn url(label: &str, value: &str) -> ExecutableCommand {
        ExecutableCommand::builder(label, value, CommandHandler::Url)
            .priority(Priority::MEDIUM)
            .build()
            .unwrap()
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 10, minute, 0).unwrap()
    }

    #[test]
    fn record_then_remove_restores_previous_history() {
        let history = history();
        let settings = Settings::default();
        history.record_at(&url("docs", "https://docs.rs"), &settings, at(0)).unwrap();
        let before = history.commands().unwrap();

        history.record_at(&url("crates", "https://crates.io"), &settings, at(1)).unwrap();
        assert!(history.remove(&CommandHandler::Url, "https://crates.io").unwrap());

        assert_eq!(history.commands().unwrap(), before);
    }

    #[test]
    fn rerunning_moves_entry_to_the_end() {
        let history = history();
        let settings = Settings::default();
        history.record_at(&url("a", "https://a.dev"), &settings, at(0)).unwrap();
        history.record_at(&url("b", "https://b.dev"), &settings, at(1)).unwrap();
        history.record_at(&url("a", "https://a.dev"), &settings, at(2)).unwrap();

        let commands = history.commands().unwrap();
        let values: Vec<&str> = commands.iter().map(|command| command.value.as_str()).collect();
        assert_eq!(values, vec!["https://b.dev", "https://a.dev"]);
        assert_eq!(commands[1].ran_at(), Some(at(2)));
    }

    #[test]
    fn skips_incognito_notes_and_system_commands() {
        let history = history();
        let incognito = Settings {
            incognito_enabled: true,
            ..Settings::default()
        };
        assert!(!history.record(&url("a", "https://a.dev"), &incognito).unwrap());

        let create = ExecutableCommand::builder("Create note: x", "x", CommandHandler::CreateNote).build().unwrap();
        let exit = ExecutableCommand::builder("Exit", "EXIT", CommandHandler::System).build().unwrap();
        assert!(!history.record(&create, &Settings::default()).unwrap());
        assert!(!history.record(&exit, &Settings::default()).unwrap());
        assert!(history.commands().unwrap().is_empty());
    }

    #[test]
    fn remove_handler_and_clear() {
        let history = history();
        let settings = Settings::default();
        history.record_at(&url("a", "https://a.dev"), &settings, at(0)).unwrap();
        let note = ExecutableCommand::builder("Ideas", "ideas.md", CommandHandler::OpenNote).build().unwrap();
        history.record_at(&note, &settings, at(1)).unwrap();

        assert_eq!(history.remove_handler(&CommandHandler::OpenNote).unwrap(), 1);
        assert_eq!(history.commands().unwrap().len(), 1);
        history.clear().unwrap();
        assert!(history.commands().unwrap().is_empty());
    }
}
