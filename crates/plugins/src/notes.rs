//! Notes: create a note from the query, or open one of the known notes.

use async_trait::async_trait;
use runbar_plugin::{Dispatch, Plugin, PluginContext, PluginError, SearchResultsProvider};
use runbar_types::{AppMode, CommandHandler, CommandMetadata, ExecutableCommand, Priority, ValidationError};

/// "Create note: {query}", or the daily note when the query is empty.
pub fn create_note_command(query: &str, context: &PluginContext) -> Result<ExecutableCommand, ValidationError> {
    let label = if query.is_empty() {
        context.t("commands.actions.createDailyNote", &[])
    } else {
        context.t("commands.actions.createNote", &[("query", query)])
    };
    ExecutableCommand::builder(label.clone(), query, CommandHandler::CreateNote)
        .localized_label(label)
        .priority(Priority::MEDIUM)
        .app_modes([AppMode::Initial, AppMode::Notes])
        .build()
}

#[derive(Debug, Default)]
pub struct NotesPlugin;

#[async_trait]
impl SearchResultsProvider for NotesPlugin {
    async fn add_search_results(&self, query: &str, context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
        let mut commands = vec![create_note_command(query, context)?];
        for note in context.notes() {
            let metadata = CommandMetadata {
                updated_at: note.updated_at,
                ..CommandMetadata::with_path(note.path.clone())
            };
            let command = ExecutableCommand::builder(note.title.clone(), note.filename.clone(), CommandHandler::OpenNote)
                .localized_label(note.title.clone())
                .metadata(metadata)
                .app_modes([AppMode::Initial, AppMode::Notes])
                .build()?;
            commands.push(command);
        }
        Ok(commands)
    }
}

impl Plugin for NotesPlugin {
    fn name(&self) -> &str {
        "Notes"
    }

    /// Works from the notes snapshot in the context; the listing refresh
    /// happens before the context is captured.
    fn dispatch(&self) -> Dispatch {
        Dispatch::Inline
    }

    fn serves(&self, mode: &AppMode) -> bool {
        *mode == AppMode::Notes
    }

    fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
        Some(self)
    }
}
