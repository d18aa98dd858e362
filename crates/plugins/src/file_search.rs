//! Filesystem search results, gated by the user's settings.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use runbar_plugin::{Dispatch, FileHit, FileSearch, Plugin, PluginContext, PluginError, SearchResultsProvider};
use runbar_types::{CommandHandler, CommandMetadata, ExecutableCommand, Priority, ValidationError};
use runbar_util::path_processing::is_within_home;
use tracing::debug;

pub struct FileSearchPlugin {
    search: Arc<dyn FileSearch>,
}

impl FileSearchPlugin {
    pub fn new(search: Arc<dyn FileSearch>) -> Self {
        Self { search }
    }
}

impl fmt::Debug for FileSearchPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSearchPlugin").finish_non_exhaustive()
    }
}

fn file_command(hit: FileHit) -> Result<ExecutableCommand, ValidationError> {
    let metadata = CommandMetadata {
        content_type: hit.content_type,
        ..CommandMetadata::with_path(hit.path.clone())
    };
    ExecutableCommand::builder(hit.display_name, hit.path, CommandHandler::FsItem)
        .metadata(metadata)
        .priority(Priority::LOW)
        .build()
}

#[async_trait]
impl SearchResultsProvider for FileSearchPlugin {
    async fn add_search_results(&self, query: &str, context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
        let settings = context.settings();
        if !settings.fs_search_enabled {
            return Ok(Vec::new());
        }
        let home_only = settings.fs_search_home_only;
        let hits = self.search.search(query, &settings.fs_search_extensions, home_only).await?;
        debug!(count = hits.len(), home_only, "file search finished");

        hits.into_iter()
            .filter(|hit| !home_only || is_within_home(&hit.path))
            .map(|hit| file_command(hit).map_err(PluginError::from))
            .collect()
    }
}

impl Plugin for FileSearchPlugin {
    fn name(&self) -> &str {
        "FileSearch"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Debounced
    }

    fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
        Some(self)
    }
}
