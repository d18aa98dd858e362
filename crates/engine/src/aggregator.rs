//! Collects candidate commands for one build, per UI mode.

use std::fmt;
use std::sync::{Arc, Mutex};

use runbar_plugin::{Dispatch, PluginContext, PluginRegistry};
use runbar_plugins::looks_like_hostname;
use runbar_types::{AppMode, CommandHandler, ExecutableCommand};
use tracing::{debug, warn};

use crate::engine::EngineError;
use crate::history::CommandHistory;
use crate::menu::menu_commands;
use crate::sources::{ClipboardHistory, clipboard_commands};

/// Results of the most recent fetch, tagged with the query they answer.
#[derive(Debug, Default)]
pub(crate) struct ResultCache {
    latest: Mutex<Option<(String, Vec<ExecutableCommand>)>>,
}

impl ResultCache {
    pub(crate) fn lookup(&self, query: &str) -> Option<Vec<ExecutableCommand>> {
        let latest = self.latest.lock().expect("result cache lock poisoned");
        match latest.as_ref() {
            Some((cached_query, commands)) if cached_query == query => Some(commands.clone()),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, query: &str) -> bool {
        self.latest
            .lock()
            .expect("result cache lock poisoned")
            .as_ref()
            .is_some_and(|(cached_query, _)| cached_query == query)
    }

    pub(crate) fn store(&self, query: &str, commands: Vec<ExecutableCommand>) {
        *self.latest.lock().expect("result cache lock poisoned") = Some((query.to_string(), commands));
    }
}

pub struct SourceAggregator {
    registry: PluginRegistry,
    history: CommandHistory,
    clipboard: Arc<dyn ClipboardHistory>,
    apps: Mutex<Vec<ExecutableCommand>>,
    shortcuts: Mutex<Vec<ExecutableCommand>>,
    pub(crate) deferred: ResultCache,
    pub(crate) debounced: ResultCache,
}

impl fmt::Debug for SourceAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceAggregator")
            .field("plugins", &self.registry.names())
            .finish_non_exhaustive()
    }
}

impl SourceAggregator {
    pub fn new(registry: PluginRegistry, history: CommandHistory, clipboard: Arc<dyn ClipboardHistory>) -> Self {
        Self {
            registry,
            history,
            clipboard,
            apps: Mutex::new(Vec::new()),
            shortcuts: Mutex::new(Vec::new()),
            deferred: ResultCache::default(),
            debounced: ResultCache::default(),
        }
    }

    pub fn replace_apps(&self, commands: Vec<ExecutableCommand>) {
        *self.apps.lock().expect("apps lock poisoned") = commands;
    }

    pub fn replace_shortcuts(&self, commands: Vec<ExecutableCommand>) {
        *self.shortcuts.lock().expect("shortcuts lock poisoned") = commands;
    }

    /// Unranked candidates for the context's query and mode, restricted to
    /// commands eligible in that mode.
    pub async fn candidates(&self, context: &PluginContext, signed_in: bool) -> Result<Vec<ExecutableCommand>, EngineError> {
        let query = context.query().trim();
        let mode = context.app_mode();
        let candidates = match mode {
            AppMode::Initial if query.is_empty() => {
                let mut history = self.history_commands();
                history.reverse();
                history
            }
            AppMode::Initial => self.initial_candidates(query, context, signed_in).await?,
            AppMode::Menu => menu_commands(context, signed_in)?,
            AppMode::Clipboard => clipboard_commands(&self.clipboard.snapshots())?,
            _ => self.registry.collect_search_results(query, context, Dispatch::Inline).await?,
        };

        let before = candidates.len();
        let eligible: Vec<ExecutableCommand> = candidates
            .into_iter()
            .filter(|command| command.is_eligible_in(mode))
            .collect();
        debug!(%mode, total = before, eligible = eligible.len(), "collected candidates");
        Ok(eligible)
    }

    async fn initial_candidates(
        &self,
        query: &str,
        context: &PluginContext,
        signed_in: bool,
    ) -> Result<Vec<ExecutableCommand>, EngineError> {
        let mut candidates = self.apps.lock().expect("apps lock poisoned").clone();
        candidates.extend(self.registry.collect_search_results(query, context, Dispatch::Inline).await?);
        candidates.extend(self.deferred.lookup(query).unwrap_or_default());
        candidates.extend(self.debounced.lookup(query).unwrap_or_default());

        let mut history = self.history_commands();
        history.reverse();
        if looks_like_hostname(query) {
            history.retain(|command| command.label != query && command.handler != CommandHandler::Url);
        }
        candidates.extend(history);

        candidates.extend(self.shortcuts.lock().expect("shortcuts lock poisoned").iter().cloned());
        candidates.extend(menu_commands(context, signed_in)?);
        Ok(candidates)
    }

    fn history_commands(&self) -> Vec<ExecutableCommand> {
        self.history.commands().unwrap_or_else(|error| {
            warn!(%error, "failed to read run history");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::InMemoryClipboardHistory;
    use runbar_plugins::ExactUrlPlugin;
    use runbar_types::Settings;
    use runbar_util::InMemoryHistoryStore;

    fn aggregator() -> SourceAggregator {
        let registry = PluginRegistry::new();
        registry.insert(Arc::new(ExactUrlPlugin)).unwrap();
        let history = CommandHistory::new(Arc::new(InMemoryHistoryStore::new()));
        SourceAggregator::new(registry, history, Arc::new(InMemoryClipboardHistory::new()))
    }

    fn url(label: &str, value: &str) -> ExecutableCommand {
        ExecutableCommand::builder(label, value, CommandHandler::Url).build().unwrap()
    }

    #[tokio::test]
    async fn empty_initial_query_lists_history_only() {
        let aggregator = aggregator();
        aggregator.replace_apps(vec![
            ExecutableCommand::builder("Safari", "/Applications/Safari.app", CommandHandler::App).build().unwrap(),
        ]);
        let settings = Settings::default();
        aggregator.history.record(&url("a", "https://a.dev"), &settings).unwrap();
        aggregator.history.record(&url("b", "https://b.dev"), &settings).unwrap();

        let candidates = aggregator
            .candidates(&PluginContext::offline("", AppMode::Initial), false)
            .await
            .unwrap();

        let values: Vec<&str> = candidates.iter().map(|command| command.value.as_str()).collect();
        assert_eq!(values, vec!["https://b.dev", "https://a.dev"]);
    }

    #[tokio::test]
    async fn hostname_queries_suppress_url_history() {
        let aggregator = aggregator();
        aggregator
            .history
            .record(&url("docs", "https://docs.rs/old"), &Settings::default())
            .unwrap();

        let candidates = aggregator
            .candidates(&PluginContext::offline("docs.rs", AppMode::Initial), false)
            .await
            .unwrap();

        let urls: Vec<&str> = candidates
            .iter()
            .filter(|command| command.handler == CommandHandler::Url)
            .map(|command| command.value.as_str())
            .collect();
        assert_eq!(urls, vec!["https://docs.rs"]);
    }

    #[tokio::test]
    async fn cached_results_only_serve_their_own_query() {
        let aggregator = aggregator();
        aggregator.deferred.store("rust", vec![url("rust book", "https://search/rust+book")]);

        let matching = aggregator
            .candidates(&PluginContext::offline("rust", AppMode::Initial), false)
            .await
            .unwrap();
        assert!(matching.iter().any(|command| command.label == "rust book"));

        let other = aggregator
            .candidates(&PluginContext::offline("ruby", AppMode::Initial), false)
            .await
            .unwrap();
        assert!(!other.iter().any(|command| command.label == "rust book"));
    }

    #[tokio::test]
    async fn clipboard_mode_lists_snapshots() {
        let aggregator = aggregator();
        aggregator.clipboard.add_snapshot("one".into());
        aggregator.clipboard.add_snapshot("two".into());

        let candidates = aggregator
            .candidates(&PluginContext::offline("", AppMode::Clipboard), false)
            .await
            .unwrap();
        let values: Vec<&str> = candidates.iter().map(|command| command.value.as_str()).collect();
        assert_eq!(values, vec!["two", "one"]);
    }

    #[tokio::test]
    async fn menu_mode_lists_menu_only() {
        let aggregator = aggregator();
        aggregator.replace_shortcuts(vec![
            ExecutableCommand::builder("Timer", "Timer", CommandHandler::RunShortcut).build().unwrap(),
        ]);
        let candidates = aggregator
            .candidates(&PluginContext::offline("", AppMode::Menu), true)
            .await
            .unwrap();
        assert!(candidates.iter().all(|command| command.app_modes.contains(&AppMode::Menu)));
        assert_eq!(candidates[0].value, "PROFILE");
    }
}
