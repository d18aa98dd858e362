//! The [`CommandEngine`] facade: one build per query change, progressive
//! refinement as slower producers resolve.
//!
//! A build mints a cycle token, ranks everything that is available right away
//! and publishes the list. Deferred producers (web search, the online
//! interpreter) then run on a detached task, and debounced producers
//! (filesystem search) after a quiet period. When one of them finishes while
//! its cycle is still current, its results are cached under the query and the
//! list is re-ranked and published again on the watch channel.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use runbar_interpret::QueryInterpreter;
use runbar_plugin::{
    Dispatch, FileSearch, NotesListing, Plugin, PluginContext, PluginError, PluginRegistry, PluginServices, RegistryError,
};
use runbar_types::{AppMode, CommandHandler, ExecutableCommand, Note, ValidationError};
use runbar_util::{HistoryStore, HistoryStoreError, InMemoryHistoryStore, SettingsError, UserSettings};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::aggregator::SourceAggregator;
use crate::cancellation::{CancellationCoordinator, CancellationToken};
use crate::history::CommandHistory;
use crate::menu::SystemCommand;
use crate::ranking::rank;
use crate::scheduler::Scheduler;
use crate::sources::{AppIndex, ClipboardHistory, InMemoryClipboardHistory, ShortcutSource, shortcut_command};

const APPS_REFRESH: &str = "apps";
const SHORTCUTS_REFRESH: &str = "shortcuts";

#[derive(Debug, Error)]
pub enum EngineError {
    /// A producer built a command that breaks the command invariants.
    #[error("invalid command: {0}")]
    Validation(#[from] ValidationError),
    #[error("{message}")]
    Producer { message: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    History(#[from] HistoryStoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl From<PluginError> for EngineError {
    fn from(error: PluginError) -> Self {
        match error {
            PluginError::Validation(validation) => Self::Validation(validation),
            PluginError::Producer { message } => Self::Producer { message },
        }
    }
}

/// Timing and threshold knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet period before a filesystem search is sent.
    pub file_search_debounce: Duration,
    pub file_search_min_query_len: usize,
    pub web_search_min_query_len: usize,
    pub shortcut_refresh_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            file_search_debounce: Duration::from_millis(400),
            file_search_min_query_len: 3,
            web_search_min_query_len: 1,
            shortcut_refresh_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub query: String,
    pub mode: AppMode,
}

impl BuildRequest {
    pub fn new(query: impl Into<String>, mode: AppMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }
}

/// One published, immutable result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCommands {
    pub token: CancellationToken,
    pub query: String,
    pub mode: AppMode,
    pub commands: Vec<ExecutableCommand>,
}

/// What started a cycle. Only query changes dispatch fetches; a rebuild after
/// a fetch completes never starts another fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Query,
    FetchCompleted,
}

struct EngineInner {
    config: EngineConfig,
    services: PluginServices,
    settings: Arc<UserSettings>,
    registry: PluginRegistry,
    history: CommandHistory,
    clipboard: Arc<dyn ClipboardHistory>,
    aggregator: SourceAggregator,
    interpreter: QueryInterpreter,
    app_index: Option<Arc<dyn AppIndex>>,
    shortcuts: Option<Arc<dyn ShortcutSource>>,
    notes_listing: Option<Arc<dyn NotesListing>>,
    notes: Mutex<Arc<[Note]>>,
    builds: CancellationCoordinator,
    file_search: Scheduler,
    publisher: watch::Sender<Arc<RankedCommands>>,
    signed_in: AtomicBool,
    active_refreshes: Mutex<HashSet<&'static str>>,
}

impl EngineInner {
    fn try_begin_refresh(&self, key: &'static str) -> bool {
        self.active_refreshes.lock().expect("active refreshes lock poisoned").insert(key)
    }

    fn finish_refresh(&self, key: &'static str) {
        self.active_refreshes.lock().expect("active refreshes lock poisoned").remove(key);
    }
}

/// Query-resolution engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct CommandEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for CommandEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEngine")
            .field("config", &self.inner.config)
            .field("aggregator", &self.inner.aggregator)
            .finish_non_exhaustive()
    }
}

impl CommandEngine {
    pub fn builder() -> CommandEngineBuilder {
        CommandEngineBuilder::default()
    }

    /// Receiver for every published list, including progressive refinements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RankedCommands>> {
        self.inner.publisher.subscribe()
    }

    /// The most recently published list.
    pub fn latest(&self) -> Arc<RankedCommands> {
        self.inner.publisher.borrow().clone()
    }

    pub fn settings(&self) -> &UserSettings {
        &self.inner.settings
    }

    pub fn history(&self) -> &CommandHistory {
        &self.inner.history
    }

    pub fn clipboard(&self) -> &dyn ClipboardHistory {
        self.inner.clipboard.as_ref()
    }

    pub fn set_signed_in(&self, signed_in: bool) {
        self.inner.signed_in.store(signed_in, Ordering::Relaxed);
    }

    /// Run plugin setup hooks and load the local sources.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        let context = self.context_for(&BuildRequest::new("", AppMode::Initial)).await;
        self.inner.registry.register_all(&context).await;
        self.reload_apps().await?;
        self.reload_shortcuts().await?;
        Ok(())
    }

    /// Reload the installed-application index. Hosts call this when the
    /// applications directory changes. Returns the number of apps loaded.
    pub async fn reload_apps(&self) -> Result<usize, EngineError> {
        let Some(index) = self.inner.app_index.clone() else {
            return Ok(0);
        };
        if !self.inner.try_begin_refresh(APPS_REFRESH) {
            debug!("app reload already in flight");
            return Ok(0);
        }
        let outcome = match index.find().await {
            Ok(entries) => entries
                .iter()
                .map(|entry| entry.to_command())
                .collect::<Result<Vec<_>, _>>()
                .map_err(EngineError::from),
            Err(error) => {
                warn!(%error, "app index lookup failed");
                Ok(Vec::new())
            }
        };
        self.inner.finish_refresh(APPS_REFRESH);

        let commands = outcome?;
        let count = commands.len();
        self.inner.aggregator.replace_apps(commands);
        info!(count, "app index loaded");
        Ok(count)
    }

    /// Reload OS shortcuts. A failed listing keeps the previous shortcuts.
    pub async fn reload_shortcuts(&self) -> Result<usize, EngineError> {
        let Some(source) = self.inner.shortcuts.clone() else {
            return Ok(0);
        };
        if !self.inner.try_begin_refresh(SHORTCUTS_REFRESH) {
            debug!("shortcut reload already in flight");
            return Ok(0);
        }
        let listed = source.list().await;
        self.inner.finish_refresh(SHORTCUTS_REFRESH);

        match listed {
            Ok(names) => {
                let commands = names
                    .iter()
                    .map(|name| shortcut_command(name))
                    .collect::<Result<Vec<_>, _>>()?;
                let count = commands.len();
                self.inner.aggregator.replace_shortcuts(commands);
                debug!(count, "shortcuts loaded");
                Ok(count)
            }
            Err(error) => {
                warn!(%error, "shortcut listing failed");
                Ok(0)
            }
        }
    }

    /// Reload shortcuts on the configured interval until the handle is aborted.
    pub fn spawn_shortcut_refresh(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let period = self.inner.config.shortcut_refresh_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(error) = engine.reload_shortcuts().await {
                    warn!(%error, "periodic shortcut reload failed");
                }
            }
        })
    }

    /// Build, publish and return the first ranked list for `request`.
    ///
    /// Slower producers are dispatched afterwards and refine the list through
    /// [`CommandEngine::subscribe`]. The returned list is not published when a
    /// newer build started while this one was running.
    pub async fn build(&self, request: BuildRequest) -> Result<Arc<RankedCommands>, EngineError> {
        let token = self.inner.builds.begin_cycle();
        debug!(%token, query = %request.query, mode = %request.mode, "build started");
        let context = self.context_for(&request).await;
        self.run_cycle(request, context, token, Trigger::Query).await
    }

    /// Modes available to the UI: the core modes plus plugin contributions.
    pub async fn app_modes(&self) -> Vec<AppMode> {
        let mut modes = vec![
            AppMode::Initial,
            AppMode::Menu,
            AppMode::Notes,
            AppMode::Clipboard,
            AppMode::Calendar,
        ];
        let context = self.context_for(&BuildRequest::new("", AppMode::Initial)).await;
        for mode in self.inner.registry.app_modes(&context).await {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        modes
    }

    /// Record `command` as executed and offer it to the plugins.
    ///
    /// Returns the name of the plugin that handled it; `None` leaves execution
    /// to the host. History-affecting system commands are applied here.
    pub async fn execute(&self, command: &ExecutableCommand) -> Result<Option<String>, EngineError> {
        let settings = self.inner.settings.snapshot();
        self.inner.history.record(command, &settings)?;

        if command.handler == CommandHandler::System {
            match command.value.parse::<SystemCommand>() {
                Ok(SystemCommand::ClearHistory) => self.inner.history.clear()?,
                Ok(SystemCommand::ClearNotes) => {
                    let removed = self.inner.history.remove_handler(&CommandHandler::OpenNote)?;
                    debug!(removed, "note history cleared");
                }
                _ => {}
            }
        }

        let context = self.context_for(&BuildRequest::new("", AppMode::Initial)).await;
        Ok(self.inner.registry.handle_command(command, &context).await)
    }

    async fn context_for(&self, request: &BuildRequest) -> PluginContext {
        if request.mode == AppMode::Notes {
            self.refresh_notes().await;
        }
        let notes = self.inner.notes.lock().expect("notes lock poisoned").clone();
        let settings = Arc::new(self.inner.settings.snapshot());
        self.inner
            .services
            .snapshot(request.query.clone(), request.mode.clone(), settings, notes)
    }

    async fn refresh_notes(&self) {
        let Some(listing) = &self.inner.notes_listing else {
            return;
        };
        match listing.list().await {
            Ok(notes) => *self.inner.notes.lock().expect("notes lock poisoned") = Arc::from(notes),
            Err(error) => warn!(%error, "notes listing failed, keeping previous notes"),
        }
    }

    async fn run_cycle(
        &self,
        request: BuildRequest,
        context: PluginContext,
        token: CancellationToken,
        trigger: Trigger,
    ) -> Result<Arc<RankedCommands>, EngineError> {
        let signed_in = self.inner.signed_in.load(Ordering::Relaxed);
        let candidates = self.inner.aggregator.candidates(&context, signed_in).await?;
        let interpreted = if request.mode == AppMode::Initial {
            self.inner.interpreter.interpret_offline(&request.query)
        } else {
            Vec::new()
        };
        let ranked = Arc::new(RankedCommands {
            token,
            commands: rank(&request.query, &request.mode, candidates, interpreted),
            query: request.query.clone(),
            mode: request.mode.clone(),
        });

        if !self.publish(&ranked) {
            debug!(%token, "stale build discarded");
            return Ok(ranked);
        }
        debug!(%token, count = ranked.commands.len(), ?trigger, "published commands");

        if trigger == Trigger::Query {
            self.dispatch_fetches(request, context, token);
        }
        Ok(ranked)
    }

    /// Publish `ranked` if its cycle is still current. The check runs under
    /// the channel's write lock, so a newer cycle always publishes last.
    fn publish(&self, ranked: &Arc<RankedCommands>) -> bool {
        self.inner.publisher.send_if_modified(|latest| {
            if !self.inner.builds.is_current(&ranked.token) {
                return false;
            }
            *latest = ranked.clone();
            true
        })
    }

    fn dispatch_fetches(&self, request: BuildRequest, context: PluginContext, token: CancellationToken) {
        let query = request.query.trim().to_string();
        let length = query.chars().count();
        if request.mode != AppMode::Initial || query.is_empty() {
            self.inner.file_search.cancel();
            return;
        }

        let registry = &self.inner.registry;
        if length >= self.inner.config.web_search_min_query_len
            && !self.inner.aggregator.deferred.contains(&query)
            && registry.has_search_providers(&AppMode::Initial, Dispatch::Deferred)
        {
            let engine = self.clone();
            let (request, context) = (request.clone(), context.clone());
            tokio::spawn(async move { engine.run_deferred(request, context, token).await });
        }

        if length < self.inner.config.file_search_min_query_len
            || !registry.has_search_providers(&AppMode::Initial, Dispatch::Debounced)
        {
            self.inner.file_search.cancel();
            return;
        }
        let engine = self.clone();
        let delay = self.inner.config.file_search_debounce;
        self.inner.file_search.schedule(delay, move |search_token| async move {
            engine.run_debounced(request, context, search_token, token).await;
        });
    }

    async fn run_deferred(&self, request: BuildRequest, context: PluginContext, token: CancellationToken) {
        let query = request.query.trim().to_string();
        let results = match self.inner.registry.collect_search_results(&query, &context, Dispatch::Deferred).await {
            Ok(results) => results,
            Err(error) => {
                error!(%error, %token, "deferred producers returned an invalid command");
                return;
            }
        };
        if !self.inner.builds.is_current(&token) {
            debug!(%token, query = %query, "stale deferred results discarded");
            return;
        }
        self.inner.aggregator.deferred.store(&query, results);
        self.refine(request, context, token).await;
    }

    async fn run_debounced(
        &self,
        request: BuildRequest,
        context: PluginContext,
        search_token: CancellationToken,
        build_token: CancellationToken,
    ) {
        let query = request.query.trim().to_string();
        let results = match self.inner.registry.collect_search_results(&query, &context, Dispatch::Debounced).await {
            Ok(results) => results,
            Err(error) => {
                error!(%error, token = %search_token, "file search returned an invalid command");
                return;
            }
        };
        if !self.inner.file_search.is_current(&search_token) {
            debug!(token = %search_token, query = %query, "stale file search results discarded");
            return;
        }
        self.inner.aggregator.debounced.store(&query, results);
        self.refine(request, context, build_token).await;
    }

    async fn refine(&self, request: BuildRequest, context: PluginContext, token: CancellationToken) {
        if !self.inner.builds.is_current(&token) {
            return;
        }
        if let Err(error) = self.run_cycle(request, context, token, Trigger::FetchCompleted).await {
            error!(%error, %token, "refinement failed");
        }
    }
}

/// Assembles a [`CommandEngine`] from injected sources.
pub struct CommandEngineBuilder {
    config: EngineConfig,
    services: PluginServices,
    settings: Option<Arc<UserSettings>>,
    history: Option<Arc<dyn HistoryStore>>,
    clipboard: Option<Arc<dyn ClipboardHistory>>,
    plugins: Vec<Arc<dyn Plugin>>,
    interpreter: QueryInterpreter,
    app_index: Option<Arc<dyn AppIndex>>,
    shortcuts: Option<Arc<dyn ShortcutSource>>,
    notes_listing: Option<Arc<dyn NotesListing>>,
}

impl Default for CommandEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            services: PluginServices::offline(),
            settings: None,
            history: None,
            clipboard: None,
            plugins: Vec::new(),
            interpreter: QueryInterpreter::new(),
            app_index: None,
            shortcuts: None,
            notes_listing: None,
        }
    }
}

impl CommandEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn services(mut self, services: PluginServices) -> Self {
        self.services = services;
        self
    }

    pub fn settings(mut self, settings: Arc<UserSettings>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn clipboard(mut self, clipboard: Arc<dyn ClipboardHistory>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Register the built-in plugin set.
    pub fn builtin_plugins(mut self, file_search: Option<Arc<dyn FileSearch>>) -> Self {
        self.plugins.extend(runbar_plugins::builtin(file_search));
        self
    }

    pub fn interpreter(mut self, interpreter: QueryInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn app_index(mut self, index: Arc<dyn AppIndex>) -> Self {
        self.app_index = Some(index);
        self
    }

    pub fn shortcuts(mut self, source: Arc<dyn ShortcutSource>) -> Self {
        self.shortcuts = Some(source);
        self
    }

    pub fn notes_listing(mut self, listing: Arc<dyn NotesListing>) -> Self {
        self.notes_listing = Some(listing);
        self
    }

    pub fn build(self) -> Result<CommandEngine, EngineError> {
        let registry = PluginRegistry::new();
        for plugin in self.plugins {
            registry.insert(plugin)?;
        }

        let history = CommandHistory::new(self.history.unwrap_or_else(|| Arc::new(InMemoryHistoryStore::new())));
        let clipboard = self.clipboard.unwrap_or_else(|| Arc::new(InMemoryClipboardHistory::new()));
        let aggregator = SourceAggregator::new(registry.clone(), history.clone(), clipboard.clone());

        let builds = CancellationCoordinator::new();
        let initial = Arc::new(RankedCommands {
            token: builds.current_token(),
            query: String::new(),
            mode: AppMode::Initial,
            commands: Vec::new(),
        });
        let (publisher, _) = watch::channel(initial);

        Ok(CommandEngine {
            inner: Arc::new(EngineInner {
                config: self.config,
                services: self.services,
                settings: self.settings.unwrap_or_else(|| Arc::new(UserSettings::ephemeral())),
                registry,
                history,
                clipboard,
                aggregator,
                interpreter: self.interpreter,
                app_index: self.app_index,
                shortcuts: self.shortcuts,
                notes_listing: self.notes_listing,
                notes: Mutex::new(Arc::from(Vec::new())),
                builds,
                file_search: Scheduler::new(),
                publisher,
                signed_in: AtomicBool::new(false),
                active_refreshes: Mutex::new(HashSet::new()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{AppEntry, StaticApps};
    use async_trait::async_trait;
    use runbar_plugin::{FileHit, SearchResultsProvider, SourceError, StaticNotes};
    use runbar_plugins::{ExactUrlPlugin, NotesPlugin};
    use runbar_types::{Priority, Settings};
    use std::sync::atomic::AtomicUsize;

    /// Deferred producer answering `"{query} {call}"`; the first call is slow.
    #[derive(Default)]
    struct Suggest {
        calls: AtomicUsize,
        first_call_delay: Duration,
    }

    #[async_trait]
    impl SearchResultsProvider for Suggest {
        async fn add_search_results(&self, query: &str, _context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                tokio::time::sleep(self.first_call_delay).await;
            }
            let label = format!("{query} {call}");
            Ok(vec![
                ExecutableCommand::builder(label.clone(), format!("https://search/{label}"), CommandHandler::Url)
                    .priority(Priority::LOW)
                    .build()?,
            ])
        }
    }

    impl Plugin for Suggest {
        fn name(&self) -> &str {
            "Suggest"
        }

        fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
            Some(self)
        }
    }

    #[derive(Default)]
    struct Files {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FileSearch for Files {
        async fn search(&self, query: &str, _extra: &[String], _home_only: bool) -> Result<Vec<FileHit>, SourceError> {
            self.queries.lock().expect("queries lock poisoned").push(query.to_string());
            Ok(vec![FileHit {
                display_name: format!("{query}.pdf"),
                path: format!("/tmp/{query}.pdf"),
                content_type: None,
            }])
        }
    }

    struct Broken;

    #[async_trait]
    impl SearchResultsProvider for Broken {
        async fn add_search_results(&self, _query: &str, _context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
            let mut command = ExecutableCommand::builder("broken", "broken", CommandHandler::Url).build()?;
            command.app_modes.clear();
            Ok(vec![command])
        }
    }

    impl Plugin for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn dispatch(&self) -> Dispatch {
            Dispatch::Inline
        }

        fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
            Some(self)
        }
    }

    fn labels(ranked: &RankedCommands) -> Vec<&str> {
        ranked.commands.iter().map(|command| command.label.as_str()).collect()
    }

    fn settings_without_file_search_home_filter() -> Arc<UserSettings> {
        Arc::new(UserSettings::from_settings(Settings {
            fs_search_home_only: false,
            ..Settings::default()
        }))
    }

    #[tokio::test]
    async fn arithmetic_answer_leads_the_first_list() {
        let engine = CommandEngine::builder().build().unwrap();
        let ranked = engine
            .build(BuildRequest::new("one plus one plus one", AppMode::Initial))
            .await
            .unwrap();
        assert_eq!(ranked.commands[0].value, "3");
        assert_eq!(engine.latest(), ranked);
    }

    #[tokio::test]
    async fn empty_query_lists_history_most_recent_first() {
        let engine = CommandEngine::builder().build().unwrap();
        let app = ExecutableCommand::builder("Safari", "/Applications/Safari.app", CommandHandler::App)
            .priority(Priority::MEDIUM)
            .build()
            .unwrap();
        let url = ExecutableCommand::builder("rust book", "https://doc.rust-lang.org/book", CommandHandler::Url)
            .build()
            .unwrap();
        engine.execute(&app).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        engine.execute(&url).await.unwrap();

        let ranked = engine.build(BuildRequest::new("", AppMode::Initial)).await.unwrap();
        assert_eq!(labels(&ranked), vec!["rust book", "Safari"]);
    }

    #[tokio::test]
    async fn apps_and_exact_urls_appear_synchronously() {
        let apps = Arc::new(StaticApps::new(vec![AppEntry::new("Safari.app", "/Applications/Safari.app")]));
        let engine = CommandEngine::builder()
            .app_index(apps)
            .plugin(Arc::new(ExactUrlPlugin))
            .build()
            .unwrap();
        engine.initialize().await.unwrap();

        let ranked = engine.build(BuildRequest::new("safari", AppMode::Initial)).await.unwrap();
        assert_eq!(ranked.commands[0].label, "Safari");

        let ranked = engine.build(BuildRequest::new("docs.rs", AppMode::Initial)).await.unwrap();
        assert_eq!(ranked.commands[0].value, "https://docs.rs");
        assert_eq!(ranked.commands[0].priority, Priority::TOP);
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_results_refine_the_list_once() {
        let suggest = Arc::new(Suggest::default());
        let engine = CommandEngine::builder().plugin(suggest.clone()).build().unwrap();
        let mut updates = engine.subscribe();

        let first = engine.build(BuildRequest::new("rust", AppMode::Initial)).await.unwrap();
        assert!(!labels(&first).contains(&"rust 1"));
        updates.borrow_and_update();

        updates.changed().await.unwrap();
        let refined = updates.borrow_and_update().clone();
        assert!(labels(&refined).contains(&"rust 1"));
        assert_eq!(refined.token, first.token);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(suggest.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_deferred_results_never_appear() {
        let suggest = Arc::new(Suggest {
            first_call_delay: Duration::from_millis(300),
            ..Suggest::default()
        });
        let engine = CommandEngine::builder().plugin(suggest.clone()).build().unwrap();

        engine.build(BuildRequest::new("rust", AppMode::Initial)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.build(BuildRequest::new("rust", AppMode::Initial)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let latest = engine.latest();
        assert_eq!(suggest.calls.load(Ordering::SeqCst), 2);
        assert!(labels(&latest).contains(&"rust 2"));
        assert!(!labels(&latest).contains(&"rust 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn file_search_is_debounced() {
        let files = Arc::new(Files::default());
        let engine = CommandEngine::builder()
            .settings(settings_without_file_search_home_filter())
            .builtin_plugins(Some(files.clone()))
            .build()
            .unwrap();

        for query in ["r", "re", "rep", "repo", "report"] {
            engine.build(BuildRequest::new(query, AppMode::Initial)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*files.queries.lock().unwrap(), vec!["report"]);
        let latest = engine.latest();
        assert_eq!(latest.query, "report");
        assert!(latest.commands.iter().any(|command| command.handler == CommandHandler::FsItem));
    }

    #[tokio::test(start_paused = true)]
    async fn short_queries_skip_file_search() {
        let files = Arc::new(Files::default());
        let engine = CommandEngine::builder()
            .plugin(Arc::new(runbar_plugins::FileSearchPlugin::new(files.clone())))
            .build()
            .unwrap();
        engine.build(BuildRequest::new("re", AppMode::Initial)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(files.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notes_mode_refreshes_the_listing() {
        let listing = Arc::new(StaticNotes::default());
        let engine = CommandEngine::builder()
            .plugin(Arc::new(NotesPlugin))
            .notes_listing(listing.clone())
            .build()
            .unwrap();

        let empty = engine.build(BuildRequest::new("", AppMode::Notes)).await.unwrap();
        assert_eq!(labels(&empty), vec!["Create daily note"]);

        listing.replace(vec![Note {
            title: "Ideas".into(),
            filename: "ideas.md".into(),
            path: "/notes/ideas.md".into(),
            updated_at: None,
        }]);
        let refreshed = engine.build(BuildRequest::new("", AppMode::Notes)).await.unwrap();
        assert!(labels(&refreshed).contains(&"Ideas"));
    }

    #[tokio::test]
    async fn superseded_cycles_never_publish() {
        let engine = CommandEngine::builder().build().unwrap();
        let current = engine.build(BuildRequest::new("2 + 2", AppMode::Initial)).await.unwrap();

        let stale = Arc::new(RankedCommands {
            token: current.token,
            query: "2 + 2".into(),
            mode: AppMode::Initial,
            commands: Vec::new(),
        });
        assert!(engine.publish(&stale));

        engine.inner.builds.begin_cycle();
        let superseded = Arc::new(RankedCommands {
            query: "stale".into(),
            ..(*stale).clone()
        });
        assert!(!engine.publish(&superseded));
        assert_eq!(engine.latest().query, "2 + 2");
    }

    #[tokio::test]
    async fn menu_reflects_the_session() {
        let engine = CommandEngine::builder().build().unwrap();
        let signed_out = engine.build(BuildRequest::new("", AppMode::Menu)).await.unwrap();
        assert!(signed_out.commands.iter().any(|command| command.value == "SIGN_IN"));

        engine.set_signed_in(true);
        let signed_in = engine.build(BuildRequest::new("", AppMode::Menu)).await.unwrap();
        assert!(signed_in.commands.iter().any(|command| command.value == "PROFILE"));
    }

    #[tokio::test]
    async fn clear_history_command_empties_history() {
        let engine = CommandEngine::builder().build().unwrap();
        let url = ExecutableCommand::builder("a", "https://a.dev", CommandHandler::Url).build().unwrap();
        engine.execute(&url).await.unwrap();
        let clear = ExecutableCommand::builder("Clear history", "CLEAR_HISTORY", CommandHandler::System)
            .build()
            .unwrap();

        assert_eq!(engine.execute(&clear).await.unwrap(), None);
        assert!(engine.history().commands().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_plugin_commands_surface_as_validation_errors() {
        let engine = CommandEngine::builder().plugin(Arc::new(Broken)).build().unwrap();
        let error = engine
            .build(BuildRequest::new("anything", AppMode::Initial))
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::Validation(_)));
    }

    #[test]
    fn duplicate_plugins_are_rejected() {
        let result = CommandEngine::builder()
            .plugin(Arc::new(ExactUrlPlugin))
            .plugin(Arc::new(ExactUrlPlugin))
            .build();
        assert!(matches!(result, Err(EngineError::Registry(_))));
    }

    #[tokio::test]
    async fn core_modes_are_always_available() {
        let engine = CommandEngine::builder().build().unwrap();
        let modes = engine.app_modes().await;
        assert_eq!(modes[0], AppMode::Initial);
        assert!(modes.contains(&AppMode::Clipboard));
    }
}
