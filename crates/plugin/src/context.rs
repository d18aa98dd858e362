//! Read-only snapshot handed to every plugin and parser call.

use std::fmt;
use std::sync::Arc;

use runbar_types::{AppMode, Note, Settings};
use serde_json::Value;

use crate::collaborators::{
    CommandExecutor, ExecError, ExecOutput, FailureReporter, FetchError, Fetcher, LogFailures, OfflineExecutor,
    OfflineFetcher,
};
use crate::i18n::{Catalog, Translator};

/// Long-lived capabilities shared by every context minted for a session.
#[derive(Clone)]
pub struct PluginServices {
    pub fetcher: Arc<dyn Fetcher>,
    pub executor: Arc<dyn CommandExecutor>,
    pub translator: Arc<dyn Translator>,
    pub failures: Arc<dyn FailureReporter>,
}

impl PluginServices {
    /// Services with no network or process access.
    pub fn offline() -> Self {
        Self {
            fetcher: Arc::new(OfflineFetcher),
            executor: Arc::new(OfflineExecutor),
            translator: Arc::new(Catalog::english()),
            failures: Arc::new(LogFailures),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_failures(mut self, failures: Arc<dyn FailureReporter>) -> Self {
        self.failures = failures;
        self
    }

    /// Capture a context for one call.
    pub fn snapshot(&self, query: impl Into<String>, app_mode: AppMode, settings: Arc<Settings>, notes: Arc<[Note]>) -> PluginContext {
        PluginContext {
            query: query.into(),
            app_mode,
            settings,
            notes,
            services: self.clone(),
        }
    }
}

impl Default for PluginServices {
    fn default() -> Self {
        Self::offline()
    }
}

impl fmt::Debug for PluginServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginServices").finish_non_exhaustive()
    }
}

/// Immutable view of the query, UI mode, settings and capabilities for one call.
#[derive(Clone, Debug)]
pub struct PluginContext {
    query: String,
    app_mode: AppMode,
    settings: Arc<Settings>,
    notes: Arc<[Note]>,
    services: PluginServices,
}

impl PluginContext {
    /// Context with default settings, no notes and offline services.
    pub fn offline(query: impl Into<String>, app_mode: AppMode) -> Self {
        PluginServices::offline().snapshot(query, app_mode, Arc::new(Settings::default()), Arc::from(Vec::new()))
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn app_mode(&self) -> &AppMode {
        &self.app_mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn services(&self) -> &PluginServices {
        &self.services
    }

    /// Same snapshot with a different query; used when a producer runs for a
    /// query other than the one the context was captured for.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..self.clone()
        }
    }

    pub async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.services.fetcher.get_json(url).await
    }

    pub async fn exec(&self, command: &str, args: &[String]) -> Result<ExecOutput, ExecError> {
        self.services.executor.run(command, args).await
    }

    /// Translate `key`, interpolating `{name}` placeholders.
    pub fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.services.translator.translate(key, params)
    }

    /// Report a user-visible failure.
    pub fn fail(&self, reason: &str) {
        self.services.failures.fail(reason);
    }
}
