//! Plugin registry: ordered plugin set plus capability-filtered fan-out.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use indexmap::IndexMap;
use runbar_types::{AppMode, ExecutableCommand};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::context::PluginContext;
use crate::contract::{Dispatch, Plugin, PluginError};
use crate::instance::PluginInstance;

/// Errors raised when mutating the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("plugin '{name}' is already registered")]
    DuplicatePlugin { name: String },
    #[error("plugin '{name}' not found")]
    PluginNotFound { name: String },
}

/// Registry of plugins in registration order.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Arc<Mutex<IndexMap<String, Arc<dyn Plugin>>>>,
    registered: Arc<Mutex<HashSet<String>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. Names must be unique.
    pub fn insert(&self, plugin: Arc<dyn Plugin>) -> Result<(), RegistryError> {
        let name = plugin.name().to_string();
        let mut plugins = self.plugins.lock().expect("plugin registry lock poisoned");
        if plugins.contains_key(&name) {
            return Err(RegistryError::DuplicatePlugin { name });
        }
        debug!(plugin = %name, dispatch = ?plugin.dispatch(), "plugin added");
        plugins.insert(name, plugin);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<Arc<dyn Plugin>, RegistryError> {
        self.registered.lock().expect("plugin registry lock poisoned").remove(name);
        self.plugins
            .lock()
            .expect("plugin registry lock poisoned")
            .shift_remove(name)
            .ok_or_else(|| RegistryError::PluginNotFound { name: name.to_string() })
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.lock().expect("plugin registry lock poisoned").keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.lock().expect("plugin registry lock poisoned").is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.lock().expect("plugin registry lock poisoned").values().cloned().collect()
    }

    /// Plugins exposing search results for `mode` under `dispatch`.
    pub fn search_providers(&self, mode: &AppMode, dispatch: Dispatch) -> Vec<Arc<dyn Plugin>> {
        self.snapshot()
            .into_iter()
            .filter(|plugin| plugin.search_results_provider().is_some())
            .filter(|plugin| plugin.dispatch() == dispatch && plugin.serves(mode))
            .collect()
    }

    /// `true` when at least one plugin would be asked for results.
    pub fn has_search_providers(&self, mode: &AppMode, dispatch: Dispatch) -> bool {
        !self.search_providers(mode, dispatch).is_empty()
    }

    /// Run setup hooks for plugins that have not been registered yet.
    ///
    /// Hook failures are logged and the plugin is retried on the next call.
    pub async fn register_all(&self, context: &PluginContext) {
        let pending: Vec<Arc<dyn Plugin>> = {
            let registered = self.registered.lock().expect("plugin registry lock poisoned");
            self.snapshot()
                .into_iter()
                .filter(|plugin| !registered.contains(plugin.name()))
                .collect()
        };

        for plugin in pending {
            let name = plugin.name().to_string();
            let instance = PluginInstance::new(plugin, context.clone());
            match instance.register().await {
                Ok(_) => {
                    self.registered.lock().expect("plugin registry lock poisoned").insert(name);
                }
                Err(error) => warn!(plugin = %name, error = %error, "plugin registration failed"),
            }
        }
    }

    /// Collect search results from every matching provider concurrently.
    ///
    /// Producer failures are logged and contribute nothing. Validation
    /// failures are returned, since they indicate a broken plugin.
    pub async fn collect_search_results(
        &self,
        query: &str,
        context: &PluginContext,
        dispatch: Dispatch,
    ) -> Result<Vec<ExecutableCommand>, PluginError> {
        let providers = self.search_providers(context.app_mode(), dispatch);
        let calls = providers.into_iter().map(|plugin| async move {
            let name = plugin.name().to_string();
            let instance = PluginInstance::new(plugin, context.clone());
            (name, instance.add_search_results(query).await)
        });

        let mut commands = Vec::new();
        for (name, outcome) in join_all(calls).await {
            match outcome {
                Ok(results) => {
                    debug!(plugin = %name, count = results.len(), "plugin produced results");
                    commands.extend(results);
                }
                Err(error) if error.is_validation() => {
                    error!(plugin = %name, error = %error, "plugin produced an invalid command");
                    return Err(error);
                }
                Err(error) => warn!(plugin = %name, error = %error, "plugin search failed"),
            }
        }
        Ok(commands)
    }

    /// Offer `command` to plugins in order; returns the name of the first
    /// plugin that claims it.
    pub async fn handle_command(&self, command: &ExecutableCommand, context: &PluginContext) -> Option<String> {
        for plugin in self.snapshot() {
            if plugin.command_interceptor().is_none() {
                continue;
            }
            let name = plugin.name().to_string();
            let instance = PluginInstance::new(plugin, context.clone());
            match instance.handle_command(command).await {
                Ok(outcome) if outcome.matched => return Some(name),
                Ok(_) => {}
                Err(error) => warn!(plugin = %name, error = %error, "plugin failed to handle command"),
            }
        }
        None
    }

    /// Union of app modes contributed by plugins, first occurrence wins.
    pub async fn app_modes(&self, context: &PluginContext) -> Vec<AppMode> {
        let mut modes: Vec<AppMode> = Vec::new();
        for plugin in self.snapshot() {
            if plugin.app_mode_contributor().is_none() {
                continue;
            }
            let name = plugin.name().to_string();
            match PluginInstance::new(plugin, context.clone()).add_app_modes().await {
                Ok(contributed) => {
                    for mode in contributed {
                        if !modes.contains(&mode) {
                            modes.push(mode);
                        }
                    }
                }
                Err(error) => warn!(plugin = %name, error = %error, "plugin failed to add app modes"),
            }
        }
        modes
    }
}
