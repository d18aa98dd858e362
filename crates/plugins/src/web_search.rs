//! Web search: live completions and a create-note shortcut. The literal
//! search is a fallback for when no completion came back, and is left out for
//! hostname-shaped queries, which the exact URL plugin already opens.

use async_trait::async_trait;
use runbar_plugin::{Dispatch, Plugin, PluginContext, PluginError, SearchResultsProvider};
use runbar_types::{CommandHandler, ExecutableCommand, Priority, Settings, ValidationError};
use serde_json::Value;
use tracing::{debug, warn};

use crate::exact_url::looks_like_hostname;
use crate::notes::create_note_command;

/// Completions are only requested once the query is this long.
pub const COMPLETIONS_MIN_QUERY_LEN: usize = 3;

/// Accepts both `["a", "b"]` and `["query", ["a", "b"]]` suggestion bodies.
pub fn parse_completions(body: &Value) -> Vec<String> {
    let Some(items) = body.as_array() else {
        return Vec::new();
    };
    let list = match items.as_slice() {
        [Value::String(_), Value::Array(nested)] => nested,
        _ => items,
    };
    list.iter().filter_map(Value::as_str).map(str::to_string).collect()
}

fn search_command(label: &str, settings: &Settings, priority: Priority) -> Result<ExecutableCommand, ValidationError> {
    ExecutableCommand::builder(label, settings.search_url(label), CommandHandler::Url)
        .localized_label(label)
        .priority(priority)
        .build()
}

#[derive(Debug, Default)]
pub struct WebSearchPlugin;

impl WebSearchPlugin {
    async fn completions(&self, query: &str, context: &PluginContext) -> Vec<String> {
        let url = context.settings().completions_url_for(query);
        match context.fetch_json(&url).await {
            Ok(body) => parse_completions(&body),
            Err(error) => {
                warn!(%error, "completions request failed");
                context.fail(&context.t("commands.failures.completions", &[]));
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SearchResultsProvider for WebSearchPlugin {
    async fn add_search_results(&self, query: &str, context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
        let settings = context.settings();

        let mut commands = Vec::new();
        if query.chars().count() >= COMPLETIONS_MIN_QUERY_LEN {
            let completions = self.completions(query, context).await;
            debug!(count = completions.len(), "fetched completions");
            for completion in completions.iter().filter(|completion| completion.as_str() != query) {
                commands.push(search_command(completion, settings, Priority::LOW)?);
            }
        }
        if commands.is_empty() && !looks_like_hostname(query) {
            commands.push(search_command(query, settings, Priority::MEDIUM)?);
        }
        if !query.is_empty() {
            commands.push(create_note_command(query, context)?);
        }
        Ok(commands)
    }
}

impl Plugin for WebSearchPlugin {
    fn name(&self) -> &str {
        "WebSearch"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Deferred
    }

    fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
        Some(self)
    }
}
