//! Turns a hostname-shaped query into a directly openable URL.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use runbar_plugin::{Dispatch, Plugin, PluginContext, PluginError, SearchResultsProvider};
use runbar_types::{CommandHandler, ExecutableCommand, Priority};

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}(?::\d{1,5})?(?:[/?#]\S*)?$")
        .expect("valid hostname pattern")
});

/// `true` for `example.com`, `https://docs.rs/regex`, `localhost.dev:8080`.
pub fn looks_like_hostname(query: &str) -> bool {
    HOSTNAME.is_match(query.trim())
}

/// Prefix `https://` unless the text already names a scheme.
pub fn normalize_url(query: &str) -> String {
    let query = query.trim();
    let lowered = query.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        query.to_string()
    } else {
        format!("https://{query}")
    }
}

#[derive(Debug, Default)]
pub struct ExactUrlPlugin;

#[async_trait]
impl SearchResultsProvider for ExactUrlPlugin {
    async fn add_search_results(&self, query: &str, _context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
        if !looks_like_hostname(query) {
            return Ok(Vec::new());
        }
        let label = query.trim();
        let command = ExecutableCommand::builder(label, normalize_url(label), CommandHandler::Url)
            .localized_label(label)
            .smart_match(true)
            .priority(Priority::TOP)
            .build()?;
        Ok(vec![command])
    }
}

impl Plugin for ExactUrlPlugin {
    fn name(&self) -> &str {
        "ExactUrl"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Inline
    }

    fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runbar_types::AppMode;

    #[test]
    fn recognises_hostnames() {
        assert!(looks_like_hostname("example.com"));
        assert!(looks_like_hostname("news.ycombinator.com"));
        assert!(looks_like_hostname("https://docs.rs/regex/latest"));
        assert!(looks_like_hostname("localhost.dev:8080"));
        assert!(!looks_like_hostname("2.5kg"));
        assert!(!looks_like_hostname("hello world.com"));
        assert!(!looks_like_hostname("firefox"));
        assert!(!looks_like_hostname("e.g"));
    }

    #[test]
    fn keeps_existing_schemes() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[tokio::test]
    async fn produces_a_top_priority_url() {
        let context = PluginContext::offline("example.com", AppMode::Initial);
        let results = ExactUrlPlugin.add_search_results("example.com", &context).await.unwrap();

        assert_eq!(results.len(), 1);
        let command = &results[0];
        assert_eq!(command.value, "https://example.com");
        assert_eq!(command.handler, CommandHandler::Url);
        assert_eq!(command.priority, Priority::TOP);
        assert!(command.smart_match);
        assert_eq!(command.app_modes, vec![AppMode::Initial]);
    }

    #[tokio::test]
    async fn ignores_other_queries() {
        let context = PluginContext::offline("calculator", AppMode::Initial);
        assert!(ExactUrlPlugin.add_search_results("calculator", &context).await.unwrap().is_empty());
    }
}
