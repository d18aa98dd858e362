//! Built-in runbar plugins.
//!
//! | plugin              | dispatch  | modes   |
//! |---------------------|-----------|---------|
//! | [`ExactUrlPlugin`]  | inline    | INITIAL |
//! | [`NotesPlugin`]     | inline    | NOTES   |
//! | [`WebSearchPlugin`] | deferred  | INITIAL |
//! | [`NlpPlugin`]       | deferred  | INITIAL |
//! | [`FileSearchPlugin`]| debounced | INITIAL |

pub mod exact_url;
pub mod file_search;
pub mod nlp;
pub mod notes;
pub mod web_search;

use std::sync::Arc;

use runbar_plugin::{FileSearch, Plugin};

pub use exact_url::{ExactUrlPlugin, looks_like_hostname, normalize_url};
pub use file_search::FileSearchPlugin;
pub use nlp::NlpPlugin;
pub use notes::{NotesPlugin, create_note_command};
pub use web_search::{COMPLETIONS_MIN_QUERY_LEN, WebSearchPlugin, parse_completions};

/// The default plugin set in registration order. File search is included
/// only when the host provides a search backend.
pub fn builtin(file_search: Option<Arc<dyn FileSearch>>) -> Vec<Arc<dyn Plugin>> {
    let mut plugins: Vec<Arc<dyn Plugin>> = vec![
        Arc::new(ExactUrlPlugin),
        Arc::new(NlpPlugin::default()),
        Arc::new(WebSearchPlugin),
        Arc::new(NotesPlugin),
    ];
    if let Some(search) = file_search {
        plugins.push(Arc::new(FileSearchPlugin::new(search)));
    }
    plugins
}

#[cfg(test)]
mod tests {
    use super::*;
    use runbar_plugin::Dispatch;
    use runbar_types::AppMode;

    #[test]
    fn builtin_names_are_unique_and_routed() {
        let plugins = builtin(None);
        let names: Vec<&str> = plugins.iter().map(|plugin| plugin.name()).collect();
        assert_eq!(names, vec!["ExactUrl", "Nlp", "WebSearch", "Notes"]);

        let inline_initial: Vec<&str> = plugins
            .iter()
            .filter(|plugin| plugin.dispatch() == Dispatch::Inline && plugin.serves(&AppMode::Initial))
            .map(|plugin| plugin.name())
            .collect();
        assert_eq!(inline_initial, vec!["ExactUrl"]);
    }
}
