//! Translation capability handed to producers through their context.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Resolves a message key with `{name}` placeholders.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;
}

static ENGLISH: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("commands.actions.createNote", "Create note: {query}"),
        ("commands.actions.createDailyNote", "Create daily note"),
        ("commands.menuItems.signIn", "Sign in"),
        ("commands.menuItems.profile", "Profile"),
        ("commands.menuItems.clipboardHistory", "Clipboard history"),
        ("commands.menuItems.notes", "Notes"),
        ("commands.menuItems.clearNotes", "Clear notes"),
        ("commands.menuItems.clearHistory", "Clear history"),
        ("commands.menuItems.help", "Help"),
        ("commands.menuItems.settings", "Settings"),
        ("commands.menuItems.exit", "Exit"),
        ("commands.failures.completions", "Failed to fetch completions"),
        ("commands.failures.currency", "Failed to fetch currency rates"),
    ])
});

/// Message catalog keyed by message id. Unknown keys translate to themselves.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Built-in English messages.
    pub fn english() -> Self {
        Self {
            entries: ENGLISH.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect(),
        }
    }

    /// Override or add messages on top of the current catalog.
    pub fn with_entries<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.entries
            .extend(entries.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::english()
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self.entries.get(key) else {
            return key.to_string();
        };
        params.iter().fold(template.clone(), |message, (name, value)| {
            message.replace(&format!("{{{name}}}"), value)
        })
    }
}
