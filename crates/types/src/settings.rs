use std::fmt;

use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Default endpoint for exchange-rate tables; `{base}` is replaced with the
/// lowercase source currency code.
pub const DEFAULT_CURRENCY_RATES_URL: &str =
    "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/{base}.json";

/// Default endpoint for search suggestions; `{query}` is replaced with the
/// percent-encoded query.
pub const DEFAULT_COMPLETIONS_URL: &str = "https://www.startpage.com/osuggestions?q={query}";

/// Search engine used for literal and suggested web searches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchEngine {
    #[default]
    Duckduckgo,
    Startpage,
    Google,
    Scira,
}

impl SearchEngine {
    fn base_url(&self) -> &'static str {
        match self {
            Self::Duckduckgo => "https://duckduckgo.com/?q=",
            Self::Startpage => "https://www.startpage.com/do/search?q=",
            Self::Google => "https://www.google.com/search?q=",
            Self::Scira => "https://scira.com/search?q=",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Duckduckgo => "DuckDuckGo",
            Self::Startpage => "Startpage",
            Self::Google => "Google",
            Self::Scira => "Scira",
        };
        f.write_str(name)
    }
}

/// User settings snapshot consumed by the engine and plugins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Lowercase ISO code used when a currency query names only one currency.
    pub base_currency: String,
    pub search_engine: SearchEngine,
    /// Suppresses run-history recording.
    pub incognito_enabled: bool,
    pub clipboard_recording_enabled: bool,
    pub fs_search_enabled: bool,
    /// Extensions searched in addition to the platform defaults.
    pub fs_search_extensions: Vec<String>,
    pub fs_search_home_only: bool,
    pub currency_rates_url: String,
    pub completions_url: String,
    pub locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: "usd".into(),
            search_engine: SearchEngine::default(),
            incognito_enabled: false,
            clipboard_recording_enabled: true,
            fs_search_enabled: true,
            fs_search_extensions: Vec::new(),
            fs_search_home_only: true,
            currency_rates_url: DEFAULT_CURRENCY_RATES_URL.into(),
            completions_url: DEFAULT_COMPLETIONS_URL.into(),
            locale: "en".into(),
        }
    }
}

impl Settings {
    /// Search URL for `query` on the configured engine.
    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}", self.search_engine.base_url(), encode_component(query))
    }

    pub fn completions_url_for(&self, query: &str) -> String {
        self.completions_url.replace("{query}", &encode_component(query))
    }

    pub fn currency_rates_url_for(&self, base: &str) -> String {
        self.currency_rates_url.replace("{base}", &base.to_lowercase())
    }
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// A note as reported by the notes listing collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub title: String,
    pub filename: String,
    pub path: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        let settings = Settings {
            search_engine: SearchEngine::Google,
            ..Settings::default()
        };
        assert_eq!(settings.search_url("rust lang"), "https://www.google.com/search?q=rust%20lang");
    }

    #[test]
    fn partial_settings_json_falls_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"baseCurrency":"pln","searchEngine":"SCIRA"}"#).unwrap();
        assert_eq!(settings.base_currency, "pln");
        assert_eq!(settings.search_engine, SearchEngine::Scira);
        assert!(settings.clipboard_recording_enabled);
        assert_eq!(settings.locale, "en");
    }

    #[test]
    fn rates_url_uses_lowercase_base() {
        let settings = Settings::default();
        assert!(settings.currency_rates_url_for("EUR").ends_with("/currencies/eur.json"));
    }
}
