//! Utilities shared across the runbar crates: fuzzy matching, persistence for
//! run history and settings, and tracing setup.

pub mod history_store;
pub mod logging;
pub mod path_processing;
pub mod settings_store;
pub mod text_processing;

pub use history_store::{HistoryStore, HistoryStoreError, InMemoryHistoryStore, JsonHistoryStore};
pub use logging::init_tracing;
pub use path_processing::expand_tilde;
pub use settings_store::{SettingsError, UserSettings};
pub use text_processing::{FuzzyQuery, best_fuzzy_score, fuzzy_score};
