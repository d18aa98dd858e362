//! Plugin contract for the runbar core.
//!
//! Producers implement [`Plugin`] and advertise the capability segments they
//! support. The engine binds them to a [`PluginContext`] snapshot per call and
//! fans out through the [`PluginRegistry`].

pub mod collaborators;
pub mod context;
pub mod contract;
pub mod i18n;
pub mod instance;
pub mod registry;

pub use collaborators::{
    CommandExecutor, ExecError, ExecOutput, FailureReporter, FetchError, Fetcher, FileHit, FileSearch, LogFailures,
    NotesListing, OfflineExecutor, OfflineFetcher, ProcessExecutor, RecordedFailures, SourceError, StaticNotes,
};
pub use context::{PluginContext, PluginServices};
pub use contract::{
    AppModeContributor, CommandInterceptor, Dispatch, HandleOutcome, Plugin, PluginError, RegisterHook,
    SearchResultsProvider,
};
pub use i18n::{Catalog, Translator};
pub use instance::PluginInstance;
pub use registry::{PluginRegistry, RegistryError};
