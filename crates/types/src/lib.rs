//! Shared type definitions for the runbar query-resolution core.

pub mod command;
pub mod settings;

pub use command::{
    AppMode, CalendarMetadata, CommandBuilder, CommandHandler, CommandIdentity, CommandMetadata, ExecutableCommand,
    HistoryEntry, Priority, ValidationError,
};
pub use settings::{Note, SearchEngine, Settings};
