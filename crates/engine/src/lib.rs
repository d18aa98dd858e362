//! # Runbar Engine
//!
//! Turns the text typed into the launcher into a ranked list of executable
//! commands.
//!
//! Every query change starts a new build cycle. The engine collects what is
//! available immediately (run history, installed apps, OS shortcuts, inline
//! plugins, the offline interpreter), ranks it and publishes the list. Slower
//! producers are then dispatched: deferred plugins right away, filesystem
//! search after a debounce. Each completion re-ranks and republishes while its
//! cycle is still current, so late results never leak into a newer query.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use runbar_engine::{BuildRequest, CommandEngine};
//! use runbar_types::AppMode;
//!
//! # async fn run() -> Result<(), runbar_engine::EngineError> {
//! let engine = CommandEngine::builder().builtin_plugins(None).build()?;
//! engine.initialize().await?;
//!
//! let mut updates = engine.subscribe();
//! let first = engine.build(BuildRequest::new("2 + 2", AppMode::Initial)).await?;
//! println!("{}", first.commands[0].label);
//!
//! while updates.changed().await.is_ok() {
//!     let refined = updates.borrow_and_update().clone();
//!     println!("{} commands for {:?}", refined.commands.len(), refined.query);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`engine`**: the [`CommandEngine`] facade and its builder
//! - **`aggregator`**: per-mode candidate collection
//! - **`ranking`**: fuzzy filtering, deduplication and priority ordering
//! - **`cancellation`** / **`scheduler`**: build cycles and the debounce timer
//! - **`sources`**: apps, OS shortcuts and clipboard history
//! - **`history`**: run history recording rules
//! - **`menu`**: the MENU mode system commands

pub mod aggregator;
pub mod cancellation;
pub mod engine;
pub mod history;
pub mod menu;
pub mod ranking;
pub mod scheduler;
pub mod sources;

pub use aggregator::SourceAggregator;
pub use cancellation::{CancellationCoordinator, CancellationToken};
pub use engine::{BuildRequest, CommandEngine, CommandEngineBuilder, EngineConfig, EngineError, RankedCommands};
pub use history::CommandHistory;
pub use menu::{SystemCommand, menu_commands};
pub use ranking::rank;
pub use scheduler::Scheduler;
pub use sources::{
    AppEntry, AppIndex, ClipboardHistory, ExecShortcuts, InMemoryClipboardHistory, ShortcutSource, StaticApps,
    clipboard_commands, shortcut_command,
};
