//! The executable command model shared by every producer and the ranking engine.
//!
//! An [`ExecutableCommand`] is the single unit of output for the launcher: the
//! interpreter, plugins, local sources and history all produce commands, and the
//! engine ranks and deduplicates them by their `(handler, value)` identity.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised when a command fails structural validation.
///
/// These indicate a bug in whichever producer constructed the command rather
/// than bad user input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("command '{label}' must be eligible in at least one app mode")]
    EmptyAppModes { label: String },
    #[error("extension handler tag must not be empty")]
    EmptyExtensionHandler,
    #[error("custom app mode identifier must not be empty")]
    EmptyCustomMode,
}

/// Tag describing which executor consumes a command's `value`.
///
/// The core set is closed; plugins introduce their own tags through
/// [`CommandHandler::Extension`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandHandler {
    System,
    App,
    ChangeMode,
    CopyToClipboard,
    RunShortcut,
    OpenNote,
    CreateNote,
    Url,
    EmbeddedUrl,
    FsItem,
    OpenCalendar,
    FormulaResult,
    /// Plugin-defined handler carrying an opaque, non-empty tag.
    Extension(String),
}

impl CommandHandler {
    /// Build a plugin-defined handler, rejecting blank tags.
    pub fn extension(tag: impl Into<String>) -> Result<Self, ValidationError> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(ValidationError::EmptyExtensionHandler);
        }
        Ok(Self::Extension(tag))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "SYSTEM",
            Self::App => "APP",
            Self::ChangeMode => "CHANGE_MODE",
            Self::CopyToClipboard => "COPY_TO_CLIPBOARD",
            Self::RunShortcut => "RUN_SHORTCUT",
            Self::OpenNote => "OPEN_NOTE",
            Self::CreateNote => "CREATE_NOTE",
            Self::Url => "URL",
            Self::EmbeddedUrl => "EMBEDDED_URL",
            Self::FsItem => "FS_ITEM",
            Self::OpenCalendar => "OPEN_CALENDAR",
            Self::FormulaResult => "FORMULA_RESULT",
            Self::Extension(tag) => tag,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Extension(tag) if tag.trim().is_empty() => Err(ValidationError::EmptyExtensionHandler),
            _ => Ok(()),
        }
    }
}

impl FromStr for CommandHandler {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SYSTEM" => Self::System,
            "APP" => Self::App,
            "CHANGE_MODE" => Self::ChangeMode,
            "COPY_TO_CLIPBOARD" => Self::CopyToClipboard,
            "RUN_SHORTCUT" => Self::RunShortcut,
            "OPEN_NOTE" => Self::OpenNote,
            "CREATE_NOTE" => Self::CreateNote,
            "URL" => Self::Url,
            "EMBEDDED_URL" => Self::EmbeddedUrl,
            "FS_ITEM" => Self::FsItem,
            "OPEN_CALENDAR" => Self::OpenCalendar,
            "FORMULA_RESULT" => Self::FormulaResult,
            other => Self::Extension(other.to_string()),
        })
    }
}

impl fmt::Display for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CommandHandler {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CommandHandler {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let handler = raw.parse::<CommandHandler>().unwrap_or_else(|never| match never {});
        handler.validate().map_err(serde::de::Error::custom)?;
        Ok(handler)
    }
}

/// UI mode in which a command is eligible to be shown.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AppMode {
    Initial,
    Menu,
    Notes,
    Clipboard,
    Calendar,
    /// Mode contributed by a plugin through `add_app_modes`.
    Custom(String),
}

impl AppMode {
    pub fn custom(identifier: impl Into<String>) -> Result<Self, ValidationError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(ValidationError::EmptyCustomMode);
        }
        Ok(Self::Custom(identifier))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Initial => "INITIAL",
            Self::Menu => "MENU",
            Self::Notes => "NOTES",
            Self::Clipboard => "CLIPBOARD",
            Self::Calendar => "CALENDAR",
            Self::Custom(identifier) => identifier,
        }
    }
}

impl FromStr for AppMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "INITIAL" => Self::Initial,
            "MENU" => Self::Menu,
            "NOTES" => Self::Notes,
            "CLIPBOARD" => Self::Clipboard,
            "CALENDAR" => Self::Calendar,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse::<AppMode>().unwrap_or_else(|never| match never {}) {
            AppMode::Custom(identifier) => AppMode::custom(identifier).map_err(serde::de::Error::custom),
            mode => Ok(mode),
        }
    }
}

/// Integer ranking tier; higher tiers are listed first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOW: Priority = Priority(0);
    pub const MEDIUM: Priority = Priority(10);
    pub const HIGH: Priority = Priority(100);
    pub const TOP: Priority = Priority(1000);
}

/// Calendar event details attached to `OPEN_CALENDAR` commands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMetadata {
    pub event_id: String,
    pub calendar_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
}

/// Optional bag of producer-specific details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Filesystem path for app, note and file results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Last time the command was executed; set on history entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ran_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarMetadata>,
}

impl CommandMetadata {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// Identity used for deduplication and history removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandIdentity<'a> {
    pub handler: &'a CommandHandler,
    pub value: &'a str,
}

/// The universal result unit produced for a query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableCommand {
    /// Display text.
    pub label: String,
    /// Localized display text; matched alongside `label`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_label: Option<String>,
    /// Payload consumed by the handler (URL, app path, answer text, ...).
    pub value: String,
    pub handler: CommandHandler,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CommandMetadata>,
    /// Modes in which the command may be listed. Never empty.
    pub app_modes: Vec<AppMode>,
    /// Deterministic answer that bypasses fuzzy filtering.
    #[serde(default)]
    pub smart_match: bool,
    #[serde(default)]
    pub priority: Priority,
}

impl ExecutableCommand {
    /// Start building a command eligible in [`AppMode::Initial`] by default.
    pub fn builder(label: impl Into<String>, value: impl Into<String>, handler: CommandHandler) -> CommandBuilder {
        CommandBuilder {
            command: ExecutableCommand {
                label: label.into(),
                localized_label: None,
                value: value.into(),
                handler,
                metadata: None,
                app_modes: vec![AppMode::Initial],
                smart_match: false,
                priority: Priority::LOW,
            },
        }
    }

    pub fn identity(&self) -> CommandIdentity<'_> {
        CommandIdentity {
            handler: &self.handler,
            value: &self.value,
        }
    }

    pub fn is_eligible_in(&self, mode: &AppMode) -> bool {
        self.app_modes.contains(mode)
    }

    /// Text keys used for fuzzy matching, localized label first.
    pub fn match_keys(&self) -> impl Iterator<Item = &str> {
        self.localized_label.as_deref().into_iter().chain(std::iter::once(self.label.as_str()))
    }

    pub fn ran_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.as_ref().and_then(|metadata| metadata.ran_at)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_modes.is_empty() {
            return Err(ValidationError::EmptyAppModes { label: self.label.clone() });
        }
        self.handler.validate()?;
        for mode in &self.app_modes {
            if let AppMode::Custom(identifier) = mode
                && identifier.trim().is_empty()
            {
                return Err(ValidationError::EmptyCustomMode);
            }
        }
        Ok(())
    }
}

/// Builder returned by [`ExecutableCommand::builder`].
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    command: ExecutableCommand,
}

impl CommandBuilder {
    pub fn localized_label(mut self, localized_label: impl Into<String>) -> Self {
        self.command.localized_label = Some(localized_label.into());
        self
    }

    pub fn metadata(mut self, metadata: CommandMetadata) -> Self {
        self.command.metadata = Some(metadata);
        self
    }

    /// Replace the eligible modes.
    pub fn app_modes(mut self, modes: impl IntoIterator<Item = AppMode>) -> Self {
        self.command.app_modes = modes.into_iter().collect();
        self
    }

    pub fn smart_match(mut self, smart_match: bool) -> Self {
        self.command.smart_match = smart_match;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.command.priority = priority;
        self
    }

    pub fn build(self) -> Result<ExecutableCommand, ValidationError> {
        self.command.validate()?;
        Ok(self.command)
    }
}

/// A run-history record: a command without its display label, stamped with
/// the time it was last executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Text shown when the entry is listed; the localized label when present.
    pub display_label: String,
    pub value: String,
    pub handler: CommandHandler,
    #[serde(default)]
    pub metadata: CommandMetadata,
    pub app_modes: Vec<AppMode>,
    #[serde(default)]
    pub priority: Priority,
}

impl HistoryEntry {
    pub fn from_command(command: &ExecutableCommand, ran_at: DateTime<Utc>) -> Self {
        let mut metadata = command.metadata.clone().unwrap_or_default();
        metadata.ran_at = Some(ran_at);
        Self {
            display_label: command.localized_label.clone().unwrap_or_else(|| command.label.clone()),
            value: command.value.clone(),
            handler: command.handler.clone(),
            metadata,
            app_modes: command.app_modes.clone(),
            priority: command.priority,
        }
    }

    pub fn identity(&self) -> CommandIdentity<'_> {
        CommandIdentity {
            handler: &self.handler,
            value: &self.value,
        }
    }

    pub fn ran_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.ran_at
    }

    /// Rehydrate the entry as a listable command.
    pub fn to_command(&self) -> ExecutableCommand {
        ExecutableCommand {
            label: self.display_label.clone(),
            localized_label: None,
            value: self.value.clone(),
            handler: self.handler.clone(),
            metadata: Some(self.metadata.clone()),
            app_modes: if self.app_modes.is_empty() {
                vec![AppMode::Initial]
            } else {
                self.app_modes.clone()
            },
            smart_match: false,
            priority: self.priority,
        }
    }
}
