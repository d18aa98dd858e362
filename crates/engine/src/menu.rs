//! Static menu commands.

use std::fmt;
use std::str::FromStr;

use runbar_plugin::PluginContext;
use runbar_types::{AppMode, CommandHandler, ExecutableCommand, Priority, ValidationError};

/// Values carried by `SYSTEM` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCommand {
    SignIn,
    Profile,
    ClearNotes,
    ClearHistory,
    Help,
    Settings,
    Exit,
}

impl SystemCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignIn => "SIGN_IN",
            Self::Profile => "PROFILE",
            Self::ClearNotes => "CLEAR_NOTES",
            Self::ClearHistory => "CLEAR_HISTORY",
            Self::Help => "HELP",
            Self::Settings => "SETTINGS",
            Self::Exit => "EXIT",
        }
    }

    fn label_key(&self) -> &'static str {
        match self {
            Self::SignIn => "commands.menuItems.signIn",
            Self::Profile => "commands.menuItems.profile",
            Self::ClearNotes => "commands.menuItems.clearNotes",
            Self::ClearHistory => "commands.menuItems.clearHistory",
            Self::Help => "commands.menuItems.help",
            Self::Settings => "commands.menuItems.settings",
            Self::Exit => "commands.menuItems.exit",
        }
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s {
            "SIGN_IN" => Self::SignIn,
            "PROFILE" => Self::Profile,
            "CLEAR_NOTES" => Self::ClearNotes,
            "CLEAR_HISTORY" => Self::ClearHistory,
            "HELP" => Self::Help,
            "SETTINGS" => Self::Settings,
            "EXIT" => Self::Exit,
            _ => return Err(()),
        };
        Ok(command)
    }
}

const MENU_MODES: [AppMode; 2] = [AppMode::Initial, AppMode::Menu];

fn system(command: SystemCommand, context: &PluginContext) -> Result<ExecutableCommand, ValidationError> {
    let label = context.t(command.label_key(), &[]);
    ExecutableCommand::builder(label.clone(), command.as_str(), CommandHandler::System)
        .localized_label(label)
        .app_modes(MENU_MODES)
        .build()
}

fn change_mode(mode: AppMode, label_key: &str, context: &PluginContext) -> Result<ExecutableCommand, ValidationError> {
    let label = context.t(label_key, &[]);
    ExecutableCommand::builder(label.clone(), mode.as_str(), CommandHandler::ChangeMode)
        .localized_label(label)
        .app_modes(MENU_MODES)
        .priority(Priority::LOW)
        .build()
}

/// Menu entries for the current session. The clipboard entry is listed only
/// while clipboard recording is enabled.
pub fn menu_commands(context: &PluginContext, signed_in: bool) -> Result<Vec<ExecutableCommand>, ValidationError> {
    let account = if signed_in { SystemCommand::Profile } else { SystemCommand::SignIn };
    let mut commands = vec![system(account, context)?];
    if context.settings().clipboard_recording_enabled {
        commands.push(change_mode(AppMode::Clipboard, "commands.menuItems.clipboardHistory", context)?);
    }
    commands.push(change_mode(AppMode::Notes, "commands.menuItems.notes", context)?);
    for command in [
        SystemCommand::ClearNotes,
        SystemCommand::ClearHistory,
        SystemCommand::Help,
        SystemCommand::Settings,
        SystemCommand::Exit,
    ] {
        commands.push(system(command, context)?);
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runbar_plugin::PluginServices;
    use runbar_types::Settings;
    use std::sync::Arc;

    fn values(commands: &[ExecutableCommand]) -> Vec<&str> {
        commands.iter().map(|command| command.value.as_str()).collect()
    }

    #[test]
    fn signed_out_menu_offers_sign_in() {
        let context = PluginContext::offline("", AppMode::Menu);
        let commands = menu_commands(&context, false).unwrap();
        assert_eq!(
            values(&commands),
            vec!["SIGN_IN", "CLIPBOARD", "NOTES", "CLEAR_NOTES", "CLEAR_HISTORY", "HELP", "SETTINGS", "EXIT"]
        );
        assert_eq!(commands[0].label, "Sign in");
        assert_eq!(commands[1].handler, CommandHandler::ChangeMode);
    }

    #[test]
    fn signed_in_menu_offers_profile_and_hides_disabled_clipboard() {
        let settings = Settings {
            clipboard_recording_enabled: false,
            ..Settings::default()
        };
        let context = PluginServices::offline().snapshot("", AppMode::Menu, Arc::new(settings), Arc::from(Vec::new()));
        let commands = menu_commands(&context, true).unwrap();
        assert_eq!(commands[0].value, "PROFILE");
        assert!(!values(&commands).contains(&"CLIPBOARD"));
    }

    #[test]
    fn system_commands_round_trip_through_strings() {
        for command in [SystemCommand::SignIn, SystemCommand::ClearHistory, SystemCommand::Exit] {
            assert_eq!(command.as_str().parse::<SystemCommand>(), Ok(command));
        }
        assert!("REBOOT".parse::<SystemCommand>().is_err());
    }
}
