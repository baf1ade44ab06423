//! Command system for user actions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // View commands
    pub const VIEW_TOGGLE_FULLSCREEN: &'static str = "view.toggle_fullscreen";
    pub const VIEW_EXIT_FULLSCREEN: &'static str = "view.exit_fullscreen";
    pub const VIEW_SWITCH_VIEWER: &'static str = "view.switch_viewer";

    // Navigation commands
    pub const NAV_BACK_TO_EXPLORER: &'static str = "nav.back_to_explorer";
    pub const NAV_HISTORY_BACK: &'static str = "nav.history_back";
    pub const NAV_HISTORY_FORWARD: &'static str = "nav.history_forward";

    // App commands
    pub const APP_EXIT: &'static str = "app.exit";

    pub const ALL: [&'static str; 7] = [
        Self::VIEW_TOGGLE_FULLSCREEN,
        Self::VIEW_EXIT_FULLSCREEN,
        Self::VIEW_SWITCH_VIEWER,
        Self::NAV_BACK_TO_EXPLORER,
        Self::NAV_HISTORY_BACK,
        Self::NAV_HISTORY_FORWARD,
        Self::APP_EXIT,
    ];

    pub fn is_known(&self) -> bool {
        Self::ALL.contains(&self.as_str())
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user action resolved from input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: CommandId,
}

impl Command {
    pub fn new(id: &str) -> Self {
        Self { id: CommandId::new(id) }
    }

    pub fn is(&self, id: &str) -> bool {
        self.id.as_str() == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;

    #[test]
    fn test_default_bindings_name_known_commands() {
        for id in AppConfig::default().keybindings.keys() {
            assert!(CommandId::new(id).is_known(), "unbound command id {}", id);
        }
    }

    #[test]
    fn test_command_matches_id() {
        let cmd = Command::new(CommandId::VIEW_SWITCH_VIEWER);
        assert!(cmd.is("view.switch_viewer"));
        assert!(!cmd.is(CommandId::APP_EXIT));
    }
}
