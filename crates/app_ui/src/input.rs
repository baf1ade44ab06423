//! Input handling and keybinding resolution

use app_core::{Command, CommandId};
use std::collections::HashMap;
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{Key, ModifiersState, NamedKey};

/// Input handler that maps keys/mouse to commands
pub struct InputHandler {
    /// Key bindings: key string -> command ID
    bindings: HashMap<String, String>,

    /// Current modifier state
    modifiers: ModifiersState,
}

impl InputHandler {
    /// Create a new input handler with bindings
    pub fn new(bindings: HashMap<String, Vec<String>>) -> Self {
        // Invert the bindings map: command -> keys becomes key -> command
        let mut key_to_command = HashMap::new();

        for (command, keys) in bindings {
            if !CommandId::new(&command).is_known() {
                tracing::warn!("Ignoring bindings for unknown command {}", command);
                continue;
            }
            for key in keys {
                key_to_command.insert(key.to_lowercase(), command.clone());
            }
        }

        Self {
            bindings: key_to_command,
            modifiers: ModifiersState::empty(),
        }
    }

    /// Update modifier state
    pub fn update_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    /// Handle a key event and return the corresponding command
    pub fn handle_key(&self, event: &KeyEvent) -> Option<Command> {
        if event.state != ElementState::Pressed || event.repeat {
            return None;
        }

        let key = key_to_string(&event.logical_key)?;
        self.resolve(&key)
    }

    /// Look up `key` combined with the current modifiers
    pub fn resolve(&self, key: &str) -> Option<Command> {
        let full_key = self.build_key_string(key);
        tracing::debug!("Key pressed: {}", full_key);

        self.bindings
            .get(&full_key.to_lowercase())
            .map(|cmd_id| Command::new(cmd_id))
    }

    /// Build a key string with modifiers
    fn build_key_string(&self, key: &str) -> String {
        let mut parts = Vec::new();

        if self.modifiers.control_key() {
            parts.push("Ctrl");
        }
        if self.modifiers.alt_key() {
            parts.push("Alt");
        }
        if self.modifiers.shift_key() {
            parts.push("Shift");
        }
        if self.modifiers.super_key() {
            parts.push("Super");
        }

        parts.push(key);
        parts.join("+")
    }

    /// Mouse side buttons walk the viewer history
    pub fn handle_mouse_button(&self, button: MouseButton, state: ElementState) -> Option<Command> {
        if state != ElementState::Pressed {
            return None;
        }
        match button {
            MouseButton::Back => Some(Command::new(CommandId::NAV_HISTORY_BACK)),
            MouseButton::Forward => Some(Command::new(CommandId::NAV_HISTORY_FORWARD)),
            _ => None,
        }
    }
}

/// Convert a logical key to its binding name
fn key_to_string(key: &Key) -> Option<String> {
    let name = match key {
        Key::Named(named) => match named {
            NamedKey::Space => "Space".to_string(),
            NamedKey::Enter => "Return".to_string(),
            NamedKey::Tab => "Tab".to_string(),
            NamedKey::Escape => "Escape".to_string(),
            NamedKey::Backspace => "Backspace".to_string(),
            NamedKey::Delete => "Delete".to_string(),
            NamedKey::Home => "Home".to_string(),
            NamedKey::End => "End".to_string(),
            NamedKey::PageUp => "PageUp".to_string(),
            NamedKey::PageDown => "PageDown".to_string(),
            NamedKey::ArrowUp => "Up".to_string(),
            NamedKey::ArrowDown => "Down".to_string(),
            NamedKey::ArrowLeft => "Left".to_string(),
            NamedKey::ArrowRight => "Right".to_string(),
            NamedKey::F11 => "F11".to_string(),
            NamedKey::F12 => "F12".to_string(),
            _ => format!("{:?}", named),
        },
        Key::Character(c) => c.to_string(),
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::AppConfig;

    fn handler() -> InputHandler {
        InputHandler::new(AppConfig::default().keybindings)
    }

    #[test]
    fn test_default_bindings() {
        let input = handler();
        assert!(input.resolve("F11").unwrap().is(CommandId::VIEW_TOGGLE_FULLSCREEN));
        assert!(input.resolve("Escape").unwrap().is(CommandId::VIEW_EXIT_FULLSCREEN));
        assert!(input.resolve("Tab").unwrap().is(CommandId::VIEW_SWITCH_VIEWER));
        assert!(input.resolve("F").unwrap().is(CommandId::VIEW_TOGGLE_FULLSCREEN));
        assert!(input.resolve("Left").is_none());
    }

    #[test]
    fn test_modifiers_are_part_of_the_key() {
        let mut input = handler();
        input.update_modifiers(ModifiersState::ALT);
        assert!(input.resolve("Left").unwrap().is(CommandId::NAV_HISTORY_BACK));
        assert!(input.resolve("Right").unwrap().is(CommandId::NAV_HISTORY_FORWARD));
        assert!(input.resolve("F11").is_none());

        input.update_modifiers(ModifiersState::CONTROL);
        assert!(input.resolve("q").unwrap().is(CommandId::APP_EXIT));
        assert_eq!(input.build_key_string("q"), "Ctrl+q");
    }

    #[test]
    fn test_unknown_commands_dropped() {
        let mut bindings = HashMap::new();
        bindings.insert("file.delete".to_string(), vec!["Delete".to_string()]);
        bindings.insert(CommandId::APP_EXIT.to_string(), vec!["Ctrl+Q".to_string()]);

        let mut input = InputHandler::new(bindings);
        assert!(input.resolve("Delete").is_none());
        input.update_modifiers(ModifiersState::CONTROL);
        assert!(input.resolve("q").is_some());
    }

    #[test]
    fn test_mouse_side_buttons() {
        let input = handler();
        let back = input.handle_mouse_button(MouseButton::Back, ElementState::Pressed);
        assert!(back.unwrap().is(CommandId::NAV_HISTORY_BACK));
        assert!(input
            .handle_mouse_button(MouseButton::Forward, ElementState::Released)
            .is_none());
        assert!(input
            .handle_mouse_button(MouseButton::Left, ElementState::Pressed)
            .is_none());
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_to_string(&Key::Named(NamedKey::ArrowLeft)).as_deref(), Some("Left"));
        assert_eq!(key_to_string(&Key::Named(NamedKey::Enter)).as_deref(), Some("Return"));
        assert_eq!(key_to_string(&Key::Character("f".into())).as_deref(), Some("f"));
    }
}
