//! Application theming

use app_core::GeneralConfig;
use egui::{Color32, Visuals};

/// Application theme
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub background: Color32,
    pub surface: Color32,
    pub primary: Color32,
    pub text: Color32,
    pub accent: Color32,
    pub error: Color32,
}

impl Theme {
    /// Light dashboard theme (default)
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color32::from_rgb(241, 245, 249),
            surface: Color32::from_rgb(255, 255, 255),
            primary: Color32::from_rgb(226, 232, 240),
            text: Color32::from_rgb(28, 36, 52),
            accent: Color32::from_rgb(60, 80, 224),
            error: Color32::from_rgb(220, 38, 38),
        }
    }

    /// Dark dashboard theme
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            background: Color32::from_rgb(26, 34, 44),
            surface: Color32::from_rgb(36, 48, 63),
            primary: Color32::from_rgb(51, 65, 85),
            text: Color32::from_rgb(240, 240, 240),
            accent: Color32::from_rgb(60, 80, 224),
            error: Color32::from_rgb(220, 80, 80),
        }
    }

    /// Apply theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        let mut visuals = if self.name == "dark" {
            Visuals::dark()
        } else {
            Visuals::light()
        };

        visuals.panel_fill = self.surface;
        visuals.window_fill = self.surface;
        visuals.extreme_bg_color = self.background;
        visuals.faint_bg_color = self.primary;
        visuals.error_fg_color = self.error;

        visuals.widgets.noninteractive.bg_fill = self.surface;
        visuals.widgets.noninteractive.fg_stroke.color = self.text;

        visuals.widgets.inactive.bg_fill = self.primary;
        visuals.widgets.inactive.weak_bg_fill = self.primary;
        visuals.widgets.inactive.fg_stroke.color = self.text;

        visuals.widgets.hovered.bg_fill = self.accent.linear_multiply(0.3);
        visuals.widgets.hovered.fg_stroke.color = self.text;

        visuals.widgets.active.bg_fill = self.accent.linear_multiply(0.5);
        visuals.widgets.active.fg_stroke.color = self.text;

        visuals.selection.bg_fill = self.accent.linear_multiply(0.3);
        visuals.selection.stroke.color = self.accent;

        style.visuals = visuals;
        ctx.set_style(style);
    }

    /// Get theme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    /// Theme named in `[general]`, with the accent override applied
    pub fn from_config(general: &GeneralConfig) -> Self {
        let mut theme = Self::by_name(&general.theme);
        if let Some(hex) = &general.accent {
            match Self::parse_color(hex) {
                Some(color) => theme.accent = color,
                None => tracing::warn!("Ignoring invalid accent colour {:?}", hex),
            }
        }
        theme
    }

    /// Parse a hex color string
    pub fn parse_color(hex: &str) -> Option<Color32> {
        let hex = hex.trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            6 => Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Color32::from_rgba_unmultiplied(channel(2)?, channel(4)?, channel(6)?, channel(0)?)),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_defaults_to_light() {
        assert_eq!(Theme::by_name("DARK").name, "dark");
        assert_eq!(Theme::by_name("light").name, "light");
        assert_eq!(Theme::by_name("solarized").name, "light");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(Theme::parse_color("#3C50E0"), Some(Color32::from_rgb(60, 80, 224)));
        assert_eq!(Theme::parse_color("ff000000"), Some(Color32::from_rgba_unmultiplied(0, 0, 0, 255)));
        assert_eq!(Theme::parse_color("#12345"), None);
        assert_eq!(Theme::parse_color("#zz0000"), None);
        assert_eq!(Theme::parse_color("#éé0000"), None);
    }

    #[test]
    fn test_accent_override() {
        let mut general = GeneralConfig::default();
        general.accent = Some("#10B981".to_string());
        assert_eq!(Theme::from_config(&general).accent, Color32::from_rgb(16, 185, 129));

        general.theme = "dark".to_string();
        general.accent = Some("teal".to_string());
        let theme = Theme::from_config(&general);
        assert_eq!(theme.name, "dark");
        assert_eq!(theme.accent, Theme::dark().accent);
    }
}
