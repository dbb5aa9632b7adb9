use ratatui::style::Color;

use crate::model::{Priority, TicketStatus, UiConfig};

/// Colors used by every panel
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub accent: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub blue: Color,
    pub selection_bg: Color,
    pub match_bg: Color,
    pub match_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x10, 0x16, 0x1F),
            text: Color::Rgb(0xC8, 0xD3, 0xE0),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            accent: Color::Rgb(0x3F, 0xC1, 0xC9),
            dim: Color::Rgb(0x6B, 0x7A, 0x8C),
            red: Color::Rgb(0xF0, 0x5D, 0x5E),
            yellow: Color::Rgb(0xF5, 0xC2, 0x42),
            green: Color::Rgb(0x5C, 0xD6, 0x8A),
            blue: Color::Rgb(0x5B, 0x9B, 0xF0),
            selection_bg: Color::Rgb(0x1F, 0x3A, 0x4D),
            match_bg: Color::Rgb(0xF5, 0xC2, 0x42),
            match_fg: Color::Rgb(0x10, 0x16, 0x1F),
        }
    }
}

/// Parse `#RRGGBB`
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

impl Theme {
    /// Defaults with `[ui.colors]` overrides applied. Unknown slots and
    /// malformed values are ignored.
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();
        for (slot, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                continue;
            };
            let target = match slot.as_str() {
                "background" => &mut theme.background,
                "text" => &mut theme.text,
                "text_bright" => &mut theme.text_bright,
                "accent" => &mut theme.accent,
                "dim" => &mut theme.dim,
                "red" => &mut theme.red,
                "yellow" => &mut theme.yellow,
                "green" => &mut theme.green,
                "blue" => &mut theme.blue,
                "selection_bg" => &mut theme.selection_bg,
                "match_bg" => &mut theme.match_bg,
                "match_fg" => &mut theme.match_fg,
                _ => continue,
            };
            *target = color;
        }
        theme
    }

    pub fn status_color(&self, status: TicketStatus) -> Color {
        match status {
            TicketStatus::Open => self.blue,
            TicketStatus::InProgress => self.yellow,
            TicketStatus::Closed => self.dim,
        }
    }

    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.red,
            Priority::Medium => self.yellow,
            Priority::Low => self.green,
        }
    }
}
