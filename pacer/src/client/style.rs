use std::io::IsTerminal;

use comfy_table::{Cell, Color as ComfyColor};
use crossterm::style::{style, Attribute, Color, Stylize};

use super::cli::ColorChoice;

/// OutputStyle wrapper for actual colors depending on the color choice.
/// Styles are enabled if the color mode is 'always', or if it's 'auto' and stdout is a tty.
#[derive(Debug, Clone)]
pub struct OutputStyle {
    /// Whether or not ANSI styling is enabled
    pub enabled: bool,
}

impl OutputStyle {
    pub fn new(color: &ColorChoice) -> Self {
        let enabled = match color {
            ColorChoice::Auto => std::io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        OutputStyle { enabled }
    }

    fn map_comfy_color(color: Color) -> ComfyColor {
        match color {
            Color::Green => ComfyColor::Green,
            Color::Red => ComfyColor::Red,
            Color::Yellow => ComfyColor::Yellow,
            Color::Grey => ComfyColor::Grey,
            _ => ComfyColor::White,
        }
    }

    /// This is a helper method with the purpose of easily styling text,
    /// while also prevent styling if we're printing to a non-tty output.
    pub fn style_text<T: ToString>(
        &self,
        text: T,
        color: Option<Color>,
        attribute: Option<Attribute>,
    ) -> String {
        let text = text.to_string();
        if !self.enabled {
            return text;
        }

        let mut styled = style(text);
        if let Some(color) = color {
            styled = styled.with(color);
        }
        if let Some(attribute) = attribute {
            styled = styled.attribute(attribute);
        }

        styled.to_string()
    }

    /// Same as [OutputStyle::style_text], but for comfy_table cells.
    pub fn styled_cell<T: ToString>(&self, text: T, color: Option<Color>) -> Cell {
        let cell = Cell::new(text.to_string());
        match color {
            Some(color) if self.enabled => cell.fg(Self::map_comfy_color(color)),
            _ => cell,
        }
    }
}
