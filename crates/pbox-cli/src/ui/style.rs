//! Message styling for CLI output.
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Suggestion | Cyan |
//! | `[skip]` | Nothing done | Dim |

use owo_colors::OwoColorize;
use pbox_core::ConfigState;

use super::color::ColorMode;

/// Message type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Ok,
    Err,
    Warn,
    Info,
    Hint,
    Skip,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
            Self::Skip => "[skip]",
        }
    }
}

/// Styling interface shared by every command handler.
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Style {
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// Format a message with a type prefix, e.g. `[ok] Opened experiment`.
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if !self.colors_enabled() {
            return format!("{} {}", prefix, text);
        }
        let colored_prefix = match msg_type {
            MessageType::Ok => prefix.green().to_string(),
            MessageType::Err => prefix.red().to_string(),
            MessageType::Warn => prefix.yellow().to_string(),
            MessageType::Info => prefix.blue().to_string(),
            MessageType::Hint => prefix.cyan().to_string(),
            MessageType::Skip => prefix.dimmed().to_string(),
        };
        format!("{} {}", colored_prefix, text)
    }

    /// Format a detail line following a message (5-space indentation).
    pub fn message_detail(&self, label: &str, value: &str) -> String {
        format!("     {}: {}", label, value)
    }

    /// Format a section header.
    pub fn section(&self, title: &str) -> String {
        if self.colors_enabled() {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format an error with optional cause and hint lines.
    pub fn error_with_context(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut output = self.message(MessageType::Err, msg);
        if let Some(cause) = cause {
            output.push_str(&format!("\n      Cause: {}", cause));
        }
        if let Some(hint) = hint {
            output.push_str(&format!("\n      Hint: {}", hint));
        }
        output
    }

    /// Format a list item, e.g. `  - upx-only`.
    pub fn list_item(&self, marker: &str, text: &str) -> String {
        format!("  {} {}", marker, text)
    }

    /// Format a file path (cyan).
    pub fn file_path(&self, path: &str) -> String {
        if self.colors_enabled() {
            path.cyan().to_string()
        } else {
            path.to_string()
        }
    }

    /// Label of a configuration state: `overridden` (yellow) or `inherited` (dim).
    pub fn config_state(&self, state: &ConfigState) -> String {
        let label = if state.is_overridden() { "overridden" } else { "inherited" };
        if !self.colors_enabled() {
            return label.to_string();
        }
        if state.is_overridden() {
            label.yellow().to_string()
        } else {
            label.dimmed().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_message_type_prefix() {
        assert_eq!(MessageType::Ok.prefix(), "[ok]");
        assert_eq!(MessageType::Err.prefix(), "[err]");
        assert_eq!(MessageType::Skip.prefix(), "[skip]");
    }

    #[test]
    fn test_message_no_color() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.message(MessageType::Ok, "Opened"), "[ok] Opened");
        assert_eq!(style.message(MessageType::Warn, "Careful"), "[warn] Careful");
    }

    #[test]
    fn test_error_with_context() {
        let style = Style::new(ColorMode::Never);
        let output = style.error_with_context("No experiment is open", None, Some("Run `experiment open <name>`"));
        assert!(output.starts_with("[err] No experiment is open"));
        assert!(!output.contains("Cause:"));
        assert!(output.contains("Hint: Run `experiment open <name>`"));
    }

    #[test]
    fn test_config_state_label() {
        let style = Style::new(ColorMode::Never);
        let state = ConfigState::Overridden(PathBuf::from("conf/packers.conf"));
        assert_eq!(style.config_state(&state), "overridden");
        let state = ConfigState::Inherited(PathBuf::from("/g/packers.yml"));
        assert_eq!(style.config_state(&state), "inherited");
    }
}
