//! Theme and Colors
//!
//! The parley palette: green for the operator, magenta for the responder,
//! muted grays for chrome.

use ratatui::style::{Color, Modifier, Style};

/// Operator (user) accent
pub const USER_GREEN: Color = Color::Green;

/// Responder (bot) accent
pub const BOT_MAGENTA: Color = Color::Rgb(255, 95, 215);

/// Chrome: separators, timestamps, status line
pub const CHROME_GRAY: Color = Color::DarkGray;

/// Inline code spans
pub fn inline_code() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .bg(Color::Rgb(45, 45, 45))
}

/// Fenced code blocks
pub fn code_block() -> Style {
    Style::default()
        .fg(Color::Rgb(152, 195, 121))
        .bg(Color::Rgb(28, 28, 28))
}

/// Headings inside message bodies
pub fn heading() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

/// Timestamp line under each message
pub fn timestamp() -> Style {
    Style::default().fg(CHROME_GRAY)
}
