//! Terminal rendering of messages.

use chrono::{DateTime, Local, Utc};
use crossterm::style::{Color, Stylize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use pidima_core::{Author, Message, MessageStatus, Theme};

/// Colors for one theme.
#[derive(Debug, Clone)]
pub struct Palette {
    /// Assistant name and prompts
    pub accent: Color,
    /// Read receipts
    pub success: Color,
    /// Timestamps, pending receipts, typing indicator
    pub muted: Color,
    /// User name
    pub user: Color,
    /// Message bodies
    pub text: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                accent: Color::Magenta,
                success: Color::Green,
                muted: Color::DarkGrey,
                user: Color::Cyan,
                text: Color::White,
            },
            Theme::Light => Self {
                accent: Color::DarkMagenta,
                success: Color::DarkGreen,
                muted: Color::Grey,
                user: Color::DarkBlue,
                text: Color::Black,
            },
        }
    }
}

/// Local wall-clock time as `HH:MM`.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// Receipt glyph: • sent, ✓ delivered, ✓✓ read.
pub fn status_icon(status: MessageStatus) -> &'static str {
    match status {
        MessageStatus::Sent => "•",
        MessageStatus::Delivered => "✓",
        MessageStatus::Read => "✓✓",
    }
}

/// Styled receipt for a user message.
pub fn status_badge(status: MessageStatus, palette: &Palette) -> String {
    let color = if status == MessageStatus::Read {
        palette.success
    } else {
        palette.muted
    };
    status_icon(status).with(color).to_string()
}

/// Header line plus wrapped body for one message.
pub fn message_lines(message: &Message, palette: &Palette, width: usize) -> Vec<String> {
    let name = match message.author {
        Author::User => "You".with(palette.user).bold(),
        Author::Assistant => "Pidima".with(palette.accent).bold(),
    };

    let mut header = format!(
        "{} {}",
        name,
        format_time(message.created_at).with(palette.muted)
    );
    if message.author == Author::User {
        header.push(' ');
        header.push_str(&status_badge(message.status, palette));
    }

    let mut lines = vec![header];
    for line in wrap_text_indented(&message.text, width, "  ") {
        lines.push(line.with(palette.text).to_string());
    }
    lines
}

/// Wrap `text` at word boundaries so each line, indent included, fits `width`
/// display columns. Words wider than the line are split.
pub fn wrap_text_indented(text: &str, width: usize, indent: &str) -> Vec<String> {
    let indent_width = indent.width();
    let available = width.saturating_sub(indent_width).max(1);

    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_width = 0;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word_width = word.width();
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + 1 + word_width
            };

            if needed <= available {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_width = needed;
                continue;
            }

            if !current.is_empty() {
                lines.push(format!("{}{}", indent, current));
                current.clear();
                current_width = 0;
            }

            // Split words that cannot fit on a line of their own
            for ch in word.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1);
                if current_width + ch_width > available && !current.is_empty() {
                    lines.push(format!("{}{}", indent, current));
                    current.clear();
                    current_width = 0;
                }
                current.push(ch);
                current_width += ch_width;
            }
        }

        lines.push(format!("{}{}", indent, current));
    }

    if lines.is_empty() {
        lines.push(indent.to_string());
    }

    lines
}
