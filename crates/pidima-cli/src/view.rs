//! Terminal view: prints conversation events as they happen.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crossterm::style::Stylize;

use pidima_core::{ConversationObserver, Message, MessageId, MessageStatus, Theme};

use crate::render::{self, Palette};

/// Fallback width when stdout is not a terminal.
const DEFAULT_WIDTH: usize = 80;

/// Presentation state owned by the terminal front end.
pub struct ChatView {
    /// Palette for the current theme.
    palette: Mutex<Palette>,

    /// Live events are printed only after the initial history render.
    live: AtomicBool,
}

impl ChatView {
    pub fn new(theme: Theme) -> Self {
        Self {
            palette: Mutex::new(Palette::for_theme(theme)),
            live: AtomicBool::new(false),
        }
    }

    /// Switch palettes.
    pub fn set_theme(&self, theme: Theme) {
        *self.palette() = Palette::for_theme(theme);
    }

    /// Start printing conversation events.
    pub fn go_live(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    /// Print a full log.
    pub fn print_history(&self, messages: &[Message]) {
        for message in messages {
            self.print_message(message);
        }
    }

    /// Print a muted informational line.
    pub fn notice(&self, text: &str) {
        let palette = self.palette().clone();
        write_lines(&[text.with(palette.muted).italic().to_string()]);
    }

    fn print_message(&self, message: &Message) {
        let palette = self.palette().clone();
        let mut lines = render::message_lines(message, &palette, terminal_width());
        lines.push(String::new());
        write_lines(&lines);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn palette(&self) -> std::sync::MutexGuard<'_, Palette> {
        self.palette.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ConversationObserver for ChatView {
    fn on_message_appended(&self, message: &Message) {
        if self.is_live() {
            self.print_message(message);
        }
    }

    fn on_status_updated(&self, _id: &MessageId, status: MessageStatus) {
        if !self.is_live() {
            return;
        }
        let palette = self.palette().clone();
        let line = format!(
            "  {} {}",
            render::status_badge(status, &palette),
            status.as_str().with(palette.muted)
        );
        write_lines(&[line]);
    }

    fn on_typing_changed(&self, typing: bool) {
        if self.is_live() && typing {
            self.notice("Pidima is typing…");
        }
    }
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

fn write_lines(lines: &[String]) {
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        // A closed stdout is not worth failing the conversation over
        let _ = writeln!(stdout, "{}", line);
    }
    let _ = stdout.flush();
}
