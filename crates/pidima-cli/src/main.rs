//! Pidima CLI - chat with the simulated Pidima Assistant in a terminal.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pidima_core::{ChatConfig, Conversation, FileStorage, ReplyTiming, Theme, ThemePreference};

mod render;
mod view;

use view::ChatView;

/// Pidima Assistant - a simulated documentation helper
#[derive(Parser)]
#[command(name = "pidima")]
#[command(about = "Chat with the Pidima Assistant in your terminal")]
#[command(version)]
struct Cli {
    /// Directory holding the chat history and theme preference
    #[arg(short, long, default_value = ".pidima")]
    data_dir: PathBuf,

    /// Fixed part of the simulated reply delay, in milliseconds
    #[arg(long, default_value = "600", value_parser = clap::value_parser!(u64).range(1..))]
    base_delay_ms: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session (default)
    Chat,

    /// Send one message and print the reply
    Send {
        /// Message text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Print the conversation log
    History,

    /// Show or toggle the color theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch between dark and light
    Toggle,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they never interleave with the chat transcript
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let storage = Arc::new(FileStorage::new(&cli.data_dir));
    let config = ChatConfig {
        timing: ReplyTiming::from_base_delay(Duration::from_millis(cli.base_delay_ms)),
        ..ChatConfig::default()
    };

    let theme = ThemePreference::new(storage.clone(), config.theme_key.clone()).load();
    let view = Arc::new(ChatView::new(theme));
    let conversation = Conversation::new(storage.clone(), view.clone(), config)?;

    info!(data_dir = %storage.dir().display(), theme = %theme, "Starting Pidima CLI");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&conversation, &view).await?,
        Commands::Send { text } => send_once(&conversation, &view, &text.join(" ")).await,
        Commands::History => view.print_history(&conversation.load_or_seed()),
        Commands::Theme { action } => match action.unwrap_or(ThemeAction::Show) {
            ThemeAction::Show => println!("{}", conversation.theme()),
            ThemeAction::Toggle => println!("{}", toggle_theme(&conversation, &view)),
        },
    }

    Ok(())
}

/// Read lines from stdin until EOF or `/quit`.
async fn run_chat(conversation: &Conversation, view: &ChatView) -> Result<(), Box<dyn Error>> {
    view.print_history(&conversation.load_or_seed());
    view.notice("Type a message and press Enter. Commands: /theme, /history, /quit");
    view.go_live();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/theme" => {
                let theme = toggle_theme(conversation, view);
                view.notice(&format!("Theme set to {}", theme));
            }
            "/history" => view.print_history(&conversation.messages()),
            text => {
                conversation.send_user_message(text);
            }
        }
    }

    // Let an in-flight reply land before exiting
    conversation.wait_idle().await;
    info!("Chat session ended");
    Ok(())
}

/// Send a single message and wait for the reply to be printed.
async fn send_once(conversation: &Conversation, view: &ChatView, text: &str) {
    conversation.load_or_seed();
    view.go_live();

    if conversation.send_user_message(text).is_none() {
        view.notice("Nothing to send");
        return;
    }
    conversation.wait_idle().await;
}

fn toggle_theme(conversation: &Conversation, view: &ChatView) -> Theme {
    let theme = conversation.toggle_theme();
    view.set_theme(theme);
    theme
}
