//! Interactive chat loop against the configured model.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! The same model backends serve here as in Slack, so `clear_history`
//! behaves exactly like the slash command does.

use std::io::Write as _;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use docent_core::config::load_config;
use docent_core::utils::get_history_path;
use docent_models::{build_model, ResponseModel};

/// User ID the terminal session runs under.
const CLI_USER_ID: &str = "command_line_chat";

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "exit()", "quit", "quit()"];

/// Run the interactive chat loop.
pub async fn run(streaming: bool) -> Result<()> {
    let config = load_config(None);
    let model = build_model(&config.model)?;

    crate::helpers::print_banner();
    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline(">>> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            break;
        }

        if trimmed == "clear_history" {
            if model.clear_history(CLI_USER_ID) {
                println!("\nDocent: History cleared.\n");
            } else {
                println!("\nDocent: No history to clear.\n");
            }
            continue;
        }

        let _ = editor.add_history_entry(&input);
        debug!(input = trimmed, "processing input");

        if streaming {
            let mut stream = model.stream_message(trimmed, CLI_USER_ID).await;
            println!();
            while let Some(fragment) = stream.next().await {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            }
            println!("\n");
        } else {
            crate::helpers::print_thinking();
            let reply = model.direct_message(trimmed, CLI_USER_ID).await;
            crate::helpers::clear_thinking();
            crate::helpers::print_response(reply.message.as_deref().unwrap_or(""));
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Create a rustyline editor with history loaded from disk.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    editor.set_max_history_size(1000)?;

    let history_path = history_file();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded chat history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_file();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

fn history_file() -> std::path::PathBuf {
    get_history_path().join("chat_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("quit()"));
        assert!(!is_exit_command("hello"));
        assert!(!is_exit_command(""));
        // clear_history is a command, not an exit.
        assert!(!is_exit_command("clear_history"));
    }

    #[test]
    fn history_file_under_data_dir() {
        let path = history_file();
        assert!(path.to_string_lossy().contains(".docent"));
        assert!(path.to_string_lossy().contains("chat_history"));
    }
}
