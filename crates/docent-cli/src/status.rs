//! `docent status` — show configuration and backend status.
//!
//! - Shows config path and selected backend
//! - Shows credential presence (never values)

use anyhow::Result;
use colored::Colorize;

use docent_core::config::{get_config_path, load_config};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Docent Status".cyan().bold());
    println!();

    // Config
    let config_exists = config_path.exists();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".dimmed().to_string()
        }
    );

    // Model
    println!("  {:<18} {}", "Backend:".bold(), config.model.backend);
    println!(
        "  {:<18} {} ({} mode)",
        "Model:".bold(),
        config.model.name,
        config.model.mode
    );
    println!(
        "  {:<18} {} | max_tokens: {}",
        "Parameters:".bold(),
        format!("temp: {}", config.model.temperature).dimmed(),
        format!("{}", config.model.max_tokens).dimmed(),
    );
    println!("  {:<18} {}", "API key:".bold(), key_status(&config.model.api_key));

    // Slack
    println!();
    println!("  {}", "Slack:".bold());
    println!(
        "    {:<16} {}",
        "Bot token",
        key_status(&config.slack.bot_token)
    );
    println!(
        "    {:<16} {}",
        "App token",
        key_status(&config.slack.app_token)
    );
    println!(
        "    {:<16} {}",
        "Reset command",
        config.slack.reset_command
    );
    println!(
        "    {:<16} {}",
        "Queue capacity",
        config.slack.queue_capacity
    );
    println!();

    Ok(())
}

fn key_status(value: &str) -> String {
    if value.is_empty() {
        format!("{}", "· not configured".dimmed())
    } else {
        format!("{} (set)", "✓".green())
    }
}
