//! Shared CLI helpers — response printing and the version banner.

use colored::Colorize;

/// Print a model reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "Docent".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Docent".cyan().bold(), version.dimmed());
    println!(
        "{}",
        "Ask a question; \"clear_history\" resets the conversation, \"exit\" quits.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder while the model call runs.
pub fn print_thinking() {
    eprint!("{}", "thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}
