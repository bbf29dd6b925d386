use colored::Colorize;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::credits::PromptCredits;
use crate::export::ExportSummary;
use crate::wire::{ChatMessage, Sender};

pub fn print_message(m: &ChatMessage) {
    let who = match m.sender() {
        Sender::User => "you".green().bold(),
        Sender::Ai => "wave".cyan().bold(),
        Sender::System => "system".yellow().bold(),
    };
    println!("{} {}", who, m.timestamp().format("%H:%M").to_string().dimmed());
    println!("{}\n", indent(m.text(), 2));
}

pub fn print_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    println!("{}", "Try these suggestions:".bold());
    for (i, s) in suggestions.iter().enumerate() {
        println!("  {}. {}", i + 1, s);
    }
    println!();
}

pub fn print_key_status(keys: &[(ProviderKind, bool)]) {
    println!("{}", "API keys:".bold());
    for (kind, present) in keys {
        let mark = if *present { "present".green() } else { "missing".red() };
        println!("  {:<11} {}", kind.to_string(), mark);
    }
    if keys.iter().all(|(_, p)| !p) {
        println!("{}", "  No API keys found; every generation will fail.".red().bold());
    }
    println!();
}

pub fn print_credits(credits: &PromptCredits) {
    println!("{} {}\n", "Credits:".bold(), credits.label());
}

/// Spinner shown while a provider call is outstanding.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn print_export_dashboard(sum: &ExportSummary) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━ Export ━━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}",
        "Created".green().bold(), sum.created,
        "Updated".yellow().bold(), sum.updated,
        "Skipped".bold(), sum.skipped,
        "Size".bold(), format_size(sum.bytes_written, DECIMAL)
    );
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
    for d in &sum.details {
        println!("  {}  {}", d.path.display(), format_size(d.bytes_after, DECIMAL).dimmed());
    }
    if let Some(p) = sum.preview_path() {
        println!("\nOpen {} in a browser to preview.", p.display().to_string().bold());
    }
    println!();
}

/// Reads one line; `None` on EOF.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{} ", prompt.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().lock().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}
