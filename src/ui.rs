// Terminal UI utilities

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BOX_WIDTH: usize = 58;

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!("{}", format!("║  {:<58}║", title).bright_blue());
    println!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}

/// Abort box: subject line followed by the detail body, one cause per line
pub fn print_abort(subject: &str, details: &[String]) {
    let title: String = subject.chars().take(BOX_WIDTH).collect();

    eprintln!();
    eprintln!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_red()
    );
    eprintln!("{}", format!("║  {:<58}║", title).bright_red().bold());
    eprintln!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_red()
    );

    for (index, line) in details.iter().enumerate() {
        if index == 0 {
            eprintln!("{}", format!("❌ {}", line).bright_red());
        } else {
            eprintln!("   {} {}", "caused by:".dimmed(), line);
        }
    }
    eprintln!();
}

/// Spinner shown while a pipeline runs
pub fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}
