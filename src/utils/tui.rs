use std::io::{self, Write};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", " "])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Prompt for a line of text, or use `value` if one was passed on the command line.
pub fn prompt_text(label: &str, value: Option<String>) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }

    print!("{label}: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_string())
}

/// Prompt for a password without echoing it.
pub fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: ")).context("Failed to read password")
}
