//! Spinners for the remote phase.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner; hidden when `quiet` so piped output stays clean.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars(TICK_CHARS)
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish with a green check and a final message.
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.set_style(message_style());
    pb.finish_with_message(format!("{} {}", "✓".green(), message));
}

/// Finish with a red cross and a final message.
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.set_style(message_style());
    pb.finish_with_message(format!("{} {}", "✗".red(), message));
}

fn message_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_spinner_is_hidden() {
        let pb = spinner("Fetching", true);
        assert!(pb.is_hidden());
        finish_success(&pb, "done");
        assert!(pb.is_finished());
    }
}
