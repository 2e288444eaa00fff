//! Progress indicators with CI fallback

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// A step spinner that degrades to plain lines when not on a terminal
pub struct BuildSpinner {
    spinner: Option<ProgressBar>,
}

impl BuildSpinner {
    /// Start a spinner with a message
    pub fn start(message: &str) -> Self {
        if std::io::stderr().is_terminal() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(message.to_string());
            spinner.enable_steady_tick(Duration::from_millis(80));
            Self {
                spinner: Some(spinner),
            }
        } else {
            println!("  {} {}", style("...").dim(), message);
            Self { spinner: None }
        }
    }

    /// Update the message
    pub fn message(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Stop and clear the spinner
    pub fn finish(self) {
        if let Some(spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}
