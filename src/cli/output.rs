//! Shared CLI output helpers.
//!
//! Everything here goes to stderr: in dump mode stdout carries nothing but
//! shell statements meant for `eval`.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success
//! - Red: errors
//! - Cyan: hints

use console::style;

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err() && console::colors_enabled_stderr()
}

/// Print a success message with checkmark (green).
///
/// Example: `✓ replaced 3 parameters in app.cnf`
pub fn success(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("✓").green(), msg);
    } else {
        eprintln!("✓ {}", msg);
    }
}

/// Print an error message (red).
///
/// Example: `✗ parameters not found: /app/db/password`
pub fn error(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("✗").red(), msg);
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Print a hint message (cyan).
///
/// Example: `→ check the region and credentials`
pub fn hint(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
    } else {
        eprintln!("→ {}", msg);
    }
}
