//! Clipboard input for the `--paste` flag

use anyhow::{Context, Result};
use arboard::Clipboard;

/// Get clipboard content
pub fn get_clipboard_content() -> Result<String> {
    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;

    clipboard.get_text().context("Failed to read clipboard")
}
